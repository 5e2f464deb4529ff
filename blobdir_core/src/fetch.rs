use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncSeek};

use crate::BlobRef;

pub type FetchResult<T, E = anyhow::Error> = std::result::Result<T, E>;

/// Errors raised by fetcher implementations.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("blob not found: {0}")]
    NotFound(BlobRef),
    #[error("invalid blobref: {0:?}")]
    InvalidRef(String),
}

/// Seekable byte stream over a fetched blob.
pub trait BlobReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T> BlobReader for T where T: AsyncRead + AsyncSeek + Send + Unpin {}

/// A fetched blob: its contents and total size in bytes.
pub struct FetchedBlob {
    pub reader: Box<dyn BlobReader>,
    pub size: u64,
}

impl FetchedBlob {
    pub fn new(reader: impl BlobReader + 'static, size: u64) -> Self {
        Self {
            reader: Box::new(reader),
            size,
        }
    }

    /// Wraps an in-memory buffer.
    pub fn from_bytes(bytes: Bytes) -> Self {
        let size = bytes.len() as u64;
        Self::new(std::io::Cursor::new(bytes), size)
    }
}

impl std::fmt::Debug for FetchedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedBlob")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Read access to blobs by reference.
///
/// Fetchers are shared by concurrently running tasks and must be safe
/// for concurrent use.
#[async_trait]
pub trait Fetcher: std::fmt::Debug + Send + Sync + 'static {
    async fn fetch(&self, blob_ref: &BlobRef) -> FetchResult<FetchedBlob>;
}

/// Write access used to author blob graphs.
#[async_trait]
pub trait BlobWriter: Send + Sync {
    /// Stores `bytes` and returns their content reference.
    async fn put_bytes(&self, bytes: Bytes) -> FetchResult<BlobRef>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    async fn fetch(&self, blob_ref: &BlobRef) -> FetchResult<FetchedBlob> {
        (**self).fetch(blob_ref).await
    }
}
