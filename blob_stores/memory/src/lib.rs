use blobdir_core::{
    BlobRef,
    fetch::{BlobWriter, FetchResult, FetchedBlob, Fetcher, StoreError},
};
use bytes::Bytes;
use dashmap::DashMap;

/// Blobs held in a concurrent map keyed by reference.
#[derive(Debug)]
pub struct MemoryStore {
    blobs: DashMap<BlobRef, Bytes>,
}

impl MemoryStore {
    /// Creates a new, empty `MemoryStore`.
    pub fn new() -> Self {
        Self {
            blobs: DashMap::new(),
        }
    }

    /// Stores `bytes` under their content reference.
    pub fn put(&self, bytes: impl Into<Bytes>) -> BlobRef {
        let bytes = bytes.into();
        let blob_ref = BlobRef::for_content(&bytes);
        self.blobs.insert(blob_ref.clone(), bytes);
        blob_ref
    }

    /// Stores `bytes` under an arbitrary reference, bypassing content
    /// addressing. Lets tests plant blobs under fixed refs.
    pub fn put_at(&self, blob_ref: BlobRef, bytes: impl Into<Bytes>) {
        self.blobs.insert(blob_ref, bytes.into());
    }

    pub fn contains(&self, blob_ref: &BlobRef) -> bool {
        self.blobs.contains_key(blob_ref)
    }

    pub fn remove(&self, blob_ref: &BlobRef) -> Option<Bytes> {
        self.blobs.remove(blob_ref).map(|(_, bytes)| bytes)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Fetcher for MemoryStore {
    /// Returns a cursor over the stored bytes.
    async fn fetch(&self, blob_ref: &BlobRef) -> FetchResult<FetchedBlob> {
        if !blob_ref.is_valid() {
            return Err(StoreError::InvalidRef(blob_ref.to_string()).into());
        }
        let bytes = self
            .blobs
            .get(blob_ref)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(blob_ref.clone()))?;
        tracing::trace!("memory: fetch {} ({} bytes)", blob_ref.fmt_short(), bytes.len());
        Ok(FetchedBlob::from_bytes(bytes))
    }
}

#[async_trait::async_trait]
impl BlobWriter for MemoryStore {
    async fn put_bytes(&self, bytes: Bytes) -> FetchResult<BlobRef> {
        Ok(self.put(bytes))
    }
}
