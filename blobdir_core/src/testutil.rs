//! Test utilities for `Fetcher` implementations.
//!
//! This module provides a test suite that can be run against any store
//! implementing both [`Fetcher`] and [`BlobWriter`].
//!
//! # Usage
//!
//! In your store crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! blobdir_core = { workspace = true, features = ["testutil"] }
//! ```
//!
//! In your test file:
//!
//! ```ignore
//! use blobdir_core::testutil::FetcherTests;
//!
//! #[tokio::test]
//! async fn test_my_store() {
//!     let store = MyStore::new(...);
//!     FetcherTests::new(&store).run_all().await.unwrap();
//! }
//! ```

use crate::{
    BlobRef,
    fetch::{BlobWriter, FetchResult, Fetcher},
};
use bytes::Bytes;
use futures::future::join_all;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Test suite for `Fetcher` implementations.
pub struct FetcherTests<'a, S> {
    store: &'a S,
}

impl<'a, S: Fetcher + BlobWriter> FetcherTests<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Run all tests.
    pub async fn run_all(&self) -> FetchResult<()> {
        self.test_put_fetch().await?;
        self.test_size().await?;
        self.test_missing().await?;
        self.test_seek().await?;
        self.test_concurrent_fetch().await?;
        Ok(())
    }

    async fn read_all(&self, blob_ref: &BlobRef) -> FetchResult<Vec<u8>> {
        let mut fetched = self.store.fetch(blob_ref).await?;
        let mut buf = Vec::new();
        fetched.reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Stored bytes come back unchanged under the returned reference.
    pub async fn test_put_fetch(&self) -> FetchResult<()> {
        let data = random_bytes(1024);
        let blob_ref = self.store.put_bytes(data.clone()).await?;
        assert_eq!(blob_ref, BlobRef::for_content(&data), "put should return content ref");

        let retrieved = self.read_all(&blob_ref).await?;
        assert_eq!(retrieved, data.as_ref(), "fetched data should match original");
        Ok(())
    }

    /// The reported size matches the stored length.
    pub async fn test_size(&self) -> FetchResult<()> {
        let data = Bytes::from(vec![42u8; 12345]);
        let blob_ref = self.store.put_bytes(data).await?;
        let fetched = self.store.fetch(&blob_ref).await?;
        assert_eq!(fetched.size, 12345, "size should match data length");
        Ok(())
    }

    /// Unknown references fail instead of yielding empty blobs.
    pub async fn test_missing(&self) -> FetchResult<()> {
        let missing = BlobRef::for_content(random_bytes(64));
        assert!(
            self.store.fetch(&missing).await.is_err(),
            "fetching an unknown blob should fail"
        );
        Ok(())
    }

    /// Readers support random access.
    pub async fn test_seek(&self) -> FetchResult<()> {
        let blob_ref = self
            .store
            .put_bytes(Bytes::from_static(b"0123456789abcdef"))
            .await?;
        let mut fetched = self.store.fetch(&blob_ref).await?;
        fetched.reader.seek(std::io::SeekFrom::Start(10)).await?;
        let mut rest = Vec::new();
        fetched.reader.read_to_end(&mut rest).await?;
        assert_eq!(rest, b"abcdef", "read after seek should start at offset");
        Ok(())
    }

    /// Many simultaneous fetches of one blob all succeed.
    pub async fn test_concurrent_fetch(&self) -> FetchResult<()> {
        let data = random_bytes(4096);
        let blob_ref = self.store.put_bytes(data.clone()).await?;
        let reads = (0..16).map(|_| self.read_all(&blob_ref));
        for result in join_all(reads).await {
            assert_eq!(result?, data.as_ref(), "concurrent fetch should match");
        }
        Ok(())
    }
}

/// Generate random bytes for testing.
pub fn random_bytes(len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    rand::rng().fill(&mut data[..]);
    Bytes::from(data)
}
