use anyhow::{Context, anyhow};
use blobdir_core::{
    BlobRef,
    fetch::{BlobWriter, FetchResult, FetchedBlob, Fetcher, StoreError},
    paths::blob_path_for_ref,
};
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs::File;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct LocalStoreConfig {
    pub base_path: String,
}

/// Blobs stored as files under `base_path`, laid out by
/// [`blob_path_for_ref`].
#[derive(Debug, Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        LocalStore {
            base_path: base_path.into(),
        }
    }

    pub fn create(config: LocalStoreConfig) -> Self {
        LocalStore {
            base_path: config.base_path.into(),
        }
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn resolve_path(&self, blob_ref: &BlobRef) -> FetchResult<PathBuf> {
        let relative = blob_path_for_ref(blob_ref)
            .ok_or_else(|| StoreError::InvalidRef(blob_ref.to_string()))?;
        Ok(self.base_path.join(relative))
    }
}

#[async_trait::async_trait]
impl Fetcher for LocalStore {
    /// Opens the blob file for reading.
    async fn fetch(&self, blob_ref: &BlobRef) -> FetchResult<FetchedBlob> {
        let full_path = self.resolve_path(blob_ref)?;
        let file = match File::open(&full_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(blob_ref.clone()).into());
            }
            Err(e) => {
                return Err(anyhow!(e).context(format!("opening {}", full_path.display())));
            }
        };
        let size = file
            .metadata()
            .await
            .with_context(|| format!("reading metadata of {}", full_path.display()))?
            .len();
        tracing::trace!("local: fetch {} ({} bytes)", blob_ref.fmt_short(), size);
        Ok(FetchedBlob::new(file, size))
    }
}

#[async_trait::async_trait]
impl BlobWriter for LocalStore {
    /// Writes the blob to a temporary file and renames it into place.
    async fn put_bytes(&self, bytes: Bytes) -> FetchResult<BlobRef> {
        let blob_ref = BlobRef::for_content(&bytes);
        let full_path = self.resolve_path(&blob_ref)?;
        if tokio::fs::try_exists(&full_path).await? {
            return Ok(blob_ref);
        }
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = full_path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &full_path).await?;
        Ok(blob_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobdir_core::testutil::FetcherTests;

    #[tokio::test]
    async fn test_local_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());
        FetcherTests::new(&store).run_all().await.unwrap();
    }

    #[tokio::test]
    async fn test_blob_lands_at_layout_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());
        let blob_ref = store
            .put_bytes(Bytes::from_static(b"{\"type\":\"static-set\"}"))
            .await
            .unwrap();
        let expected = temp_dir.path().join(blob_path_for_ref(&blob_ref).unwrap());
        assert!(expected.is_file());
    }

    #[tokio::test]
    async fn test_missing_blob_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());
        let missing = BlobRef::for_content(b"absent");
        let err = store.fetch(&missing).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound(_))
        ));
    }
}
