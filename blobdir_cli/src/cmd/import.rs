use std::{future::Future, path::Path, pin::Pin};

use anyhow::{Context, Result};
use blobdir_core::{BlobRef, BlobWriter};
use blobdir_schema::{BlobPart, SchemaBlob};
use blobdir_store_local::LocalStore;
use tracing::{debug, info, warn};

/// Imports the tree at `path` and prints the root directory's reference.
pub async fn run_import(store: &LocalStore, path: &Path) -> Result<()> {
    let root = import_dir(store, path).await?;
    info!("imported {} into {}", path.display(), store.base_path().display());
    println!("{root}");
    Ok(())
}

async fn put_schema(store: &LocalStore, blob: SchemaBlob) -> Result<BlobRef> {
    let bytes = blob.to_json_bytes()?;
    store.put_bytes(bytes).await
}

/// Stores one directory (members sorted by name) and returns the
/// reference of its directory blob.
fn import_dir<'a>(
    store: &'a LocalStore,
    path: &'a Path,
) -> Pin<Box<dyn Future<Output = Result<BlobRef>> + Send + 'a>> {
    Box::pin(async move {
        let mut read_dir = tokio::fs::read_dir(path)
            .await
            .with_context(|| format!("failed to read directory {}", path.display()))?;
        let mut children = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            children.push(entry);
        }
        children.sort_by_key(|entry| entry.file_name());

        let mut members = Vec::with_capacity(children.len());
        for entry in children {
            let child_path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let metadata = tokio::fs::symlink_metadata(&child_path).await?;
            let file_type = metadata.file_type();

            let member = if file_type.is_dir() {
                import_dir(store, &child_path).await?
            } else if file_type.is_symlink() {
                let target = tokio::fs::read_link(&child_path).await?;
                put_schema(
                    store,
                    SchemaBlob::symlink(name, target.to_string_lossy().into_owned()),
                )
                .await?
            } else if file_type.is_file() {
                let content = tokio::fs::read(&child_path)
                    .await
                    .with_context(|| format!("failed to read {}", child_path.display()))?;
                let size = content.len() as u64;
                let parts = if size == 0 {
                    Vec::new()
                } else {
                    vec![BlobPart::new(store.put_bytes(content.into()).await?, size)]
                };
                let mut blob = SchemaBlob::file(name, parts);
                if let Some(mode) = mode_of(&metadata) {
                    blob = blob.with_permission(mode);
                }
                put_schema(store, blob).await?
            } else {
                warn!("skipping special file {}", child_path.display());
                continue;
            };
            members.push(member);
        }

        let member_count = members.len();
        let set_ref = put_schema(store, SchemaBlob::static_set(members)).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());
        let mut dir = SchemaBlob::directory(name, set_ref);
        if let Some(mode) = mode_of(&tokio::fs::metadata(path).await?) {
            dir = dir.with_permission(mode);
        }
        let dir_ref = put_schema(store, dir).await?;
        debug!("import: {} -> {} ({member_count} members)", path.display(), dir_ref.fmt_short());
        Ok(dir_ref)
    })
}

#[cfg(unix)]
fn mode_of(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_of(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}
