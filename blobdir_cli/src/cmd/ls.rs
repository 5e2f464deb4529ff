use std::sync::Arc;

use anyhow::{Context, Result};
use blobdir_core::{BlobRef, Fetcher};
use blobdir_schema::{DirReader, DirectoryEntry, ReaderConfig};

/// Lists a directory, `page_size` entries per batch (`0` = one batch).
pub async fn run_ls(
    fetcher: Arc<dyn Fetcher>,
    dir_ref: &BlobRef,
    page_size: usize,
    reader_config: ReaderConfig,
) -> Result<()> {
    let mut reader = DirReader::new(fetcher, dir_ref)
        .await
        .with_context(|| format!("failed to open directory {dir_ref}"))?
        .with_config(reader_config);

    let n = isize::try_from(page_size).unwrap_or(isize::MAX);
    let mut pages = 0usize;
    loop {
        let page = reader
            .readdir(n)
            .await
            .with_context(|| format!("failed to list {dir_ref} at entry {}", reader.cursor()))?;
        pages += 1;
        for entry in &page.entries {
            println!("{}", format_entry(entry));
        }
        if page.is_end() {
            break;
        }
    }
    tracing::debug!("listed {dir_ref} in {pages} page(s)");
    Ok(())
}

pub fn format_entry(entry: &DirectoryEntry) -> String {
    let detail = match entry {
        DirectoryEntry::File(file) => file.size.to_string(),
        DirectoryEntry::Symlink(link) => format!("-> {}", link.target),
        DirectoryEntry::Other(other) => other.blob_type.clone(),
        DirectoryEntry::Directory(_) => "-".to_string(),
    };
    format!(
        "{}\t{}\t{}\t{}",
        entry.kind().as_str(),
        entry.name(),
        detail,
        entry.blob_ref()
    )
}
