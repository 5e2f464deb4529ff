use std::sync::Arc;

use anyhow::Result;
use blobdir_core::{BlobRef, Fetcher};
use blobdir_schema::ReaderConfig;

pub async fn run_tree(
    fetcher: Arc<dyn Fetcher>,
    dir_ref: &BlobRef,
    reader_config: ReaderConfig,
) -> Result<()> {
    blobdir_schema::debug::print_tree(fetcher, dir_ref, reader_config).await?;
    Ok(())
}
