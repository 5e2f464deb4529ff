use std::sync::Arc;

use anyhow::{Context, Result};
use blobdir_core::{BlobRef, Fetcher};

pub async fn run_show(fetcher: Arc<dyn Fetcher>, blob_ref: &BlobRef) -> Result<()> {
    let blob = blobdir_schema::resolve(fetcher.as_ref(), blob_ref).await?;
    let json = serde_json::to_string_pretty(&blob).context("failed to encode schema blob")?;
    println!("{json}");
    Ok(())
}
