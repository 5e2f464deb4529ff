use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use blobdir_core::{BlobRef, Fetcher};
use blobdir_store_local::LocalStore;

use crate::config::BlobdirConfig;

mod import;
mod ls;
mod show;
mod tree;

pub use import::run_import;
pub use ls::run_ls;
pub use show::run_show;
pub use tree::run_tree;

pub async fn run_command(
    config_file: &Path,
    local_data_dir: &Path,
    store_override: Option<&Path>,
    cmd: crate::Commands,
) -> Result<()> {
    if let crate::Commands::Config { cmd } = cmd {
        return cmd.run(config_file, local_data_dir);
    }

    let config = match store_override {
        Some(dir) => BlobdirConfig::for_store_dir(dir),
        None => BlobdirConfig::load(config_file)?,
    };
    let store = config.store.open();

    match cmd {
        crate::Commands::Ls { dir_ref, count } => {
            run_ls(fetcher(store), &parse_ref(&dir_ref)?, count, config.reader).await
        }
        crate::Commands::Tree { dir_ref } => {
            run_tree(fetcher(store), &parse_ref(&dir_ref)?, config.reader).await
        }
        crate::Commands::Show { blob_ref } => {
            run_show(fetcher(store), &parse_ref(&blob_ref)?).await
        }
        crate::Commands::Import { path } => run_import(&store, &path).await,
        crate::Commands::Config { .. } => unreachable!(),
    }
}

fn fetcher(store: LocalStore) -> Arc<dyn Fetcher> {
    Arc::new(store)
}

pub fn parse_ref(s: &str) -> Result<BlobRef> {
    BlobRef::parse(s.trim()).with_context(|| format!("invalid blobref '{s}'"))
}
