use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use blobdir_schema::DEFAULT_MAX_CONCURRENT_FETCHES;
use clap::Subcommand;
use toml_edit::{DocumentMut, Item, Table, value};
use tracing::info;

#[derive(Subcommand)]
pub enum CmdConfig {
    /// Creates the config file if it doesn't exist, filling in missing defaults
    Init,
}

impl CmdConfig {
    pub fn run(self, config_file: &Path, local_data_dir: &Path) -> anyhow::Result<()> {
        let mut doc = if config_file.exists() {
            fs::read_to_string(config_file)?
        } else {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent)?;
            }
            String::new()
        }
        .parse::<DocumentMut>()
        .context("could not parse config file")?;

        match self {
            Self::Init => init_defaults(&mut doc, local_data_dir)?,
        }

        info!("writing to config file {config_file:?}");

        let tmp_path: PathBuf = config_file.with_extension("tmp");
        let mut tmp = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(doc.to_string().as_bytes())?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, config_file)?;
        Ok(())
    }
}

/// Adds the `[reader]` and `[store]` tables, keeping values already set.
fn init_defaults(doc: &mut DocumentMut, local_data_dir: &Path) -> anyhow::Result<()> {
    let reader = doc
        .entry("reader")
        .or_insert(Item::Table(Table::new()))
        .as_table_mut()
        .context("config key \"reader\" is not a table")?;
    reader
        .entry("max_concurrent_fetches")
        .or_insert(value(DEFAULT_MAX_CONCURRENT_FETCHES as i64));

    let store = doc
        .entry("store")
        .or_insert(Item::Table(Table::new()))
        .as_table_mut()
        .context("config key \"store\" is not a table")?;
    store.entry("type").or_insert(value("local"));
    if !store.contains_key("base_path") {
        let blob_dir = local_data_dir.join("blobs");
        let blob_dir = blob_dir
            .to_str()
            .context("data directory path is not valid UTF-8")?;
        store.insert("base_path", value(blob_dir));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlobdirConfig, StoreConfig};

    #[test]
    fn init_writes_loadable_config() {
        let tmp = tempfile::tempdir().unwrap();
        let config_file = tmp.path().join("conf").join("config.toml");
        CmdConfig::Init.run(&config_file, tmp.path()).unwrap();

        let config = BlobdirConfig::load(&config_file).unwrap();
        assert_eq!(
            config.reader.max_concurrent_fetches,
            DEFAULT_MAX_CONCURRENT_FETCHES
        );
        let StoreConfig::Local(local) = config.store;
        assert_eq!(
            local.base_path,
            tmp.path().join("blobs").to_string_lossy()
        );
    }

    #[test]
    fn init_keeps_existing_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_file = tmp.path().join("config.toml");
        fs::write(
            &config_file,
            "[reader]\nmax_concurrent_fetches = 3\n\n[store]\ntype = \"local\"\nbase_path = \"/mnt/blobs\"\n",
        )
        .unwrap();
        CmdConfig::Init.run(&config_file, tmp.path()).unwrap();

        let config = BlobdirConfig::load(&config_file).unwrap();
        assert_eq!(config.reader.max_concurrent_fetches, 3);
        let StoreConfig::Local(local) = config.store;
        assert_eq!(local.base_path, "/mnt/blobs");
    }
}
