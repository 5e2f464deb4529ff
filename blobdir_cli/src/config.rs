use std::path::Path;

use anyhow::Context;
use blobdir_schema::ReaderConfig;
use blobdir_store_local::{LocalStore, LocalStoreConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobdirConfig {
    #[serde(default)]
    pub reader: ReaderConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum StoreConfig {
    Local(LocalStoreConfig),
}

impl StoreConfig {
    pub fn open(&self) -> LocalStore {
        match self {
            StoreConfig::Local(config) => LocalStore::create(config.clone()),
        }
    }
}

impl BlobdirConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let toml_content = std::fs::read_to_string(path).with_context(|| {
            format!(
                "could not read config file {} (run `blobdir config init` or pass --store)",
                path.display()
            )
        })?;
        toml::from_str(&toml_content)
            .with_context(|| format!("could not parse config file {}", path.display()))
    }

    /// Config for a bare store directory given on the command line.
    pub fn for_store_dir(base_path: &Path) -> Self {
        Self {
            reader: ReaderConfig::default(),
            store: StoreConfig::Local(LocalStoreConfig {
                base_path: base_path.to_string_lossy().into_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: BlobdirConfig = toml::from_str(
            r#"
[reader]
max_concurrent_fetches = 4

[store]
type = "local"
base_path = "/srv/blobs"
"#,
        )
        .unwrap();
        assert_eq!(config.reader.max_concurrent_fetches, 4);
        assert_eq!(
            config.store,
            StoreConfig::Local(LocalStoreConfig {
                base_path: "/srv/blobs".into()
            })
        );
    }

    #[test]
    fn reader_section_is_optional() {
        let config: BlobdirConfig = toml::from_str(
            r#"
[store]
type = "local"
base_path = "blobs"
"#,
        )
        .unwrap();
        assert_eq!(config.reader, ReaderConfig::default());
    }

    #[test]
    fn unknown_store_type_is_rejected() {
        let result = toml::from_str::<BlobdirConfig>(
            r#"
[store]
type = "s3"
bucket = "x"
"#,
        );
        assert!(result.is_err());
    }
}
