use serde::{Deserialize, Serialize};

/// Default bound on in-flight entry resolutions per `readdir` call.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 32;

/// Tuning for [`DirReader`](crate::DirReader).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReaderConfig {
    /// Maximum number of member entries resolved at once. `0` lifts the
    /// bound and starts every member of the page immediately.
    pub max_concurrent_fetches: usize,
}

impl ReaderConfig {
    pub fn unbounded() -> Self {
        Self {
            max_concurrent_fetches: 0,
        }
    }

    pub fn with_max_concurrent_fetches(max_concurrent_fetches: usize) -> Self {
        Self {
            max_concurrent_fetches,
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: ReaderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ReaderConfig::default());
        assert_eq!(config.max_concurrent_fetches, DEFAULT_MAX_CONCURRENT_FETCHES);
    }

    #[test]
    fn zero_means_unbounded() {
        let config: ReaderConfig =
            serde_json::from_str(r#"{"max_concurrent_fetches":0}"#).unwrap();
        assert_eq!(config, ReaderConfig::unbounded());
    }
}
