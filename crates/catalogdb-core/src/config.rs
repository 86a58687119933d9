//! Module: config
//! Responsibility: store-wide tunables loaded from TOML.
//! Does not own: per-query overrides (callers pass explicit page sizes).

use crate::{DEFAULT_PAGE_SIZE, MAX_BATCH_SIZE, SEARCH_DEBOUNCE_MS, error::ConfigError};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

///
/// CatalogConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Page size used when a caller does not pass one.
    pub page_size: usize,

    /// Quiet period before a changed search term re-issues a first page.
    pub search_debounce_ms: u64,

    /// Largest batch a single `commit_batch` call accepts.
    pub max_batch_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: SEARCH_DEBOUNCE_MS,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

impl CatalogConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be at least 1",
            });
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "max_batch_size",
                reason: "must be at least 1",
            });
        }

        Ok(())
    }

    #[must_use]
    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_defaults() {
        let config = CatalogConfig::from_toml_str("").expect("empty config should parse");

        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.page_size, 20);
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.max_batch_size, 500);
    }

    #[test]
    fn partial_document_overrides_only_present_keys() {
        let config = CatalogConfig::from_toml_str("page_size = 50\n")
            .expect("partial config should parse");

        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_batch_size, MAX_BATCH_SIZE);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = CatalogConfig::from_toml_str("page_size = 0\n")
            .expect_err("zero page size must be rejected");

        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "page_size",
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CatalogConfig::from_toml_str("pagesize = 10\n")
            .expect_err("unknown key must be rejected");

        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
