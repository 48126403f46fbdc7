//! Catalog configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{DEFAULT_DATABASE_NAME, DEFAULT_DATABASE_OID, DEFAULT_SCAN_BATCH_SIZE, START_OID};

/// Tunables for a [`Catalog`](crate::catalog::Catalog) instance.
///
/// Every field is optional in the JSON form; missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// First identifier issued by the allocator.
    pub start_oid: u32,
    /// Name of the database created during bootstrap.
    pub default_database_name: String,
    /// Rows fetched per batch when a catalog relation is scanned in full.
    pub scan_batch_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            start_oid: START_OID,
            default_database_name: DEFAULT_DATABASE_NAME.to_string(),
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
        }
    }
}

impl CatalogConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: CatalogConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_oid <= DEFAULT_DATABASE_OID.raw() {
            return Err(ConfigError::Invalid {
                field: "start_oid",
                reason: format!(
                    "must be greater than the default database oid {}",
                    DEFAULT_DATABASE_OID
                ),
            });
        }
        if self.default_database_name.is_empty() {
            return Err(ConfigError::Invalid {
                field: "default_database_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.scan_batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "scan_batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
