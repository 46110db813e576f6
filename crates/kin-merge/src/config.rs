use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the merge engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Maximum nesting of person and family merges within one call. A
    /// top-level merge is depth 1.
    pub max_cascade_depth: usize,
    /// Collapse the family pair a person merge turns into duplicates. When
    /// disabled the duplicates are left in place for the caller to handle.
    pub collapse_duplicate_families: bool,
    /// Run the datastore integrity check after every committed merge and
    /// log each issue found.
    pub check_integrity_after_merge: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_cascade_depth: 8,
            collapse_duplicate_families: true,
            check_integrity_after_merge: false,
        }
    }
}

impl MergeConfig {
    /// A configuration that also audits the datastore after each merge.
    pub fn audited() -> Self {
        Self {
            check_integrity_after_merge: true,
            ..Default::default()
        }
    }

    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.max_cascade_depth == 0 {
            return Err(ConfigError::Parse(
                "max_cascade_depth must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
