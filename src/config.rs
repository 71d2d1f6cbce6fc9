//! Engine configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::annotate::Emphasis;
use crate::error::ConfigError;

/// Configuration for the pathfacet engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet window before seen-status writes are flushed.
    pub seen_flush_delay_ms: u64,
    /// Recursion limit when outlining support paths.
    pub max_support_depth: usize,
    /// Keep filtered paths in outlines (flagged) instead of removing them.
    pub show_hidden_paths: bool,
    /// Marker inserted before an emphasized span.
    pub emphasis_open: String,
    /// Marker inserted after an emphasized span.
    pub emphasis_close: String,
    /// Joins the tokens of a synthetic tooltip id.
    pub tooltip_separator: String,
    /// Key prefix for persisted seen-status documents.
    pub storage_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seen_flush_delay_ms: 300,
            max_support_depth: 32,
            show_hidden_paths: false,
            emphasis_open: "<b>".into(),
            emphasis_close: "</b>".into(),
            tooltip_separator: "_".into(),
            storage_key: crate::seen::DEFAULT_STORAGE_KEY.into(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_support_depth == 0 {
            return Err(ConfigError::Invalid {
                message: "max_support_depth must be at least 1".into(),
            });
        }
        if self.storage_key.is_empty() || self.storage_key.contains('/') {
            return Err(ConfigError::Invalid {
                message: "storage_key must be non-empty and must not contain '/'".into(),
            });
        }
        Ok(())
    }

    pub fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.seen_flush_delay_ms)
    }

    pub fn emphasis(&self) -> Emphasis {
        Emphasis {
            open: self.emphasis_open.clone(),
            close: self.emphasis_close.clone(),
        }
    }
}
