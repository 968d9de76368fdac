use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Offset of the civil time stored Date values are recorded in (UTC+9).
pub const DEFAULT_LOCAL_OFFSET_SECONDS: i64 = 32_400;
pub const DEFAULT_MAX_DEPTH: usize = 64;
/// Largest accepted `max_depth`; a leaf and its comparison array add two
/// more levels under the 128-level input nesting limit.
pub const MAX_DEPTH_LIMIT: usize = 126;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Seconds added to stored Date field values to bring them onto the
    /// UTC epoch basis comparison dates are parsed in.
    pub local_offset_seconds: i64,
    /// Maximum group nesting accepted by the evaluator.
    pub max_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            local_offset_seconds: DEFAULT_LOCAL_OFFSET_SECONDS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EvaluatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_DEPTH_LIMIT).contains(&self.max_depth) {
            return Err(ConfigError::Invalid {
                key: "max_depth",
                reason: format!("must be between 1 and {MAX_DEPTH_LIMIT}"),
            });
        }
        // Civil offsets stay within +-24h
        if self.local_offset_seconds.abs() >= 86_400 {
            return Err(ConfigError::Invalid {
                key: "local_offset_seconds",
                reason: format!("{} is not a valid UTC offset", self.local_offset_seconds),
            });
        }
        Ok(())
    }
}

pub fn load_config(path: Option<&Path>) -> Result<EvaluatorConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<EvaluatorConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    let config = toml::from_str::<EvaluatorConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })?;
    config.validate()?;
    Ok(config)
}

pub fn default_config() -> &'static EvaluatorConfig {
    static DEFAULT_CONFIG: LazyLock<EvaluatorConfig> = LazyLock::new(EvaluatorConfig::default);
    &DEFAULT_CONFIG
}
