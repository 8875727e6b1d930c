//! Engine configuration
//!
//! Loaded from YAML, for example:
//!
//! ```yaml
//! verbosity: debug
//! log_registry_order: true
//! memoize: true
//! ```
use crate::error::{QuillError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding [`EngineConfig::verbosity`]
pub const VERBOSITY_ENV: &str = "QUILL_VERBOSITY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
    Debug,
}

impl FromStr for Verbosity {
    type Err = QuillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "low" => Ok(Verbosity::Low),
            "normal" => Ok(Verbosity::Normal),
            "high" => Ok(Verbosity::High),
            "very_high" | "veryhigh" => Ok(Verbosity::VeryHigh),
            "debug" => Ok(Verbosity::Debug),
            other => Err(QuillError::config(format!("unknown verbosity '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub verbosity: Verbosity,

    /// Log the sorted type order when the registry is sealed.
    #[serde(default)]
    pub log_registry_order: bool,

    /// Give every new context a memo cache.
    #[serde(default)]
    pub memoize: bool,

    /// Reject patterns whose placeholders name unknown types at seal.
    #[serde(default = "default_true")]
    pub validate_patterns: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            log_registry_order: false,
            memoize: false,
            validate_patterns: true,
        }
    }
}

impl EngineConfig {
    /// Load a config from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuillError::config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
            .map_err(|e| QuillError::config(format!("failed to parse config YAML: {}", e)))
    }

    /// Apply `QUILL_VERBOSITY` if it is set.
    pub fn with_env_overrides(self) -> Result<Self> {
        match std::env::var(VERBOSITY_ENV) {
            Ok(raw) => self.with_verbosity_str(&raw),
            Err(_) => Ok(self),
        }
    }

    fn with_verbosity_str(mut self, raw: &str) -> Result<Self> {
        self.verbosity = raw.parse()?;
        Ok(self)
    }

    pub fn is_debug(&self) -> bool {
        self.verbosity >= Verbosity::Debug
    }

    pub fn logs(&self, min: Verbosity) -> bool {
        self.verbosity >= min
    }
}
