//! Host configuration.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - `reset_phrase` is never empty once validated.

use crate::lifecycle::DeactivationPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Phrase the user must type to confirm a full reset.
pub const DEFAULT_RESET_PHRASE: &str = "Reset PageHost";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Prefix for unit stylesheet URLs; units resolve
    /// `<asset_base>extensions/<unit_id>/<file>.css`.
    pub asset_base: String,
    pub deactivation: DeactivationPolicy,
    pub reset_phrase: String,
    /// Overrides `default_log_level()` when set.
    pub log_level: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            asset_base: String::new(),
            deactivation: DeactivationPolicy::default(),
            reset_phrase: DEFAULT_RESET_PHRASE.to_string(),
            log_level: None,
        }
    }
}

impl HostConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reset_phrase.trim().is_empty() {
            return Err(ConfigError::Invalid("reset_phrase must not be empty"));
        }
        if matches!(&self.log_level, Some(level) if level.trim().is_empty()) {
            return Err(ConfigError::Invalid("log_level must not be blank"));
        }
        Ok(())
    }

    /// Configured log level, or the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or(crate::logging::default_log_level())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read config: {err}"),
            Self::Parse(err) => write!(f, "cannot parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
