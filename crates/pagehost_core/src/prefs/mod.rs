//! Layered preference resolution for the host and its units.
//!
//! # Responsibility
//! - Resolve global and unit-scoped keys over defaults and persisted overrides.
//! - Keep the persisted override set minimal (no value equal to its default).
//!
//! # Invariants
//! - A key present in the override layer always differs from its default.
//! - Lookup, write, and removal misses are logged and never panic.

pub mod backend;
pub mod key;
pub mod sqlite;
pub mod store;

use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use backend::{BackendError, BackendResult, MemoryBackend, PreferenceBackend};
pub use key::PersistedKey;
pub use sqlite::SqliteBackend;
pub use store::{PreferenceLayer, PreferenceStore, DISABLED_EXTENSIONS_KEY};

/// Flat key/value mapping used for defaults, overrides, and backend snapshots.
pub type PreferenceMap = BTreeMap<String, Value>;

pub type PrefResult<T> = Result<T, PreferenceError>;

/// Preference resolution and persistence errors.
#[derive(Debug)]
pub enum PreferenceError {
    /// Key is absent from both the override and the default layer.
    NotFound {
        key: String,
        unit_id: Option<String>,
    },
    /// Removal requested for a key that has no override.
    AlreadyDefault {
        key: String,
        unit_id: Option<String>,
    },
    Backend(BackendError),
}

impl PreferenceError {
    pub(crate) fn not_found(key: &str, unit_id: Option<&str>) -> Self {
        Self::NotFound {
            key: key.to_string(),
            unit_id: unit_id.map(str::to_string),
        }
    }

    pub(crate) fn already_default(key: &str, unit_id: Option<&str>) -> Self {
        Self::AlreadyDefault {
            key: key.to_string(),
            unit_id: unit_id.map(str::to_string),
        }
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "pref_not_found",
            Self::AlreadyDefault { .. } => "pref_already_default",
            Self::Backend(_) => "pref_backend_failed",
        }
    }
}

fn qualified(key: &str, unit_id: &Option<String>) -> String {
    match unit_id {
        Some(unit_id) => format!("{unit_id}.{key}"),
        None => key.to_string(),
    }
}

impl Display for PreferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { key, unit_id } => {
                write!(f, "preference with key not found: {}", qualified(key, unit_id))
            }
            Self::AlreadyDefault { key, unit_id } => write!(
                f,
                "preference with key is already at default value: {}",
                qualified(key, unit_id)
            ),
            Self::Backend(err) => write!(f, "preference backend failed: {err}"),
        }
    }
}

impl Error for PreferenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::NotFound { .. } | Self::AlreadyDefault { .. } => None,
        }
    }
}

impl From<BackendError> for PreferenceError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}
