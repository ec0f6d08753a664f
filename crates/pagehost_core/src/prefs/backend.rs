//! Persistent storage contract behind the preference store.

use super::PreferenceMap;
use crate::db::DbError;
use serde_json::Value;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type BackendResult<T> = Result<T, BackendError>;

/// Storage transport errors.
#[derive(Debug)]
pub enum BackendError {
    Db(DbError),
    /// Persisted value could not be encoded or decoded as JSON.
    Encoding {
        key: String,
        source: serde_json::Error,
    },
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encoding { key, source } => {
                write!(f, "invalid persisted preference value for `{key}`: {source}")
            }
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encoding { source, .. } => Some(source),
        }
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Full-snapshot key/value persistence used by `PreferenceStore`.
///
/// Keys are already namespaced (see `PersistedKey`); implementations store
/// them opaquely.
pub trait PreferenceBackend {
    /// Reads every persisted override.
    fn snapshot(&self) -> BackendResult<PreferenceMap>;
    fn set(&self, key: &str, value: &Value) -> BackendResult<()>;
    /// Deletes one key. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> BackendResult<()>;
    /// Wipes every persisted value owned by the host.
    fn reset(&self) -> BackendResult<()>;
}

/// Process-local backend; clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Rc<RefCell<PreferenceMap>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with raw persisted entries.
    pub fn with_entries(entries: PreferenceMap) -> Self {
        Self {
            entries: Rc::new(RefCell::new(entries)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn snapshot(&self) -> BackendResult<PreferenceMap> {
        Ok(self.entries.borrow().clone())
    }

    fn set(&self, key: &str, value: &Value) -> BackendResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> BackendResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn reset(&self) -> BackendResult<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}
