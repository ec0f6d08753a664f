//! SQLite-backed preference persistence.
//!
//! # Invariants
//! - Values are stored as JSON text and decoded strictly on read.
//! - Corrupt rows fail the snapshot instead of being silently dropped.

use super::backend::{BackendError, BackendResult, PreferenceBackend};
use super::PreferenceMap;
use crate::db::{open_db, open_db_in_memory};
use log::info;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;

/// Preference backend storing overrides in the `preference_overrides` table.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Opens (and migrates) a preference database file.
    pub fn open(path: impl AsRef<Path>) -> BackendResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> BackendResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps a connection that has already been migrated.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl PreferenceBackend for SqliteBackend {
    fn snapshot(&self) -> BackendResult<PreferenceMap> {
        let mut stmt = self
            .conn
            .prepare("SELECT pref_key, value_json FROM preference_overrides ORDER BY pref_key;")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = PreferenceMap::new();
        for row in rows {
            let (key, raw) = row?;
            let value = serde_json::from_str::<Value>(&raw)
                .map_err(|source| BackendError::Encoding {
                    key: key.clone(),
                    source,
                })?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    fn set(&self, key: &str, value: &Value) -> BackendResult<()> {
        let encoded = serde_json::to_string(value).map_err(|source| BackendError::Encoding {
            key: key.to_string(),
            source,
        })?;
        self.conn.execute(
            "INSERT INTO preference_overrides (pref_key, value_json)
             VALUES (?1, ?2)
             ON CONFLICT(pref_key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = CAST(strftime('%s', 'now') AS INTEGER);",
            params![key, encoded],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> BackendResult<()> {
        self.conn.execute(
            "DELETE FROM preference_overrides WHERE pref_key = ?1;",
            params![key],
        )?;
        Ok(())
    }

    fn reset(&self) -> BackendResult<()> {
        let removed = self.conn.execute("DELETE FROM preference_overrides;", [])?;
        info!("event=prefs_reset module=prefs status=ok backend=sqlite removed={removed}");
        Ok(())
    }
}
