//! Preference schema migrations.
//!
//! Version 1 creates `preference_overrides`: one row per persisted override,
//! keyed by the encoded `PersistedKey` and holding the value as JSON text.
//! Defaults never reach this table.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - A database written by a newer binary is refused, never downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "preference_overrides",
    sql: include_str!("0001_preferences.sql"),
}];

/// Latest preference schema version this binary can read.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the preference schema up to `latest_version()` in one transaction.
///
/// Returns how many migrations ran; zero when the schema is current.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let db_version = schema_version(conn)?;
    let latest_supported = latest_version();
    if db_version > latest_supported {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > db_version)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        info!(
            "event=pref_schema_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;
    Ok(pending.len())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn applies_migrations_and_is_repeatable() {
        let mut conn = Connection::open_in_memory().expect("in-memory connection");
        let applied = apply_migrations(&mut conn).expect("first migration pass");
        assert_eq!(applied as u32, latest_version());
        let applied = apply_migrations(&mut conn).expect("second pass is a no-op");
        assert_eq!(applied, 0);

        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .expect("user_version readable");
        assert_eq!(version, latest_version());
    }

    #[test]
    fn creates_override_table_with_json_column() {
        let mut conn = Connection::open_in_memory().expect("in-memory connection");
        apply_migrations(&mut conn).expect("migrate");
        conn.execute(
            "INSERT INTO preference_overrides (pref_key, value_json) VALUES (?1, ?2);",
            ["theme", "\"dark\""],
        )
        .expect("insert override row");
        let stored: String = conn
            .query_row(
                "SELECT value_json FROM preference_overrides WHERE pref_key = 'theme';",
                [],
                |row| row.get(0),
            )
            .expect("read override row");
        assert_eq!(stored, "\"dark\"");
    }

    #[test]
    fn rejects_newer_schema_version() {
        let mut conn = Connection::open_in_memory().expect("in-memory connection");
        conn.execute_batch("PRAGMA user_version = 99;")
            .expect("set user_version");
        let err = apply_migrations(&mut conn).expect_err("newer schema must be rejected");
        assert!(matches!(
            err,
            DbError::UnsupportedSchemaVersion { db_version: 99, .. }
        ));
    }
}
