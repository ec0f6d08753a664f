use pagehost_core::db::migrations::latest_version;
use pagehost_core::{
    BackendError, PreferenceBackend, PreferenceMap, PreferenceStore, SqliteBackend,
};
use serde_json::json;

#[test]
fn sqlite_backend_roundtrips_json_values() {
    let backend = SqliteBackend::open_in_memory().expect("open in-memory backend");
    backend
        .set("disabledExtensions", &json!(["chat", "forum"]))
        .expect("set array");
    backend
        .set("unit:forum:layout", &json!({"columns": 2, "dense": true}))
        .expect("set object");
    backend.set("unit:forum:layout", &json!({"columns": 3})).expect("upsert");

    let snapshot = backend.snapshot().expect("snapshot");
    let mut expected = PreferenceMap::new();
    expected.insert("disabledExtensions".to_string(), json!(["chat", "forum"]));
    expected.insert("unit:forum:layout".to_string(), json!({"columns": 3}));
    assert_eq!(snapshot, expected);

    backend.remove("disabledExtensions").expect("remove");
    backend.remove("never-written").expect("remove of absent key");
    assert_eq!(backend.snapshot().expect("snapshot").len(), 1);
}

#[test]
fn overrides_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("prefs.sqlite3");

    {
        let backend = SqliteBackend::open(&path).expect("open file backend");
        let mut store = PreferenceStore::new(backend);
        store.set_global_default("theme", json!("classic"));
        store.set("theme", json!("dark"), None).expect("persist override");
        store
            .set("theme", json!("classic"), None)
            .expect("collapse to default");
        store.set("fontSize", json!(14), None).expect("persist second");
    }

    let backend = SqliteBackend::open(&path).expect("reopen file backend");
    let version: u32 = backend
        .connection()
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .expect("user_version");
    assert_eq!(version, latest_version());

    let mut store = PreferenceStore::new(backend);
    store.set_global_default("theme", json!("classic"));
    assert_eq!(store.load().expect("load"), 1);
    assert_eq!(store.get("fontSize", None), Some(json!(14)));
    assert_eq!(store.get("theme", None), Some(json!("classic")));
}

#[test]
fn corrupt_rows_fail_the_snapshot() {
    let backend = SqliteBackend::open_in_memory().expect("open in-memory backend");
    backend
        .connection()
        .execute(
            "INSERT INTO preference_overrides (pref_key, value_json) VALUES ('broken', '{not json');",
            [],
        )
        .expect("insert corrupt row");

    let err = backend.snapshot().expect_err("corrupt row must not be masked");
    assert!(matches!(err, BackendError::Encoding { ref key, .. } if key == "broken"));
}

#[test]
fn reset_wipes_every_row() {
    let backend = SqliteBackend::open_in_memory().expect("open in-memory backend");
    backend.set("a", &json!(1)).expect("set a");
    backend.set("unit:x:b", &json!(2)).expect("set b");
    backend.reset().expect("reset");
    assert!(backend.snapshot().expect("snapshot").is_empty());
}
