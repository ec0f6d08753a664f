use pagehost_core::{
    MemoryBackend, PreferenceBackend, PreferenceError, PreferenceMap, PreferenceStore,
    DISABLED_EXTENSIONS_KEY,
};
use serde_json::{json, Value};

fn store_with_defaults() -> (PreferenceStore, MemoryBackend) {
    let backend = MemoryBackend::new();
    let mut store = PreferenceStore::new(backend.clone());
    store.set_global_default("theme", json!("classic"));
    store.set_global_default("fontSize", json!(12));

    let mut forum_defaults = PreferenceMap::new();
    forum_defaults.insert("signatures".to_string(), json!(true));
    forum_defaults.insert("hidden".to_string(), json!([]));
    store.set_unit_defaults("forum", forum_defaults);
    (store, backend)
}

#[test]
fn override_wins_over_default_until_reset_to_default() {
    let (mut store, backend) = store_with_defaults();

    for (key, value) in [("theme", json!("dark")), ("fontSize", json!(16))] {
        store.set(key, value.clone(), None).expect("override write");
        assert_eq!(store.get(key, None), Some(value.clone()));
        assert_eq!(backend.get(key), Some(value));
    }

    store
        .set("theme", json!("classic"), None)
        .expect("write default value");
    assert_eq!(store.get("theme", None), Some(json!("classic")));
    assert!(!backend.contains_key("theme"));
    assert!(!store.overrides().contains("theme", None));
    assert!(backend.contains_key("fontSize"));
}

#[test]
fn unit_scoped_values_resolve_in_their_namespace() {
    let (mut store, backend) = store_with_defaults();

    assert_eq!(store.get("signatures", Some("forum")), Some(json!(true)));
    store
        .set("hidden", json!(["spam"]), Some("forum"))
        .expect("unit override write");
    assert_eq!(store.get("hidden", Some("forum")), Some(json!(["spam"])));
    assert_eq!(backend.get("unit:forum:hidden"), Some(json!(["spam"])));

    store
        .set("hidden", json!([]), Some("forum"))
        .expect("unit default write");
    assert!(!backend.contains_key("unit:forum:hidden"));
    assert_eq!(store.get("hidden", Some("forum")), Some(json!([])));
}

#[test]
fn same_named_global_and_unit_keys_do_not_collide() {
    let (mut store, backend) = store_with_defaults();
    store.set_unit_defaults("chat", {
        let mut defaults = PreferenceMap::new();
        defaults.insert("theme".to_string(), json!("bubbles"));
        defaults
    });

    store.set("theme", json!("dark"), None).expect("global write");
    store
        .set("theme", json!("compact"), Some("chat"))
        .expect("unit write");

    assert_eq!(store.get("theme", None), Some(json!("dark")));
    assert_eq!(store.get("theme", Some("chat")), Some(json!("compact")));
    assert_eq!(backend.get("theme"), Some(json!("dark")));
    assert_eq!(backend.get("unit:chat:theme"), Some(json!("compact")));
}

#[test]
fn missing_keys_resolve_to_none() {
    let (store, _) = store_with_defaults();
    assert!(store.get("nope", None).is_none());
    assert!(store.get("nope", Some("forum")).is_none());
    assert!(store.get("signatures", Some("unregistered")).is_none());
    assert!(matches!(
        store.try_get("nope", None),
        Err(PreferenceError::NotFound { .. })
    ));
}

#[test]
fn remove_without_override_is_an_idempotent_noop() {
    let (mut store, backend) = store_with_defaults();
    store.set("fontSize", json!(20), None).expect("seed override");
    let before_overrides = store.overrides().clone();

    for _ in 0..3 {
        assert!(!store.remove("theme", None).expect("default key"));
        assert!(!store.remove("unknown", None).expect("unknown key"));
        assert!(!store
            .remove("signatures", Some("forum"))
            .expect("unit default key"));
    }

    assert_eq!(store.overrides(), &before_overrides);
    assert_eq!(backend.len(), 1);
}

#[test]
fn remove_deletes_existing_override() {
    let (mut store, backend) = store_with_defaults();
    store.set("theme", json!("dark"), None).expect("seed override");

    assert!(store.remove("theme", None).expect("remove override"));
    assert_eq!(store.get("theme", None), Some(json!("classic")));
    assert!(backend.is_empty());
}

#[test]
fn keys_without_defaults_are_still_persisted() {
    let (mut store, backend) = store_with_defaults();
    store
        .set("lastVisit", json!(1_700_000_000), None)
        .expect("write key without default");
    assert_eq!(store.get("lastVisit", None), Some(json!(1_700_000_000)));
    assert!(backend.contains_key("lastVisit"));
}

#[test]
fn load_replaces_override_layer_from_backend_snapshot() {
    let mut persisted = PreferenceMap::new();
    persisted.insert("theme".to_string(), json!("dark"));
    persisted.insert("unit:forum:signatures".to_string(), json!(false));
    persisted.insert(DISABLED_EXTENSIONS_KEY.to_string(), json!(["chat"]));
    let backend = MemoryBackend::with_entries(persisted);

    let mut store = PreferenceStore::new(backend.clone());
    store.set_global_default("theme", json!("classic"));
    let mut forum_defaults = PreferenceMap::new();
    forum_defaults.insert("signatures".to_string(), json!(true));
    store.set_unit_defaults("forum", forum_defaults);

    assert_eq!(store.get("theme", None), Some(json!("classic")));
    assert_eq!(store.load().expect("load"), 3);

    assert_eq!(store.get("theme", None), Some(json!("dark")));
    assert_eq!(store.get("signatures", Some("forum")), Some(json!(false)));
    assert_eq!(store.disabled_units(), vec!["chat".to_string()]);

    backend.reset().expect("external wipe");
    assert_eq!(store.load().expect("reload"), 0);
    assert_eq!(store.get("theme", None), Some(json!("classic")));
}

#[test]
fn disabled_list_with_wrong_shape_is_treated_as_empty() {
    let (mut store, _) = store_with_defaults();
    store
        .set(DISABLED_EXTENSIONS_KEY, Value::String("chat".to_string()), None)
        .expect("write malformed disabled list");
    assert!(store.disabled_units().is_empty());
}

#[test]
fn global_key_shaped_like_unit_key_survives_reload() {
    let backend = MemoryBackend::new();
    let mut store = PreferenceStore::new(backend.clone());
    store
        .set("unit:a:b", json!(1), None)
        .expect("write oddly named global key");
    assert!(backend.contains_key("global:unit:a:b"));

    let mut reloaded = PreferenceStore::new(backend.clone());
    reloaded.load().expect("reload");
    assert_eq!(reloaded.get("unit:a:b", None), Some(json!(1)));
    assert_eq!(reloaded.get("b", Some("a")), None);

    assert!(reloaded.remove("unit:a:b", None).expect("remove"));
    assert!(backend.is_empty());
}
