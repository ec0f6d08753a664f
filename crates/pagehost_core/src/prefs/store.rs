//! Two-layer preference store: defaults and persisted overrides.

use super::backend::PreferenceBackend;
use super::key::PersistedKey;
use super::{PrefResult, PreferenceError, PreferenceMap};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;

/// Global key holding the ids of units the user switched off.
pub const DISABLED_EXTENSIONS_KEY: &str = "disabledExtensions";

/// One resolution layer: global keys plus per-unit namespaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceLayer {
    global: PreferenceMap,
    units: BTreeMap<String, PreferenceMap>,
}

impl PreferenceLayer {
    pub fn lookup(&self, key: &str, unit_id: Option<&str>) -> Option<&Value> {
        match unit_id {
            None => self.global.get(key),
            Some(unit_id) => self.units.get(unit_id)?.get(key),
        }
    }

    pub fn contains(&self, key: &str, unit_id: Option<&str>) -> bool {
        self.lookup(key, unit_id).is_some()
    }

    fn insert(&mut self, key: &str, unit_id: Option<&str>, value: Value) {
        match unit_id {
            None => {
                self.global.insert(key.to_string(), value);
            }
            Some(unit_id) => {
                self.units
                    .entry(unit_id.to_string())
                    .or_default()
                    .insert(key.to_string(), value);
            }
        }
    }

    fn remove(&mut self, key: &str, unit_id: Option<&str>) -> Option<Value> {
        match unit_id {
            None => self.global.remove(key),
            Some(unit_id) => {
                let namespace = self.units.get_mut(unit_id)?;
                let removed = namespace.remove(key);
                if namespace.is_empty() {
                    self.units.remove(unit_id);
                }
                removed
            }
        }
    }

    pub fn global(&self) -> &PreferenceMap {
        &self.global
    }

    pub fn unit(&self, unit_id: &str) -> Option<&PreferenceMap> {
        self.units.get(unit_id)
    }

    /// Iterates every entry with its persisted identity, globals first.
    pub fn entries(&self) -> impl Iterator<Item = (PersistedKey, &Value)> + '_ {
        let globals = self
            .global
            .iter()
            .map(|(key, value)| (PersistedKey::Global(key.clone()), value));
        let units = self.units.iter().flat_map(|(unit_id, namespace)| {
            namespace.iter().map(move |(key, value)| {
                (
                    PersistedKey::Unit {
                        unit_id: unit_id.clone(),
                        key: key.clone(),
                    },
                    value,
                )
            })
        });
        globals.chain(units)
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.units.values().map(PreferenceMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Layered preference store over a persistent backend.
///
/// # Invariants
/// - Overrides mirror the backend: every in-memory write goes to the backend
///   first and is only cached once the backend accepted it.
/// - `set` with a value equal to the default deletes the override.
pub struct PreferenceStore {
    backend: Box<dyn PreferenceBackend>,
    defaults: PreferenceLayer,
    overrides: PreferenceLayer,
    loaded: bool,
}

impl PreferenceStore {
    /// Creates a store whose global defaults contain only the disabled list.
    pub fn new(backend: impl PreferenceBackend + 'static) -> Self {
        let mut defaults = PreferenceLayer::default();
        defaults.insert(DISABLED_EXTENSIONS_KEY, None, Value::Array(vec![]));
        Self {
            backend: Box::new(backend),
            defaults,
            overrides: PreferenceLayer::default(),
            loaded: false,
        }
    }

    /// Registers or replaces one global default.
    pub fn set_global_default(&mut self, key: &str, value: Value) {
        self.defaults.insert(key, None, value);
    }

    /// Replaces the default namespace of one unit.
    pub fn set_unit_defaults(&mut self, unit_id: &str, defaults: PreferenceMap) {
        self.defaults.units.insert(unit_id.to_string(), defaults);
    }

    /// Pulls the full override set from the backend, replacing the cache.
    ///
    /// Returns the number of overrides loaded.
    pub fn load(&mut self) -> PrefResult<usize> {
        let snapshot = self.backend.snapshot()?;
        let mut overrides = PreferenceLayer::default();
        for (raw_key, value) in snapshot {
            let key = PersistedKey::decode(&raw_key);
            overrides.insert(key.key(), key.unit_id(), value);
        }
        let count = overrides.len();
        self.overrides = overrides;
        self.loaded = true;
        info!("event=prefs_load module=prefs status=ok overrides={count}");
        Ok(count)
    }

    /// Runs `load` and hands the populated store to `on_loaded`.
    pub fn load_then<T>(&mut self, on_loaded: impl FnOnce(&mut Self) -> T) -> PrefResult<T> {
        self.load()?;
        Ok(on_loaded(self))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Resolves one key, override first, then default.
    pub fn try_get(&self, key: &str, unit_id: Option<&str>) -> PrefResult<&Value> {
        self.overrides
            .lookup(key, unit_id)
            .or_else(|| self.defaults.lookup(key, unit_id))
            .ok_or_else(|| PreferenceError::not_found(key, unit_id))
    }

    /// Resolves one key; a miss is logged and yields `None`.
    pub fn get(&self, key: &str, unit_id: Option<&str>) -> Option<Value> {
        match self.try_get(key, unit_id) {
            Ok(value) => Some(value.clone()),
            Err(err) => {
                warn!(
                    "event=pref_get module=prefs status=miss error_code={} unit_id={} key={}",
                    err.code(),
                    unit_id.unwrap_or("-"),
                    key
                );
                None
            }
        }
    }

    /// Writes one value, collapsing it to the default when they are equal.
    pub fn set(&mut self, key: &str, value: Value, unit_id: Option<&str>) -> PrefResult<()> {
        let persisted = PersistedKey::new(key, unit_id);
        if self.defaults.lookup(key, unit_id) == Some(&value) {
            self.backend.remove(&persisted.encode())?;
            self.overrides.remove(key, unit_id);
            debug!("event=pref_set module=prefs status=ok mode=default key={persisted}");
        } else {
            self.backend.set(&persisted.encode(), &value)?;
            self.overrides.insert(key, unit_id, value);
            debug!("event=pref_set module=prefs status=ok mode=override key={persisted}");
        }
        Ok(())
    }

    /// Deletes one override, failing with `AlreadyDefault` or `NotFound` when
    /// there is nothing to delete.
    pub fn try_remove(&mut self, key: &str, unit_id: Option<&str>) -> PrefResult<()> {
        if !self.overrides.contains(key, unit_id) {
            if self.defaults.contains(key, unit_id) {
                return Err(PreferenceError::already_default(key, unit_id));
            }
            return Err(PreferenceError::not_found(key, unit_id));
        }

        let persisted = PersistedKey::new(key, unit_id);
        self.backend.remove(&persisted.encode())?;
        self.overrides.remove(key, unit_id);
        debug!("event=pref_remove module=prefs status=ok key={persisted}");
        Ok(())
    }

    /// Deletes one override. Returns whether anything was removed; misses are
    /// logged, backend failures are returned.
    pub fn remove(&mut self, key: &str, unit_id: Option<&str>) -> PrefResult<bool> {
        match self.try_remove(key, unit_id) {
            Ok(()) => Ok(true),
            Err(err @ PreferenceError::Backend(_)) => Err(err),
            Err(err) => {
                warn!(
                    "event=pref_remove module=prefs status=noop error_code={} unit_id={} key={}",
                    err.code(),
                    unit_id.unwrap_or("-"),
                    key
                );
                Ok(false)
            }
        }
    }

    /// Ids listed under `disabledExtensions`. Non-string entries are ignored.
    pub fn disabled_units(&self) -> Vec<String> {
        match self.get(DISABLED_EXTENSIONS_KEY, None) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(id) => Some(id),
                    _ => None,
                })
                .collect(),
            Some(other) => {
                warn!(
                    "event=pref_get module=prefs status=invalid key={} kind={}",
                    DISABLED_EXTENSIONS_KEY,
                    value_kind(&other)
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Wipes the backend and the in-memory override layer.
    pub fn reset(&mut self) -> PrefResult<()> {
        self.backend.reset()?;
        self.overrides = PreferenceLayer::default();
        info!("event=prefs_reset module=prefs status=ok");
        Ok(())
    }

    pub fn defaults(&self) -> &PreferenceLayer {
        &self.defaults
    }

    pub fn overrides(&self) -> &PreferenceLayer {
        &self.overrides
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
