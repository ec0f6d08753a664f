//! Persisted key naming.
//!
//! Unit-scoped keys are stored as `unit:<unit_id>:<key>`. Global keys are
//! stored verbatim unless they start with `unit:` or `global:`; those are
//! escaped as `global:<key>` so encoding stays unambiguous.

use std::fmt::{Display, Formatter};

const UNIT_KEY_PREFIX: &str = "unit:";
const GLOBAL_KEY_PREFIX: &str = "global:";

/// Backend-level identity of one preference override.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PersistedKey {
    Global(String),
    Unit { unit_id: String, key: String },
}

impl PersistedKey {
    pub fn new(key: &str, unit_id: Option<&str>) -> Self {
        match unit_id {
            Some(unit_id) => Self::Unit {
                unit_id: unit_id.to_string(),
                key: key.to_string(),
            },
            None => Self::Global(key.to_string()),
        }
    }

    /// Decodes one raw backend key.
    ///
    /// A `unit:` prefix without both an id and a key segment is treated as a
    /// plain global key.
    pub fn decode(raw: &str) -> Self {
        if let Some(key) = raw.strip_prefix(GLOBAL_KEY_PREFIX) {
            return Self::Global(key.to_string());
        }
        if let Some(rest) = raw.strip_prefix(UNIT_KEY_PREFIX) {
            if let Some((unit_id, key)) = rest.split_once(':') {
                if !unit_id.is_empty() && !key.is_empty() {
                    return Self::Unit {
                        unit_id: unit_id.to_string(),
                        key: key.to_string(),
                    };
                }
            }
        }
        Self::Global(raw.to_string())
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Global(key)
                if key.starts_with(UNIT_KEY_PREFIX) || key.starts_with(GLOBAL_KEY_PREFIX) =>
            {
                format!("{GLOBAL_KEY_PREFIX}{key}")
            }
            Self::Global(key) => key.clone(),
            Self::Unit { unit_id, key } => format!("{UNIT_KEY_PREFIX}{unit_id}:{key}"),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Global(key) => key,
            Self::Unit { key, .. } => key,
        }
    }

    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Self::Global(_) => None,
            Self::Unit { unit_id, .. } => Some(unit_id),
        }
    }
}

impl Display for PersistedKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::PersistedKey;

    #[test]
    fn unit_keys_are_namespaced_by_unit_id() {
        let key = PersistedKey::new("theme", Some("forum.tweaks"));
        assert_eq!(key.encode(), "unit:forum.tweaks:theme");
        assert_eq!(PersistedKey::decode("unit:forum.tweaks:theme"), key);
    }

    #[test]
    fn unit_key_may_contain_colons() {
        let decoded = PersistedKey::decode("unit:chat:layout:wide");
        assert_eq!(decoded.unit_id(), Some("chat"));
        assert_eq!(decoded.key(), "layout:wide");
    }

    #[test]
    fn global_keys_with_reserved_prefixes_are_escaped() {
        let shaped_like_unit = PersistedKey::Global("unit:a:b".to_string());
        assert_eq!(shaped_like_unit.encode(), "global:unit:a:b");
        assert_eq!(PersistedKey::decode("global:unit:a:b"), shaped_like_unit);

        let escaped_twice = PersistedKey::Global("global:x".to_string());
        assert_eq!(escaped_twice.encode(), "global:global:x");
        assert_eq!(PersistedKey::decode("global:global:x"), escaped_twice);

        assert_eq!(
            PersistedKey::Global("disabledExtensions".to_string()).encode(),
            "disabledExtensions"
        );
    }

    #[test]
    fn malformed_unit_prefix_falls_back_to_global() {
        assert_eq!(
            PersistedKey::decode("unit::theme"),
            PersistedKey::Global("unit::theme".to_string())
        );
        assert_eq!(
            PersistedKey::decode("unit:orphan"),
            PersistedKey::Global("unit:orphan".to_string())
        );
        assert_eq!(
            PersistedKey::decode("disabledExtensions"),
            PersistedKey::Global("disabledExtensions".to_string())
        );
    }
}
