//! Unit-facing surface: factories, instances, and the hook context.

use crate::host::{HostPage, PageLocation};
use crate::matcher::PathPatterns;
use crate::prefs::{PrefResult, PreferenceMap, PreferenceStore};
use serde_json::Value;
use std::error::Error;

/// Opaque cause of a unit construction or hook failure.
pub type UnitFailure = Box<dyn Error + Send + Sync + 'static>;

pub type HookResult = Result<(), UnitFailure>;

/// Activation gating declared by a unit.
///
/// An empty list means "no constraint", not "never".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitInfo {
    pub match_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl UnitInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.match_patterns.push(pattern.into());
        self
    }

    pub fn excluding(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }
}

/// Static capability registered for one unit id.
pub trait UnitFactory {
    fn info(&self) -> UnitInfo {
        UnitInfo::default()
    }

    /// Defaults for every key the unit will query through its context.
    fn default_prefs(&self) -> PreferenceMap {
        PreferenceMap::new()
    }

    fn create(&self, unit_id: &str) -> Result<Box<dyn ExtensionUnit>, UnitFailure>;
}

/// Live unit instance driven through `pre_mount → mount → unmount`.
///
/// All hooks default to no-ops.
pub trait ExtensionUnit {
    /// Runs during the mount pass, before the host page is ready.
    fn pre_mount(&mut self, _ctx: &mut UnitContext<'_>) -> HookResult {
        Ok(())
    }

    /// Runs once the host page reached its ready point.
    fn mount(&mut self, _ctx: &mut UnitContext<'_>) -> HookResult {
        Ok(())
    }

    fn unmount(&mut self, _ctx: &mut UnitContext<'_>) -> HookResult {
        Ok(())
    }
}

/// Factory assembled from a constructor closure plus static declarations.
pub struct SimpleFactory<F> {
    info: UnitInfo,
    defaults: PreferenceMap,
    construct: F,
}

impl<F> SimpleFactory<F> {
    pub fn new(construct: F) -> Self
    where
        F: Fn(&str) -> Result<Box<dyn ExtensionUnit>, UnitFailure>,
    {
        Self {
            info: UnitInfo::default(),
            defaults: PreferenceMap::new(),
            construct,
        }
    }

    pub fn with_info(mut self, info: UnitInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }
}

impl<F> UnitFactory for SimpleFactory<F>
where
    F: Fn(&str) -> Result<Box<dyn ExtensionUnit>, UnitFailure>,
{
    fn info(&self) -> UnitInfo {
        self.info.clone()
    }

    fn default_prefs(&self) -> PreferenceMap {
        self.defaults.clone()
    }

    fn create(&self, unit_id: &str) -> Result<Box<dyn ExtensionUnit>, UnitFailure> {
        (self.construct)(unit_id)
    }
}

/// Immutable declaration snapshot taken from a factory before instantiation.
#[derive(Debug, Clone)]
pub struct UnitDescriptor {
    pub id: String,
    pub match_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub default_prefs: PreferenceMap,
    matchers: PathPatterns,
    excluders: PathPatterns,
}

impl UnitDescriptor {
    pub fn introspect(id: &str, factory: &dyn UnitFactory) -> Self {
        let info = factory.info();
        Self {
            id: id.to_string(),
            matchers: PathPatterns::compile(&info.match_patterns),
            excluders: PathPatterns::compile(&info.exclude_patterns),
            match_patterns: info.match_patterns,
            exclude_patterns: info.exclude_patterns,
            default_prefs: factory.default_prefs(),
        }
    }

    /// False only when a non-empty match list has no hit.
    pub fn admits(&self, path: &str) -> bool {
        self.match_patterns.is_empty() || self.matchers.is_match(path)
    }

    /// True only when a non-empty exclude list has a hit.
    pub fn excludes(&self, path: &str) -> bool {
        !self.exclude_patterns.is_empty() && self.excluders.is_match(path)
    }
}

/// Borrowed view the host hands to each unit hook.
///
/// Preference accessors are scoped to the unit's own namespace.
pub struct UnitContext<'a> {
    unit_id: &'a str,
    prefs: &'a mut PreferenceStore,
    page: &'a dyn HostPage,
    asset_base: &'a str,
}

impl<'a> UnitContext<'a> {
    pub fn new(
        unit_id: &'a str,
        prefs: &'a mut PreferenceStore,
        page: &'a dyn HostPage,
        asset_base: &'a str,
    ) -> Self {
        Self {
            unit_id,
            prefs,
            page,
            asset_base,
        }
    }

    pub fn unit_id(&self) -> &str {
        self.unit_id
    }

    pub fn location(&self) -> PageLocation {
        self.page.location()
    }

    pub fn get_pref(&self, key: &str) -> Option<Value> {
        self.prefs.get(key, Some(self.unit_id))
    }

    pub fn set_pref(&mut self, key: &str, value: impl Into<Value>) -> PrefResult<()> {
        self.prefs.set(key, value.into(), Some(self.unit_id))
    }

    pub fn remove_pref(&mut self, key: &str) -> PrefResult<bool> {
        self.prefs.remove(key, Some(self.unit_id))
    }

    /// Reads a host-wide key such as `disabledExtensions`.
    pub fn global_pref(&self, key: &str) -> Option<Value> {
        self.prefs.get(key, None)
    }

    pub fn add_css(&self, css: &str) {
        self.page.append_style(self.unit_id, css);
    }

    /// Links `<asset_base>extensions/<unit_id>/<filename>.css`.
    pub fn add_stylesheet(&self, filename: &str) {
        let href = format!(
            "{}extensions/{}/{}.css",
            self.asset_base, self.unit_id, filename
        );
        self.page.append_stylesheet(self.unit_id, &href);
    }

    pub fn remove_css(&self) {
        self.page.remove_styles(self.unit_id);
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtensionUnit, SimpleFactory, UnitDescriptor, UnitInfo};
    use serde_json::json;

    struct Inert;

    impl ExtensionUnit for Inert {}

    #[test]
    fn descriptor_captures_factory_declarations() {
        let factory = SimpleFactory::new(|_| Ok(Box::new(Inert) as Box<dyn ExtensionUnit>))
            .with_info(UnitInfo::new().matching("/app/*").excluding("/app/admin"))
            .with_default("enabled", json!(true));

        let descriptor = UnitDescriptor::introspect("sidebar", &factory);
        assert_eq!(descriptor.id, "sidebar");
        assert_eq!(descriptor.match_patterns, vec!["/app/*"]);
        assert_eq!(descriptor.exclude_patterns, vec!["/app/admin"]);
        assert_eq!(descriptor.default_prefs.get("enabled"), Some(&json!(true)));
    }

    #[test]
    fn empty_lists_do_not_constrain() {
        let factory = SimpleFactory::new(|_| Ok(Box::new(Inert) as Box<dyn ExtensionUnit>));
        let descriptor = UnitDescriptor::introspect("anywhere", &factory);
        assert!(descriptor.admits("/market"));
        assert!(!descriptor.excludes("/market"));
    }

    #[test]
    fn admits_and_excludes_follow_patterns() {
        let factory = SimpleFactory::new(|_| Ok(Box::new(Inert) as Box<dyn ExtensionUnit>))
            .with_info(UnitInfo::new().matching("/app/*").excluding("/app/admin*"));
        let descriptor = UnitDescriptor::introspect("scoped", &factory);

        assert!(descriptor.admits("/app/settings"));
        assert!(!descriptor.admits("/forum"));
        assert!(descriptor.excludes("/app/admin?x=1"));
        assert!(!descriptor.excludes("/app/settings"));
    }
}
