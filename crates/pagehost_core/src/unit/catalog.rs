//! Startup-time registry of known unit ids and their factories.

use super::contract::UnitFactory;
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Catalog registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    InvalidUnitId(String),
    DuplicateUnitId(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUnitId(value) => write!(f, "unit id is invalid: {value}"),
            Self::DuplicateUnitId(value) => write!(f, "unit id already registered: {value}"),
        }
    }
}

impl Error for CatalogError {}

/// Ordered set of known unit ids, each optionally backed by a factory.
///
/// Registration order is activation order.
#[derive(Default)]
pub struct UnitCatalog {
    order: Vec<String>,
    known: HashSet<String>,
    factories: BTreeMap<String, Box<dyn UnitFactory>>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one unit id together with its factory.
    pub fn register(
        &mut self,
        unit_id: &str,
        factory: impl UnitFactory + 'static,
    ) -> Result<(), CatalogError> {
        let unit_id = self.admit(unit_id)?;
        self.factories.insert(unit_id, Box::new(factory));
        Ok(())
    }

    /// Records a known id whose implementation is not available.
    ///
    /// The mount pass reports such ids as factory-missing.
    pub fn declare(&mut self, unit_id: &str) -> Result<(), CatalogError> {
        self.admit(unit_id).map(|_| ())
    }

    fn admit(&mut self, unit_id: &str) -> Result<String, CatalogError> {
        let unit_id = unit_id.trim().to_string();
        if !is_valid_unit_id(&unit_id) {
            return Err(CatalogError::InvalidUnitId(unit_id));
        }
        if !self.known.insert(unit_id.clone()) {
            return Err(CatalogError::DuplicateUnitId(unit_id));
        }
        self.order.push(unit_id.clone());
        Ok(unit_id)
    }

    /// Known ids in registration order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn factory(&self, unit_id: &str) -> Option<&dyn UnitFactory> {
        self.factories.get(unit_id).map(|factory| factory.as_ref())
    }

    pub fn contains(&self, unit_id: &str) -> bool {
        self.known.contains(unit_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Ids are ascii alphanumerics joined by single `.`, `_` or `-` separators.
fn is_valid_unit_id(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_alphanumeric() {
            prev_separator = false;
        } else if matches!(c, '.' | '_' | '-') && !prev_separator {
            prev_separator = true;
        } else {
            return false;
        }
    }
    !prev_separator
}
