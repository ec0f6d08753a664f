//! Extension unit contracts.
//!
//! This module defines what an embedder registers (a factory per unit id),
//! what the host hands to units (a scoped context), and how per-unit failures
//! are classified. Activation policy lives in `crate::lifecycle`.

pub mod catalog;
pub mod contract;
pub mod error;

pub use catalog::{CatalogError, UnitCatalog};
pub use contract::{
    ExtensionUnit, HookResult, SimpleFactory, UnitContext, UnitDescriptor, UnitFactory,
    UnitFailure, UnitInfo,
};
pub use error::{LifecyclePhase, UnitError};
