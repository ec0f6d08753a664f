//! In-page extension host core.
//!
//! Decides which registered extension units activate for the current page,
//! drives them through their mount lifecycle, and resolves their layered
//! preferences.

pub mod config;
pub mod db;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod matcher;
pub mod prefs;
pub mod reset;
pub mod unit;

pub use config::{ConfigError, HostConfig, DEFAULT_RESET_PHRASE};
pub use host::{HostPage, PageLocation, ReadyState};
pub use lifecycle::{
    ActivationReport, ActivationStatus, DeactivationPolicy, LifecycleManager, MountReport,
    SkipReason, UnitEvaluation, UnitOutcome, UnitState, UnmountReport,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use matcher::{matches_any, PathPatterns};
pub use prefs::{
    BackendError, MemoryBackend, PersistedKey, PrefResult, PreferenceBackend, PreferenceError,
    PreferenceMap, PreferenceStore, SqliteBackend, DISABLED_EXTENSIONS_KEY,
};
pub use reset::{confirm_and_reset, is_reset_confirmed, ResetError, ResetOutcome};
pub use unit::{
    CatalogError, ExtensionUnit, HookResult, LifecyclePhase, SimpleFactory, UnitCatalog,
    UnitContext, UnitDescriptor, UnitError, UnitFactory, UnitFailure, UnitInfo,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
