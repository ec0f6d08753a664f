//! Unit activation and the two-phase mount lifecycle.
//!
//! # Responsibility
//! - Decide per page load which registered units activate.
//! - Drive activated units through `pre_mount → mount → unmount`.
//! - Isolate every per-unit failure from its siblings.
//!
//! # Invariants
//! - A mount pass runs at most once until the next unmount.
//! - Hooks run in registration order.
//! - No unit failure aborts a pass; each is logged and reported.

mod manager;
mod report;

pub use manager::{DeactivationPolicy, LifecycleManager, UnitState};
pub use report::{
    ActivationReport, ActivationStatus, MountReport, SkipReason, UnitEvaluation, UnitOutcome,
    UnmountReport,
};
