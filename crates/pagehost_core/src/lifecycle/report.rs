//! Pass reports returned by the lifecycle manager.

use crate::unit::UnitError;

/// Why a unit was evaluated but not instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NotMatched,
    Excluded,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NotMatched => "not_matched",
            Self::Excluded => "excluded",
        }
    }
}

/// Result of evaluating one known unit during the mount pass.
#[derive(Debug)]
pub enum UnitOutcome {
    PreMounted,
    Skipped(SkipReason),
    Failed(UnitError),
}

#[derive(Debug)]
pub struct UnitEvaluation {
    pub unit_id: String,
    pub outcome: UnitOutcome,
}

/// Result of invoking `mount` on every pre-mounted unit.
#[derive(Debug, Default)]
pub struct ActivationReport {
    pub mounted: Vec<String>,
    pub failures: Vec<UnitError>,
}

#[derive(Debug)]
pub enum ActivationStatus {
    Completed(ActivationReport),
    /// Host page was not ready; activation runs on the ready signal.
    Deferred,
}

/// Full account of one mount pass.
#[derive(Debug)]
pub struct MountReport {
    pub activation_path: String,
    pub evaluations: Vec<UnitEvaluation>,
    pub activation: ActivationStatus,
}

impl MountReport {
    pub fn outcome(&self, unit_id: &str) -> Option<&UnitOutcome> {
        self.evaluations
            .iter()
            .find(|evaluation| evaluation.unit_id == unit_id)
            .map(|evaluation| &evaluation.outcome)
    }

    /// Ids that passed pre-mount, in registry order.
    pub fn pre_mounted(&self) -> Vec<&str> {
        self.evaluations
            .iter()
            .filter(|evaluation| matches!(evaluation.outcome, UnitOutcome::PreMounted))
            .map(|evaluation| evaluation.unit_id.as_str())
            .collect()
    }

    pub fn skipped(&self, reason: SkipReason) -> Vec<&str> {
        self.evaluations
            .iter()
            .filter(|evaluation| matches!(evaluation.outcome, UnitOutcome::Skipped(r) if r == reason))
            .map(|evaluation| evaluation.unit_id.as_str())
            .collect()
    }

    pub fn failures(&self) -> Vec<&UnitError> {
        self.evaluations
            .iter()
            .filter_map(|evaluation| match &evaluation.outcome {
                UnitOutcome::Failed(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.activation, ActivationStatus::Deferred)
    }

    pub fn activation_report(&self) -> Option<&ActivationReport> {
        match &self.activation {
            ActivationStatus::Completed(report) => Some(report),
            ActivationStatus::Deferred => None,
        }
    }
}

/// Full account of one unmount pass.
#[derive(Debug, Default)]
pub struct UnmountReport {
    /// False when the deactivation policy skipped unit hooks.
    pub hooks_invoked: bool,
    pub unmounted: Vec<String>,
    pub failures: Vec<UnitError>,
}
