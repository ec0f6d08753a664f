//! Per-unit failure taxonomy.

use super::contract::UnitFailure;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lifecycle step a failure was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Lookup,
    Construct,
    PreMount,
    Mount,
    Unmount,
}

impl LifecyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Construct => "construct",
            Self::PreMount => "pre_mount",
            Self::Mount => "mount",
            Self::Unmount => "unmount",
        }
    }
}

impl Display for LifecyclePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one unit. Always recovered by the lifecycle manager.
#[derive(Debug)]
pub enum UnitError {
    FactoryMissing {
        unit_id: String,
    },
    ConstructionFailed {
        unit_id: String,
        cause: UnitFailure,
    },
    HookFailed {
        unit_id: String,
        phase: LifecyclePhase,
        cause: UnitFailure,
    },
}

impl UnitError {
    pub fn unit_id(&self) -> &str {
        match self {
            Self::FactoryMissing { unit_id }
            | Self::ConstructionFailed { unit_id, .. }
            | Self::HookFailed { unit_id, .. } => unit_id,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        match self {
            Self::FactoryMissing { .. } => LifecyclePhase::Lookup,
            Self::ConstructionFailed { .. } => LifecyclePhase::Construct,
            Self::HookFailed { phase, .. } => *phase,
        }
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FactoryMissing { .. } => "unit_factory_missing",
            Self::ConstructionFailed { .. } => "unit_construction_failed",
            Self::HookFailed { .. } => "unit_hook_failed",
        }
    }
}

impl Display for UnitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FactoryMissing { unit_id } => write!(f, "extension not found: {unit_id}"),
            Self::ConstructionFailed { unit_id, cause } => {
                write!(f, "cannot construct extension {unit_id}: {cause}")
            }
            Self::HookFailed {
                unit_id,
                phase,
                cause,
            } => write!(f, "extension {unit_id} failed in {phase}: {cause}"),
        }
    }
}

impl Error for UnitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FactoryMissing { .. } => None,
            Self::ConstructionFailed { cause, .. } | Self::HookFailed { cause, .. } => {
                Some(cause.as_ref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecyclePhase, UnitError};
    use std::error::Error;

    #[test]
    fn hook_failure_exposes_context_and_cause() {
        let err = UnitError::HookFailed {
            unit_id: "chat".to_string(),
            phase: LifecyclePhase::PreMount,
            cause: "socket closed".into(),
        };
        assert_eq!(err.unit_id(), "chat");
        assert_eq!(err.phase(), LifecyclePhase::PreMount);
        assert_eq!(err.code(), "unit_hook_failed");
        assert_eq!(err.to_string(), "extension chat failed in pre_mount: socket closed");
        assert!(err.source().is_some());
    }

    #[test]
    fn missing_factory_has_no_cause() {
        let err = UnitError::FactoryMissing {
            unit_id: "ghost".to_string(),
        };
        assert_eq!(err.phase(), LifecyclePhase::Lookup);
        assert!(err.source().is_none());
    }
}
