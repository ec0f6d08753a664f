//! Lifecycle manager: activation decisions and hook dispatch.

use super::report::{
    ActivationReport, ActivationStatus, MountReport, SkipReason, UnitEvaluation, UnitOutcome,
    UnmountReport,
};
use crate::config::HostConfig;
use crate::host::HostPage;
use crate::logging::sanitize_message;
use crate::prefs::{PrefResult, PreferenceStore};
use crate::unit::{
    ExtensionUnit, LifecyclePhase, UnitCatalog, UnitContext, UnitDescriptor, UnitError,
    UnitFailure,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

const MAX_PANIC_CAUSE_CHARS: usize = 160;

/// Whether the unmount pass calls each unit's `unmount` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationPolicy {
    #[default]
    InvokeHooks,
    /// Only flips the mounted flag; units are assumed stateless.
    SkipHooks,
}

/// Observable lifecycle position of one known unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Registered,
    Skipped(SkipReason),
    Failed(LifecyclePhase),
    PreMounted,
    Mounted,
    Unmounted,
}

struct ActiveUnit {
    id: String,
    instance: Box<dyn ExtensionUnit>,
}

/// Owns the unit catalog, the preference store, and the active registry for
/// one host-page session.
pub struct LifecycleManager {
    catalog: UnitCatalog,
    prefs: PreferenceStore,
    policy: DeactivationPolicy,
    asset_base: String,
    active: Vec<ActiveUnit>,
    states: BTreeMap<String, UnitState>,
    mounted: bool,
    activation_pending: bool,
}

impl LifecycleManager {
    pub fn new(catalog: UnitCatalog, prefs: PreferenceStore) -> Self {
        Self::with_config(catalog, prefs, &HostConfig::default())
    }

    pub fn with_config(catalog: UnitCatalog, prefs: PreferenceStore, config: &HostConfig) -> Self {
        let states = catalog
            .ids()
            .iter()
            .map(|id| (id.clone(), UnitState::Registered))
            .collect();
        Self {
            catalog,
            prefs,
            policy: config.deactivation,
            asset_base: config.asset_base.clone(),
            active: Vec::new(),
            states,
            mounted: false,
            activation_pending: false,
        }
    }

    pub fn set_deactivation_policy(&mut self, policy: DeactivationPolicy) {
        self.policy = policy;
    }

    /// Loads persisted preferences, then runs the mount pass.
    ///
    /// Returns `Ok(None)` when already mounted.
    pub fn start(&mut self, page: &dyn HostPage) -> PrefResult<Option<MountReport>> {
        if self.mounted {
            return Ok(None);
        }
        self.prefs.load()?;
        Ok(self.mount(page))
    }

    /// Runs the mount pass. Returns `None` when already mounted.
    pub fn mount(&mut self, page: &dyn HostPage) -> Option<MountReport> {
        if self.mounted {
            debug!("event=mount_pass module=lifecycle status=skipped reason=already_mounted");
            return None;
        }

        let started_at = Instant::now();
        let disabled = self.prefs.disabled_units();
        let activation_path = page.location().activation_path();
        info!(
            "event=mount_pass module=lifecycle status=start units={} disabled={} path={}",
            self.catalog.len(),
            disabled.len(),
            activation_path
        );

        let unit_ids = self.catalog.ids().to_vec();
        let mut evaluations = Vec::with_capacity(unit_ids.len());
        for unit_id in unit_ids {
            let outcome = if disabled.contains(&unit_id) {
                UnitOutcome::Skipped(SkipReason::Disabled)
            } else {
                self.evaluate(&unit_id, &activation_path, page)
            };
            self.record(&unit_id, &outcome);
            evaluations.push(UnitEvaluation { unit_id, outcome });
        }

        let ready_state = page.ready_state();
        let activation = if ready_state.is_ready() {
            ActivationStatus::Completed(self.activate_all(page))
        } else {
            self.activation_pending = true;
            info!(
                "event=activation module=lifecycle status=deferred ready_state={} pending={}",
                ready_state.as_str(),
                self.active.len()
            );
            ActivationStatus::Deferred
        };

        self.mounted = true;
        info!(
            "event=mount_pass module=lifecycle status=ok active={} duration_ms={}",
            self.active.len(),
            started_at.elapsed().as_millis()
        );

        Some(MountReport {
            activation_path,
            evaluations,
            activation,
        })
    }

    /// Delivers the host page's ready signal.
    ///
    /// Runs the deferred activation exactly once; returns `None` when nothing
    /// was waiting.
    pub fn handle_host_ready(&mut self, page: &dyn HostPage) -> Option<ActivationReport> {
        if !self.activation_pending {
            return None;
        }
        self.activation_pending = false;
        info!("event=activation module=lifecycle status=ready_signal");
        Some(self.activate_all(page))
    }

    /// Runs the unmount pass. Returns `None` when not mounted.
    pub fn unmount(&mut self, page: &dyn HostPage) -> Option<UnmountReport> {
        if !self.mounted {
            return None;
        }

        let invoke_hooks = self.policy == DeactivationPolicy::InvokeHooks;
        info!(
            "event=unmount_pass module=lifecycle status=start active={} invoke_hooks={}",
            self.active.len(),
            invoke_hooks
        );

        let mut report = UnmountReport {
            hooks_invoked: invoke_hooks,
            ..UnmountReport::default()
        };
        for unit in self.active.iter_mut() {
            if invoke_hooks {
                let mut ctx = UnitContext::new(&unit.id, &mut self.prefs, page, &self.asset_base);
                let result = guarded(|| unit.instance.unmount(&mut ctx));
                if let Err(cause) = result {
                    let err = UnitError::HookFailed {
                        unit_id: unit.id.clone(),
                        phase: LifecyclePhase::Unmount,
                        cause,
                    };
                    log_unit_failure(&err);
                    report.failures.push(err);
                    self.states.insert(unit.id.clone(), UnitState::Unmounted);
                    continue;
                }
            }
            self.states.insert(unit.id.clone(), UnitState::Unmounted);
            report.unmounted.push(unit.id.clone());
        }

        self.active.clear();
        self.activation_pending = false;
        self.mounted = false;
        info!(
            "event=unmount_pass module=lifecycle status=ok unmounted={} failed={}",
            report.unmounted.len(),
            report.failures.len()
        );
        Some(report)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_activation_pending(&self) -> bool {
        self.activation_pending
    }

    /// Ids in the active registry, in activation order.
    pub fn active_unit_ids(&self) -> Vec<&str> {
        self.active.iter().map(|unit| unit.id.as_str()).collect()
    }

    pub fn unit_state(&self, unit_id: &str) -> Option<UnitState> {
        self.states.get(unit_id).copied()
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    pub fn prefs(&self) -> &PreferenceStore {
        &self.prefs
    }

    pub fn prefs_mut(&mut self) -> &mut PreferenceStore {
        &mut self.prefs
    }

    /// Steps 3–8 of the mount pass for one non-disabled unit.
    fn evaluate(&mut self, unit_id: &str, path: &str, page: &dyn HostPage) -> UnitOutcome {
        let Some(factory) = self.catalog.factory(unit_id) else {
            return UnitOutcome::Failed(UnitError::FactoryMissing {
                unit_id: unit_id.to_string(),
            });
        };

        let descriptor = match guarded(|| Ok(UnitDescriptor::introspect(unit_id, factory))) {
            Ok(descriptor) => descriptor,
            Err(cause) => {
                return UnitOutcome::Failed(UnitError::ConstructionFailed {
                    unit_id: unit_id.to_string(),
                    cause,
                })
            }
        };
        self.prefs
            .set_unit_defaults(unit_id, descriptor.default_prefs.clone());

        if !descriptor.admits(path) {
            return UnitOutcome::Skipped(SkipReason::NotMatched);
        }
        if descriptor.excludes(path) {
            return UnitOutcome::Skipped(SkipReason::Excluded);
        }

        let mut instance = match guarded(|| factory.create(unit_id)) {
            Ok(instance) => instance,
            Err(cause) => {
                return UnitOutcome::Failed(UnitError::ConstructionFailed {
                    unit_id: unit_id.to_string(),
                    cause,
                })
            }
        };

        let mut ctx = UnitContext::new(unit_id, &mut self.prefs, page, &self.asset_base);
        if let Err(cause) = guarded(|| instance.pre_mount(&mut ctx)) {
            return UnitOutcome::Failed(UnitError::HookFailed {
                unit_id: unit_id.to_string(),
                phase: LifecyclePhase::PreMount,
                cause,
            });
        }

        self.active.push(ActiveUnit {
            id: unit_id.to_string(),
            instance,
        });
        UnitOutcome::PreMounted
    }

    fn record(&mut self, unit_id: &str, outcome: &UnitOutcome) {
        let state = match outcome {
            UnitOutcome::PreMounted => {
                info!("event=unit_pre_mount module=lifecycle status=ok unit_id={unit_id}");
                UnitState::PreMounted
            }
            UnitOutcome::Skipped(reason) => {
                debug!(
                    "event=unit_evaluate module=lifecycle status=skipped unit_id={} reason={}",
                    unit_id,
                    reason.as_str()
                );
                UnitState::Skipped(*reason)
            }
            UnitOutcome::Failed(err) => {
                log_unit_failure(err);
                UnitState::Failed(err.phase())
            }
        };
        self.states.insert(unit_id.to_string(), state);
    }

    fn activate_all(&mut self, page: &dyn HostPage) -> ActivationReport {
        let mut report = ActivationReport::default();
        for unit in self.active.iter_mut() {
            let mut ctx = UnitContext::new(&unit.id, &mut self.prefs, page, &self.asset_base);
            match guarded(|| unit.instance.mount(&mut ctx)) {
                Ok(()) => {
                    info!(
                        "event=unit_mount module=lifecycle status=ok unit_id={}",
                        unit.id
                    );
                    self.states.insert(unit.id.clone(), UnitState::Mounted);
                    report.mounted.push(unit.id.clone());
                }
                Err(cause) => {
                    let err = UnitError::HookFailed {
                        unit_id: unit.id.clone(),
                        phase: LifecyclePhase::Mount,
                        cause,
                    };
                    log_unit_failure(&err);
                    self.states
                        .insert(unit.id.clone(), UnitState::Failed(LifecyclePhase::Mount));
                    report.failures.push(err);
                }
            }
        }
        report
    }
}

fn log_unit_failure(err: &UnitError) {
    warn!(
        "event=unit_{} module=lifecycle status=error unit_id={} error_code={} error={}",
        err.phase(),
        err.unit_id(),
        err.code(),
        sanitize_message(&err.to_string(), MAX_PANIC_CAUSE_CHARS * 2)
    );
}

/// Runs unit code, converting a panic into an ordinary failure.
fn guarded<T>(hook: impl FnOnce() -> Result<T, UnitFailure>) -> Result<T, UnitFailure> {
    panic::catch_unwind(AssertUnwindSafe(hook)).unwrap_or_else(|payload| Err(panic_cause(payload)))
}

fn panic_cause(payload: Box<dyn Any + Send>) -> UnitFailure {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };
    format!(
        "panicked: {}",
        sanitize_message(&message, MAX_PANIC_CAUSE_CHARS)
    )
    .into()
}
