//! Cloud instance reconciler.
//!
//! Reconciles *existence* only. An instance whose name already exists in the
//! folder is reported unchanged, whatever its cores, memory, disk or other
//! settings: those fields are applied when the instance is created and never
//! compared or corrected afterwards.

use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{DesiredInstanceSpec, InputValidator};
use crate::error::Result;
use crate::planner::{DiffEngine, ExecutionMode, Phase, PhaseTracker, PlannedAction, ReconcilePlan};
use crate::yc::{AddressObserver, ObservedInstance, ProvisionerClient};

use super::{InstanceFields, ReconcileResult};

/// Reconciler for a single cloud instance.
pub struct InstanceReconciler<'a, P: ProvisionerClient + ?Sized> {
    /// Provisioner capability.
    provisioner: &'a P,
    /// Input validator.
    validator: InputValidator,
    /// Diff engine.
    diff_engine: DiffEngine,
    /// How long to poll for a public address after creation.
    address_wait: Duration,
    /// Delay between address lookups, when overriding the observer's default.
    poll_interval: Option<Duration>,
}

impl<'a, P: ProvisionerClient + ?Sized> InstanceReconciler<'a, P> {
    /// Creates a new instance reconciler. Address polling is disabled.
    #[must_use]
    pub const fn new(provisioner: &'a P) -> Self {
        Self {
            provisioner,
            validator: InputValidator::new(),
            diff_engine: DiffEngine::new(),
            address_wait: Duration::ZERO,
            poll_interval: None,
        }
    }

    /// Polls up to `wait` for a public address when create returned none.
    #[must_use]
    pub const fn with_address_wait(mut self, wait: Duration) -> Self {
        self.address_wait = wait;
        self
    }

    /// Sets the delay between address lookups.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Ensures an instance named `spec.name` exists.
    ///
    /// In check mode the provisioner is only queried. Otherwise a missing
    /// instance is created with exactly one create call.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec is invalid, the lookup fails, or the
    /// creation fails.
    pub async fn reconcile(
        &self,
        spec: &DesiredInstanceSpec,
        mode: ExecutionMode,
    ) -> Result<ReconcileResult<InstanceFields>> {
        let validation = self.validator.validate_instance(spec)?;
        for warning in &validation.warnings {
            warn!("{}: {warning}", spec.name);
        }

        let mut tracker = PhaseTracker::new(spec.name.as_str());
        tracker.advance(Phase::Probing)?;

        let current = self
            .provisioner
            .find(&spec.name, &spec.folder_id, &spec.zone)
            .await?;

        let diff = self.diff_engine.instance_diff(spec, current.as_ref());
        let plan = ReconcilePlan::from_diff(diff, mode);
        tracker.advance(plan.phase_after_probe())?;

        let observed = match plan.action {
            PlannedAction::Noop => {
                if let Some(instance) = &current {
                    info!("Instance already exists: {} (ID: {})", instance.name, instance.id);
                }
                current
            }
            PlannedAction::Report => {
                tracker.advance(Phase::CheckReported)?;
                info!("Would create instance: {}", spec.name);
                None
            }
            PlannedAction::Apply => {
                tracker.advance(Phase::Applying)?;
                match self.provisioner.create(spec).await {
                    Ok(created) => {
                        tracker.advance(Phase::Applied)?;
                        Some(self.complete_address(spec, created).await)
                    }
                    Err(e) => {
                        tracker.advance(Phase::Failed)?;
                        error!("Failed to create instance {}: {e}", spec.name);
                        return Err(e);
                    }
                }
            }
        };

        Ok(ReconcileResult {
            changed: plan.diff.has_changes(),
            diff: plan.diff.diff,
            resource: Self::fields(spec, observed),
            phase: tracker.phase(),
        })
    }

    /// Fills a missing public address by polling, when enabled.
    async fn complete_address(
        &self,
        spec: &DesiredInstanceSpec,
        created: ObservedInstance,
    ) -> ObservedInstance {
        if created.ip_address.is_some() || !spec.nat {
            return created;
        }

        warn!("Create output for {} carries no public address", spec.name);
        if self.address_wait.is_zero() {
            debug!("Address polling disabled");
            return created;
        }

        let mut observer = AddressObserver::new(self.provisioner);
        if let Some(interval) = self.poll_interval {
            observer = observer.with_interval(interval);
        }

        observer
            .wait_for_address(spec, self.address_wait)
            .await
            .unwrap_or(created)
    }

    fn fields(spec: &DesiredInstanceSpec, observed: Option<ObservedInstance>) -> InstanceFields {
        match observed {
            Some(instance) => InstanceFields {
                name: spec.name.clone(),
                id: Some(instance.id),
                ip_address: instance.ip_address,
                internal_ip: instance.internal_ip,
                status: Some(instance.status),
            },
            None => InstanceFields {
                name: spec.name.clone(),
                id: None,
                ip_address: None,
                internal_ip: None,
                status: None,
            },
        }
    }
}
