//! Address observer for freshly created instances.
//!
//! The public NAT address is sometimes allocated after `create` returns. The
//! observer polls the provisioner with read-only lookups until it shows up.

use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::config::DesiredInstanceSpec;

use super::provisioner::ProvisionerClient;
use super::types::ObservedInstance;

/// Default delay between lookups.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Polls an instance until its public address is known.
#[derive(Debug)]
pub struct AddressObserver<'a, P: ProvisionerClient + ?Sized> {
    /// Provisioner used for lookups.
    provisioner: &'a P,
    /// Delay between lookups.
    interval: Duration,
}

impl<'a, P: ProvisionerClient + ?Sized> AddressObserver<'a, P> {
    /// Creates an observer with the default interval.
    #[must_use]
    pub const fn new(provisioner: &'a P) -> Self {
        Self {
            provisioner,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the delay between lookups.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Waits until the instance reports a public address or `timeout` elapses.
    ///
    /// Lookup failures are logged and polling continues. Returns the last
    /// observation carrying an address, or `None` on timeout.
    pub async fn wait_for_address(
        &self,
        spec: &DesiredInstanceSpec,
        timeout: Duration,
    ) -> Option<ObservedInstance> {
        let deadline = Instant::now() + timeout;
        info!(
            "Waiting up to {}s for a public address on {}",
            timeout.as_secs(),
            spec.name
        );

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(self.interval.min(remaining)).await;

            match self
                .provisioner
                .find(&spec.name, &spec.folder_id, &spec.zone)
                .await
            {
                Ok(Some(instance)) if instance.ip_address.is_some() => {
                    debug!("Instance {} got address after polling", spec.name);
                    return Some(instance);
                }
                Ok(Some(instance)) => {
                    debug!("Instance {} has no public address yet ({})", spec.name, instance.status);
                }
                Ok(None) => {
                    debug!("Instance {} not listed yet", spec.name);
                }
                Err(e) => {
                    warn!("Address lookup for {} failed: {e}", spec.name);
                }
            }
        }

        warn!("No public address for {} after {}s", spec.name, timeout.as_secs());
        None
    }
}
