//! Polling wrapper: the single point of contact with the portal client.
//!
//! [`SunnyPortalApi`] owns the client and the current [`Snapshot`]. Every
//! sensor of the integration shares one instance, so the throttle bounds
//! portal traffic for all of them together.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use solarhub_app::throttle::Throttle;
use solarhub_domain::time::today;

use crate::client::{PortalClient, PortalError};
use crate::error::SunnyPortalError;
use crate::snapshot::{PlantEnergy, Snapshot};

/// What a call to [`SunnyPortalApi::update`] did.
#[derive(Debug)]
pub enum PollOutcome {
    /// A full pass succeeded and the snapshot was replaced.
    Refreshed { plants: usize },
    /// The last pass is too recent; nothing was fetched.
    Throttled,
    /// The pass failed; the previous snapshot is still in place.
    Failed(SunnyPortalError),
}

/// Throttled poller holding the latest plant readings.
pub struct SunnyPortalApi<C> {
    client: C,
    throttle: Throttle,
    request_timeout: Duration,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl<C: PortalClient> SunnyPortalApi<C> {
    /// Wrap `client`, polling it at most once per `update_interval` and
    /// giving up on any single call after `request_timeout`.
    pub fn new(client: C, update_interval: Duration, request_timeout: Duration) -> Self {
        Self {
            client,
            throttle: Throttle::new(update_interval),
            request_timeout,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// The readings of the last successful pass (empty before the first one).
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Refresh the snapshot unless the last pass is more recent than the
    /// update interval.
    ///
    /// Failures never propagate: they are logged and reported as
    /// [`PollOutcome::Failed`], leaving the previous snapshot untouched.
    pub async fn update(&self) -> PollOutcome {
        match self.throttle.run(|| self.fetch()).await {
            None => PollOutcome::Throttled,
            Some(Ok(snapshot)) => {
                let plants = snapshot.len();
                let snapshot = Arc::new(snapshot);
                *self
                    .snapshot
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = snapshot;
                tracing::debug!(plants, "Sunny Portal snapshot refreshed");
                PollOutcome::Refreshed { plants }
            }
            Some(Err(err)) => {
                tracing::error!(
                    error = ?err,
                    transient = err.is_transient(),
                    "failed to fetch stats from Sunny Portal"
                );
                PollOutcome::Failed(err)
            }
        }
    }

    async fn fetch(&self) -> Result<Snapshot, SunnyPortalError> {
        let date = today();
        let plants = self.call("plants", self.client.plants()).await?;

        let mut snapshot = Snapshot::default();
        for plant in plants {
            let data = self
                .call("last_data_exact", self.client.last_data_exact(&plant, date))
                .await?;
            let energy = PlantEnergy::from_day(&data.day);
            tracing::trace!(
                plant = %plant.name,
                day_energy = energy.day_energy,
                absolute_energy = energy.absolute_energy,
                "plant readings fetched"
            );
            snapshot.insert(plant.name, energy);
        }

        self.call("logout", self.client.logout()).await?;
        Ok(snapshot)
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        request: impl Future<Output = Result<T, PortalError>>,
    ) -> Result<T, SunnyPortalError> {
        tokio::time::timeout(self.request_timeout, request)
            .await
            .map_err(|_| SunnyPortalError::Timeout {
                operation,
                after: self.request_timeout,
            })?
            .map_err(|source| SunnyPortalError::Portal { operation, source })
    }
}
