//! Sunny Portal adapter error types.

use std::time::Duration;

use solarhub_domain::error::{NotReadyError, SolarHubError};

use crate::client::PortalError;

/// Errors specific to the Sunny Portal adapter.
#[derive(Debug, thiserror::Error)]
pub enum SunnyPortalError {
    /// A portal call failed.
    #[error("Sunny Portal {operation} failed")]
    Portal {
        /// The client operation that failed (`plants`, `last_data_exact`, `logout`).
        operation: &'static str,
        #[source]
        source: PortalError,
    },

    /// A portal call did not complete within the request timeout.
    #[error("Sunny Portal {operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The first poll found no plants; setup should be retried later.
    #[error("no plants discovered on Sunny Portal")]
    NoPlants,

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] SolarHubError),
}

impl SunnyPortalError {
    /// Whether retrying the same request later may succeed without any
    /// change on our side.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::NoPlants => true,
            Self::Portal { source, .. } => matches!(source, PortalError::Transport(_)),
            Self::Domain(_) => false,
        }
    }

    /// Convert into a [`SolarHubError`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> SolarHubError {
        match self {
            Self::Domain(err) => err,
            Self::NoPlants => NotReadyError {
                integration: crate::INTEGRATION_NAME,
            }
            .into(),
            other => SolarHubError::Adapter(Box::new(other)),
        }
    }
}

impl From<SunnyPortalError> for SolarHubError {
    fn from(err: SunnyPortalError) -> Self {
        err.into_domain()
    }
}
