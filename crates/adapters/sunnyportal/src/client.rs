//! Portal client port: the slice of a Sunny Portal client this integration uses.
//!
//! The wire protocol belongs to the client implementation; the integration
//! only lists plants, reads one day of data per plant and logs out.

use std::fmt;
use std::future::Future;

use chrono::NaiveDate;

/// Login material for a Sunny Portal account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A solar installation registered on the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plant {
    pub name: String,
}

impl Plant {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Energy counters for one period, in watt-hours.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyCounter {
    /// Energy generated during the period.
    pub difference: f64,
    /// Meter reading at the end of the period.
    pub absolute: f64,
}

/// Exact last data of a plant for a requested date.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LastData {
    pub day: EnergyCounter,
}

/// Failures reported by a portal client.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// The request never produced a response.
    #[error("request to Sunny Portal failed")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The portal refused the credentials or the session expired.
    #[error("Sunny Portal rejected the credentials")]
    Authentication,

    /// The portal answered with something the client could not interpret.
    #[error("unexpected Sunny Portal response: {0}")]
    MalformedResponse(String),
}

/// A session against Sunny Portal.
///
/// Implementations handle login lazily; [`logout`](Self::logout) ends the
/// session and the next call logs in again.
pub trait PortalClient: Send + Sync {
    /// List every plant visible to the account.
    fn plants(&self) -> impl Future<Output = Result<Vec<Plant>, PortalError>> + Send;

    /// Read the exact day counters of `plant` for `date`.
    fn last_data_exact(
        &self,
        plant: &Plant,
        date: NaiveDate,
    ) -> impl Future<Output = Result<LastData, PortalError>> + Send;

    /// End the current session.
    fn logout(&self) -> impl Future<Output = Result<(), PortalError>> + Send;
}
