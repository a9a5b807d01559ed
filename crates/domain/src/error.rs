//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SolarHubError`] at port boundaries.

/// Top-level error crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum SolarHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An integration could not complete setup yet; the host may retry.
    #[error("integration not ready")]
    NotReady(#[from] NotReadyError),

    /// Failure raised inside an adapter (network, protocol, …).
    #[error("adapter error")]
    Adapter(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("entity_id must not be empty")]
    EmptyEntityId,

    #[error("entity_id {0:?} must have the form <domain>.<object_id>")]
    MalformedEntityId(String),

    #[error("integration must not be empty")]
    EmptyIntegration,
}

/// A lookup did not match anything.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Raised by an integration whose backing service has nothing to offer yet.
#[derive(Debug, thiserror::Error)]
#[error("integration {integration} is not ready")]
pub struct NotReadyError {
    pub integration: &'static str,
}
