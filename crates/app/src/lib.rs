//! # solarhub-app
//!
//! Application layer: **port definitions** (traits) and the in-process host
//! helpers integrations rely on.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement or call:
//!   - `Integration`: lifecycle of a device integration
//!   - `IntegrationContext`: the entity registration callback
//!   - `EventPublisher`: publish domain events
//! - Provide **in-process infrastructure** that doesn't need IO:
//!   - `InProcessEventBus`: broadcast of domain events
//!   - `EntityRegistry`: in-memory `IntegrationContext`
//!   - `Throttle`: at-most-once-per-interval execution
//!   - `setup_with_retry`: re-run integration setup while it is not ready
//!
//! ## Dependency rule
//! Depends on `solarhub-domain` only (plus `tokio::sync`/`tokio::time`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod registry;
pub mod setup;
pub mod throttle;
