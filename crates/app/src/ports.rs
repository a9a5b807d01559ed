//! Traits shared by the host and the integration adapters.

pub mod event_bus;
pub mod integration;

pub use event_bus::EventPublisher;
pub use integration::{Integration, IntegrationContext};
