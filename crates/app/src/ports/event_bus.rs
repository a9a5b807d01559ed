//! Outbound port for registry events.

use std::future::Future;

use solarhub_domain::error::SolarHubError;
use solarhub_domain::event::Event;

/// Sink for the events the registry emits on every change.
pub trait EventPublisher {
    /// Hand `event` to whoever is listening right now.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), SolarHubError>> + Send;
}
