//! Broadcast of registry events to in-process listeners.

use std::future::Future;

use tokio::sync::broadcast;

use solarhub_domain::error::SolarHubError;
use solarhub_domain::event::Event;

use crate::ports::EventPublisher;

/// [`EventPublisher`] over a tokio [`broadcast`] channel.
///
/// Listeners that subscribe late miss earlier events, and a listener that
/// falls more than `capacity` events behind skips the oldest ones. Publishing
/// never fails, with or without listeners.
#[derive(Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), SolarHubError>> + Send {
        let event_type = event.event_type;
        let listeners = self.sender.send(event).unwrap_or(0);
        tracing::trace!(?event_type, listeners, "event published");
        async { Ok(()) }
    }
}
