//! Event: an immutable record of something that happened.
//!
//! Events are produced when devices are detected, entities are created,
//! or entity state and attributes change.

use serde::{Deserialize, Serialize};

use crate::id::{EntityId, EventId};
use crate::time::{Timestamp, now};

/// What kind of thing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DeviceDetected,
    EntityCreated,
    StateChanged,
    AttributeChanged,
}

/// An immutable domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub entity_id: Option<EntityId>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, entity_id: Option<EntityId>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            entity_id,
            data,
            timestamp: now(),
        }
    }
}
