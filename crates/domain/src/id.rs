//! Random identifiers for devices, entities and events.
//!
//! Ids are assigned when a value is first built and kept by the registry on
//! every later upsert; the human-readable `entity_id` string is separate.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// A fresh random (v4) id.
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }
    };
}

uuid_id!(
    /// Identity of a registered [`Device`](crate::device::Device).
    DeviceId
);

uuid_id!(
    /// Identity of a registered [`Entity`](crate::entity::Entity).
    EntityId
);

uuid_id!(
    /// Identity of an [`Event`](crate::event::Event).
    EventId
);
