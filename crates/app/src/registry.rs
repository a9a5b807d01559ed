//! In-memory entity registry: the host side of [`IntegrationContext`].
//!
//! Integrations register their devices and entities here. Upserts preserve
//! the ids assigned at first registration, so an integration that is set up
//! again (after a restart or a not-ready retry) keeps stable identities.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use solarhub_domain::device::Device;
use solarhub_domain::entity::Entity;
use solarhub_domain::error::SolarHubError;
use solarhub_domain::event::{Event, EventType};
use solarhub_domain::id::{DeviceId, EntityId};
use solarhub_domain::time::now;

use crate::ports::{EventPublisher, IntegrationContext};

#[derive(Default)]
struct Registry {
    devices: HashMap<DeviceId, Device>,
    entities: HashMap<EntityId, Entity>,
}

/// [`IntegrationContext`] backed by in-memory maps and an [`EventPublisher`].
///
/// Cheap to clone; clones share the same maps.
pub struct EntityRegistry<EP> {
    inner: Arc<Mutex<Registry>>,
    publisher: EP,
}

impl<EP> EntityRegistry<EP> {
    /// Create an empty registry publishing through `publisher`.
    pub fn new(publisher: EP) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry::default())),
            publisher,
        }
    }

    /// All registered devices.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.lock().devices.values().cloned().collect()
    }

    /// All registered entities.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.lock().entities.values().cloned().collect()
    }

    /// Look up an entity by its `<domain>.<object_id>` identifier.
    #[must_use]
    pub fn find_entity(&self, entity_id: &str) -> Option<Entity> {
        self.lock()
            .entities
            .values()
            .find(|entity| entity.entity_id == entity_id)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<EP: Clone> Clone for EntityRegistry<EP> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            publisher: self.publisher.clone(),
        }
    }
}

impl<EP> IntegrationContext for EntityRegistry<EP>
where
    EP: EventPublisher + Send + Sync,
{
    async fn upsert_device(&self, mut device: Device) -> Result<Device, SolarHubError> {
        device.validate()?;

        let created = {
            let mut registry = self.lock();
            let existing = registry
                .devices
                .values()
                .find(|known| {
                    known.integration == device.integration && known.unique_id == device.unique_id
                })
                .map(|known| known.id);
            if let Some(id) = existing {
                device.id = id;
            }
            registry.devices.insert(device.id, device.clone());
            existing.is_none()
        };

        if created {
            tracing::debug!(
                device = %device.name,
                integration = %device.integration,
                "device registered"
            );
            self.publisher
                .publish(Event::new(
                    EventType::DeviceDetected,
                    None,
                    serde_json::json!({
                        "device_id": device.id.to_string(),
                        "name": device.name,
                        "integration": device.integration,
                    }),
                ))
                .await?;
        }

        Ok(device)
    }

    async fn upsert_entity(&self, entity: Entity) -> Result<Entity, SolarHubError> {
        entity.validate()?;
        let ts = now();

        let (stored, events) = {
            let mut registry = self.lock();
            let previous = registry
                .entities
                .values()
                .find(|known| known.entity_id == entity.entity_id)
                .cloned();

            let mut events = Vec::new();
            let stored = match previous {
                None => {
                    let mut created = entity;
                    created.last_changed = ts;
                    created.last_updated = ts;
                    events.push(Event::new(
                        EventType::EntityCreated,
                        Some(created.id),
                        serde_json::json!({ "entity_id": created.entity_id }),
                    ));
                    created
                }
                Some(mut stored) => {
                    let from = stored.state.clone();
                    let attributes_changed = stored.attributes != entity.attributes;

                    stored.device_id = entity.device_id;
                    stored.friendly_name = entity.friendly_name;
                    stored.attributes = entity.attributes;
                    stored.update_state(entity.state, ts);

                    if stored.state != from {
                        events.push(Event::new(
                            EventType::StateChanged,
                            Some(stored.id),
                            serde_json::json!({
                                "from": from.to_string(),
                                "to": stored.state.to_string(),
                            }),
                        ));
                    }
                    if attributes_changed {
                        events.push(Event::new(
                            EventType::AttributeChanged,
                            Some(stored.id),
                            serde_json::json!({ "attributes": stored.attributes }),
                        ));
                    }
                    stored
                }
            };
            registry.entities.insert(stored.id, stored.clone());
            (stored, events)
        };

        for event in events {
            self.publisher.publish(event).await?;
        }
        Ok(stored)
    }
}
