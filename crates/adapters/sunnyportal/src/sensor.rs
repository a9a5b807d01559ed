//! Sensor entity: one per (plant, metric) pair.

use std::collections::HashSet;
use std::sync::Arc;

use solarhub_domain::entity::{AttributeValue, Entity, EntityState};
use solarhub_domain::error::SolarHubError;
use solarhub_domain::id::{DeviceId, EntityId};

use crate::api::SunnyPortalApi;
use crate::client::PortalClient;
use crate::metric::MetricKind;

/// Lower-case `name`, collapsing every run of non-alphanumerics into `_`.
pub(crate) fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Assign every plant a distinct object id.
///
/// The id is the plant's slug (`plant` when the name has no alphanumeric
/// character). A slug already taken by an earlier plant gets the first free
/// `_2`, `_3`, ... suffix, so plants whose names only differ in case or
/// punctuation still get their own device and sensors.
pub(crate) fn plant_object_ids<'a>(
    plant_names: impl IntoIterator<Item = &'a str>,
) -> Vec<(&'a str, String)> {
    let mut taken = HashSet::new();
    plant_names
        .into_iter()
        .map(|plant_name| {
            let slug = slugify(plant_name);
            let base = if slug.is_empty() { "plant".to_string() } else { slug };
            let mut object_id = base.clone();
            let mut suffix = 2;
            while !taken.insert(object_id.clone()) {
                object_id = format!("{base}_{suffix}");
                suffix += 1;
            }
            if object_id != base {
                tracing::warn!(
                    plant = %plant_name,
                    %object_id,
                    "plant name collides with another plant, using suffixed id"
                );
            }
            (plant_name, object_id)
        })
        .collect()
}

/// Build the `sunnyportal.<object_id>_<metric>` entity id.
pub(crate) fn entity_id_for(object_id: &str, metric: MetricKind) -> String {
    format!("{}.{object_id}_{}", crate::INTEGRATION_NAME, metric.id())
}

/// Exposes one metric of one plant, read from the shared snapshot.
///
/// The sensor has a value once a successful poll covered its plant, and
/// loses it again if the plant disappears from a later poll.
pub struct SunnyPortalSensor<C> {
    api: Arc<SunnyPortalApi<C>>,
    pub(crate) id: EntityId,
    pub(crate) device_id: DeviceId,
    plant_name: String,
    metric: MetricKind,
    entity_id: String,
    unit: Option<String>,
    value: Option<f64>,
}

impl<C: PortalClient> SunnyPortalSensor<C> {
    /// Create the sensor for `metric` of the plant registered under
    /// `object_id`.
    pub fn new(
        api: Arc<SunnyPortalApi<C>>,
        device_id: DeviceId,
        plant_name: impl Into<String>,
        object_id: &str,
        metric: MetricKind,
    ) -> Self {
        let plant_name = plant_name.into();
        Self {
            entity_id: entity_id_for(object_id, metric),
            api,
            id: EntityId::new(),
            device_id,
            plant_name,
            metric,
            unit: None,
            value: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    #[must_use]
    pub fn plant_name(&self) -> &str {
        &self.plant_name
    }

    #[must_use]
    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.metric.display_name()
    }

    #[must_use]
    pub fn icon(&self) -> &'static str {
        self.metric.icon()
    }

    #[must_use]
    pub fn unit_of_measurement(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Current reading, `None` until a poll covered this plant.
    #[must_use]
    pub fn state(&self) -> Option<f64> {
        self.value
    }

    /// Let the shared poller refresh (throttled), then read this sensor's slot.
    pub async fn update(&mut self) {
        self.api.update().await;
        self.read_snapshot();
    }

    pub(crate) fn api(&self) -> &Arc<SunnyPortalApi<C>> {
        &self.api
    }

    /// Copy this sensor's reading out of the current snapshot.
    pub(crate) fn read_snapshot(&mut self) {
        let snapshot = self.api.snapshot();
        if let Some(energy) = snapshot.get(&self.plant_name) {
            self.value = Some(energy.value(self.metric));
            self.unit = Some(energy.unit.clone());
        } else {
            if self.value.is_some() {
                tracing::debug!(
                    plant = %self.plant_name,
                    entity_id = %self.entity_id,
                    "plant missing from Sunny Portal snapshot, clearing reading"
                );
            }
            self.value = None;
            self.unit = None;
        }
    }

    /// Project the sensor onto a host [`Entity`].
    ///
    /// # Errors
    ///
    /// Returns a validation error if the entity cannot be built.
    pub fn to_entity(&self) -> Result<Entity, SolarHubError> {
        let mut builder = Entity::builder()
            .id(self.id)
            .device_id(self.device_id)
            .entity_id(&self.entity_id)
            .friendly_name(self.name())
            .attribute("icon", AttributeValue::String(self.icon().to_string()))
            .attribute("plant", AttributeValue::String(self.plant_name.clone()))
            .attribute("metric", AttributeValue::String(self.metric.id().to_string()));

        builder = match self.value {
            Some(value) => builder
                .state(EntityState::On)
                .attribute("value", AttributeValue::Float(value)),
            None => builder.state(EntityState::Unknown),
        };
        if let Some(unit) = &self.unit {
            builder = builder.attribute("unit", AttributeValue::String(unit.clone()));
        }

        builder.build()
    }
}
