//! Background refresh loop.

use std::sync::Arc;
use std::time::Duration;

use solarhub_app::ports::IntegrationContext;
use solarhub_domain::error::SolarHubError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::client::PortalClient;
use crate::sensor::SunnyPortalSensor;

/// Periodically refreshes every sensor and pushes its state to the host.
///
/// Each tick runs one throttled poll through the shared API, then copies the
/// snapshot into every sensor. The sensor list is not locked while the portal
/// is being polled.
pub(crate) struct SensorPoller<C, X> {
    context: X,
    sensors: Arc<Mutex<Vec<SunnyPortalSensor<C>>>>,
    interval: Duration,
}

impl<C, X> SensorPoller<C, X>
where
    C: PortalClient + 'static,
    X: IntegrationContext + Clone + 'static,
{
    pub(crate) fn start(
        context: X,
        sensors: Arc<Mutex<Vec<SunnyPortalSensor<C>>>>,
        interval: Duration,
    ) -> JoinHandle<()> {
        let poller = Self {
            context,
            sensors,
            interval,
        };
        tokio::spawn(poller.run())
    }

    async fn run(self) {
        loop {
            tokio::time::sleep(self.interval).await;
            self.iterate().await;
        }
    }

    async fn iterate(&self) {
        let api = {
            let sensors = self.sensors.lock().await;
            match sensors.first() {
                Some(sensor) => Arc::clone(sensor.api()),
                None => return,
            }
        };
        api.update().await;

        let mut sensors = self.sensors.lock().await;
        for sensor in sensors.iter_mut() {
            sensor.read_snapshot();
            if let Err(err) = self.push(sensor).await {
                tracing::warn!(
                    entity_id = %sensor.entity_id(),
                    %err,
                    "failed to push Sunny Portal sensor state, retrying next interval"
                );
            }
        }
    }

    async fn push(&self, sensor: &mut SunnyPortalSensor<C>) -> Result<(), SolarHubError> {
        let entity = self.context.upsert_entity(sensor.to_entity()?).await?;
        sensor.id = entity.id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use solarhub_app::event_bus::InProcessEventBus;
    use solarhub_app::registry::EntityRegistry;
    use solarhub_domain::device::Device;
    use solarhub_domain::entity::{AttributeValue, Entity, EntityState};
    use solarhub_domain::error::ValidationError;

    use super::*;
    use crate::api::SunnyPortalApi;
    use crate::fake::FakePortal;
    use crate::metric::MetricKind;
    use crate::platform::setup_platform;

    const UPDATE_INTERVAL: Duration = Duration::from_secs(900);
    const SCAN_INTERVAL: Duration = Duration::from_secs(30);

    async fn started(
        portal: &FakePortal,
        registry: &EntityRegistry<InProcessEventBus>,
    ) -> JoinHandle<()> {
        let api = Arc::new(SunnyPortalApi::new(
            portal.clone(),
            UPDATE_INTERVAL,
            Duration::from_secs(30),
        ));
        let sensors = setup_platform(&api, &[MetricKind::DayGeneratedEnergy], registry)
            .await
            .unwrap();
        SensorPoller::start(
            registry.clone(),
            Arc::new(Mutex::new(sensors)),
            SCAN_INTERVAL,
        )
    }

    /// Registry that refuses to store one entity.
    #[derive(Clone)]
    struct RefusingContext {
        registry: EntityRegistry<InProcessEventBus>,
        refused: &'static str,
    }

    impl IntegrationContext for RefusingContext {
        async fn upsert_device(&self, device: Device) -> Result<Device, SolarHubError> {
            self.registry.upsert_device(device).await
        }

        async fn upsert_entity(&self, entity: Entity) -> Result<Entity, SolarHubError> {
            if entity.entity_id == self.refused {
                return Err(ValidationError::MalformedEntityId(entity.entity_id).into());
            }
            self.registry.upsert_entity(entity).await
        }
    }

    fn day_value(registry: &EntityRegistry<InProcessEventBus>) -> Option<AttributeValue> {
        registry
            .find_entity("sunnyportal.home_day_generated_energy")
            .and_then(|entity| entity.get_attribute("value").cloned())
    }

    #[tokio::test(start_paused = true)]
    async fn should_push_fresh_reading_after_update_interval() {
        let portal = FakePortal::default().with_plant("Home", 1000.0, 2000.0);
        let registry = EntityRegistry::new(InProcessEventBus::new(64));
        let handle = started(&portal, &registry).await;

        portal.set_reading("Home", 7000.0, 8000.0);
        tokio::time::sleep(UPDATE_INTERVAL + SCAN_INTERVAL).await;

        assert_eq!(day_value(&registry), Some(AttributeValue::Float(7.0)));
        assert_eq!(portal.plant_calls(), 2);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_hit_portal_on_every_tick() {
        let portal = FakePortal::default().with_plant("Home", 1000.0, 2000.0);
        let registry = EntityRegistry::new(InProcessEventBus::new(64));
        let handle = started(&portal, &registry).await;

        portal.set_reading("Home", 7000.0, 8000.0);
        tokio::time::sleep(SCAN_INTERVAL * 5).await;

        assert_eq!(day_value(&registry), Some(AttributeValue::Float(1.0)));
        assert_eq!(portal.plant_calls(), 1);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn should_mark_sensor_unknown_when_plant_disappears() {
        let portal = FakePortal::default().with_plant("Home", 1000.0, 2000.0);
        let registry = EntityRegistry::new(InProcessEventBus::new(64));
        let handle = started(&portal, &registry).await;

        portal.remove_plant("Home");
        tokio::time::sleep(UPDATE_INTERVAL + SCAN_INTERVAL).await;

        let entity = registry
            .find_entity("sunnyportal.home_day_generated_energy")
            .unwrap();
        assert_eq!(entity.state, EntityState::Unknown);
        assert!(entity.get_attribute("value").is_none());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_pushing_other_sensors_when_one_is_refused() {
        let portal = FakePortal::default()
            .with_plant("Garage", 1000.0, 2000.0)
            .with_plant("Home", 1000.0, 2000.0);
        let registry = EntityRegistry::new(InProcessEventBus::new(64));
        let api = Arc::new(SunnyPortalApi::new(
            portal.clone(),
            UPDATE_INTERVAL,
            Duration::from_secs(30),
        ));
        let sensors = setup_platform(&api, &[MetricKind::DayGeneratedEnergy], &registry)
            .await
            .unwrap();
        let context = RefusingContext {
            registry: registry.clone(),
            refused: "sunnyportal.garage_day_generated_energy",
        };
        let handle = SensorPoller::start(context, Arc::new(Mutex::new(sensors)), SCAN_INTERVAL);

        portal.set_reading("Garage", 5000.0, 6000.0);
        portal.set_reading("Home", 7000.0, 8000.0);
        tokio::time::sleep(UPDATE_INTERVAL + SCAN_INTERVAL).await;

        assert_eq!(day_value(&registry), Some(AttributeValue::Float(7.0)));
        let garage = registry
            .find_entity("sunnyportal.garage_day_generated_energy")
            .unwrap();
        assert_eq!(garage.get_attribute("value"), Some(&AttributeValue::Float(1.0)));
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn should_release_sensors_while_portal_is_polled() {
        let portal = FakePortal::default().with_plant("Home", 1000.0, 2000.0);
        let registry = EntityRegistry::new(InProcessEventBus::new(64));
        let api = Arc::new(SunnyPortalApi::new(
            portal.clone(),
            UPDATE_INTERVAL,
            Duration::from_secs(30),
        ));
        let sensors = setup_platform(&api, &[MetricKind::DayGeneratedEnergy], &registry)
            .await
            .unwrap();
        let sensors = Arc::new(Mutex::new(sensors));
        let handle = SensorPoller::start(registry.clone(), Arc::clone(&sensors), SCAN_INTERVAL);

        portal.hang();
        tokio::time::sleep(UPDATE_INTERVAL + Duration::from_secs(5)).await;

        assert_eq!(portal.plant_calls(), 2);
        assert!(sensors.try_lock().is_ok());
        handle.abort();
    }
}
