//! # solarhub-adapter-sunnyportal
//!
//! Exposes the energy production of SMA Sunny Portal plants as solarhub
//! sensors.
//!
//! ## How it works
//!
//! One [`SunnyPortalApi`] per account polls the portal at most once per
//! update interval and keeps the latest readings in a snapshot. Every plant
//! becomes a device, and every configured metric of a plant becomes a sensor
//! entity reading from that snapshot.
//!
//! | Metric | Entity ID | Unit |
//! |--------|-----------|------|
//! | `day_generated_energy` | `sunnyportal.<plant>_day_generated_energy` | kWh |
//! | `overall_generated_energy` | `sunnyportal.<plant>_overall_generated_energy` | kWh |
//!
//! The HTTP client is not part of this crate: hosts plug in any
//! [`PortalClient`] through the connector given to
//! [`SunnyPortalIntegration::new`].
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `solarhub-app` and `solarhub-domain`.

pub mod api;
pub mod client;
mod config;
mod error;
pub mod metric;
mod platform;
mod poller;
pub mod sensor;
pub mod snapshot;

#[cfg(test)]
mod fake;

pub use api::{PollOutcome, SunnyPortalApi};
pub use client::{Credentials, PortalClient, PortalError};
pub use config::{ConfigError, SunnyPortalConfig};
pub use error::SunnyPortalError;
pub use metric::MetricKind;
pub use platform::setup_platform;
pub use sensor::SunnyPortalSensor;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use solarhub_app::ports::{Integration, IntegrationContext};
use solarhub_domain::entity::Entity;
use solarhub_domain::error::{NotFoundError, SolarHubError};
use solarhub_domain::id::EntityId;

/// Name under which the integration, its devices and its entities are registered.
pub const INTEGRATION_NAME: &str = "sunnyportal";

/// Sunny Portal integration.
///
/// `connect` turns the configured credentials into a portal client; it is
/// called once per [`setup`](Integration::setup) attempt.
pub struct SunnyPortalIntegration<F, C> {
    config: SunnyPortalConfig,
    connect: F,
    sensors: Arc<Mutex<Vec<SunnyPortalSensor<C>>>>,
    update_handle: Option<JoinHandle<()>>,
}

impl<F, C> SunnyPortalIntegration<F, C>
where
    F: Fn(&Credentials) -> C,
{
    /// Create a new integration with the given configuration and client connector.
    #[must_use]
    pub fn new(config: SunnyPortalConfig, connect: F) -> Self {
        Self {
            config,
            connect,
            sensors: Arc::new(Mutex::new(Vec::new())),
            update_handle: None,
        }
    }
}

impl<F, C> Integration for SunnyPortalIntegration<F, C>
where
    F: Fn(&Credentials) -> C + Send + Sync,
    C: PortalClient + 'static,
{
    fn name(&self) -> &'static str {
        INTEGRATION_NAME
    }

    async fn setup(&mut self, ctx: &impl IntegrationContext) -> Result<(), SolarHubError> {
        self.config
            .validate()
            .map_err(|err| SolarHubError::Adapter(Box::new(err)))?;

        let client = (self.connect)(&self.config.credentials());
        let api = Arc::new(SunnyPortalApi::new(
            client,
            self.config.update_interval(),
            self.config.request_timeout(),
        ));

        let sensors = setup_platform(&api, &self.config.monitored_variables, ctx).await?;
        tracing::info!(
            username = %self.config.username,
            sensors = sensors.len(),
            "Sunny Portal integration ready"
        );
        *self.sensors.lock().await = sensors;
        Ok(())
    }

    async fn start_background(
        &mut self,
        ctx: impl IntegrationContext + Clone + 'static,
    ) -> Result<(), SolarHubError> {
        if let Some(handle) = self.update_handle.take() {
            handle.abort();
        }
        let interval = self.config.scan_interval();
        self.update_handle = Some(poller::SensorPoller::start(
            ctx,
            Arc::clone(&self.sensors),
            interval,
        ));
        tracing::info!(
            interval_secs = interval.as_secs(),
            "Sunny Portal update loop started"
        );
        Ok(())
    }

    async fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: &str,
        _data: serde_json::Value,
    ) -> Result<Entity, SolarHubError> {
        let sensors = self.sensors.lock().await;
        let sensor = sensors
            .iter()
            .find(|sensor| sensor.id() == entity_id)
            .ok_or_else(|| NotFoundError {
                entity: "Entity",
                id: entity_id.to_string(),
            })?;

        tracing::debug!(
            entity_id = %sensor.entity_id(),
            service,
            "service call on read-only sensor"
        );
        sensor.to_entity()
    }

    async fn teardown(&mut self) -> Result<(), SolarHubError> {
        if let Some(handle) = self.update_handle.take() {
            handle.abort();
            tracing::debug!("Sunny Portal update task aborted");
        }
        self.sensors.lock().await.clear();
        tracing::info!("Sunny Portal integration stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use solarhub_app::event_bus::InProcessEventBus;
    use solarhub_app::registry::EntityRegistry;
    use solarhub_domain::entity::{AttributeValue, EntityState};

    use super::*;
    use crate::fake::FakePortal;

    const CONFIG: &str = r#"
        username = "owner@example.com"
        password = "secret"
        monitored_variables = ["day_generated_energy", "overall_generated_energy"]
    "#;

    fn integration(
        portal: &FakePortal,
    ) -> SunnyPortalIntegration<impl Fn(&Credentials) -> FakePortal + Send + Sync, FakePortal> {
        let config = SunnyPortalConfig::from_toml_str(CONFIG).unwrap();
        let portal = portal.clone();
        SunnyPortalIntegration::new(config, move |_: &Credentials| portal.clone())
    }

    fn registry() -> EntityRegistry<InProcessEventBus> {
        EntityRegistry::new(InProcessEventBus::new(64))
    }

    #[test]
    fn should_return_sunnyportal_as_name() {
        let portal = FakePortal::default();
        assert_eq!(integration(&portal).name(), "sunnyportal");
    }

    #[tokio::test(start_paused = true)]
    async fn should_pass_configured_credentials_to_connector() {
        let config = SunnyPortalConfig::from_toml_str(CONFIG).unwrap();
        let seen = Arc::new(std::sync::Mutex::new(None));
        let recorded = Arc::clone(&seen);
        let portal = FakePortal::default().with_plant("Home", 1000.0, 2000.0);
        let mut integration = SunnyPortalIntegration::new(config, move |credentials: &Credentials| {
            *recorded.lock().unwrap() = Some(credentials.clone());
            portal.clone()
        });

        integration.setup(&registry()).await.unwrap();

        let credentials = seen.lock().unwrap().clone().unwrap();
        assert_eq!(credentials.username, "owner@example.com");
        assert_eq!(credentials.password, "secret");
    }

    #[tokio::test(start_paused = true)]
    async fn should_register_sensors_on_setup() {
        let portal = FakePortal::default().with_plant("Home", 5000.0, 123_456.0);
        let registry = registry();
        let mut integration = integration(&portal);

        integration.setup(&registry).await.unwrap();

        let entity = registry
            .find_entity("sunnyportal.home_overall_generated_energy")
            .unwrap();
        assert_eq!(entity.state, EntityState::On);
        assert_eq!(
            entity.get_attribute("value"),
            Some(&AttributeValue::Float(123.456))
        );
        assert_eq!(registry.entities().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_refuse_setup_with_zero_scan_interval() {
        let mut config = SunnyPortalConfig::from_toml_str(CONFIG).unwrap();
        config.scan_interval_secs = 0;
        let portal = FakePortal::default().with_plant("Home", 1000.0, 2000.0);
        let connector = portal.clone();
        let mut integration =
            SunnyPortalIntegration::new(config, move |_: &Credentials| connector.clone());

        let result = integration.setup(&registry()).await;

        assert!(matches!(result, Err(SolarHubError::Adapter(_))));
        assert_eq!(portal.plant_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_not_ready_without_plants() {
        let portal = FakePortal::default();
        let mut integration = integration(&portal);

        let result = integration.setup(&registry()).await;

        assert!(matches!(result, Err(SolarHubError::NotReady(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn should_answer_service_call_with_current_entity() {
        let portal = FakePortal::default().with_plant("Home", 5000.0, 123_456.0);
        let registry = registry();
        let mut integration = integration(&portal);
        integration.setup(&registry).await.unwrap();
        let stored = registry
            .find_entity("sunnyportal.home_day_generated_energy")
            .unwrap();

        let entity = integration
            .handle_service_call(stored.id, "update", serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(entity.id, stored.id);
        assert_eq!(entity.get_attribute("value"), Some(&AttributeValue::Float(5.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn should_return_not_found_for_unknown_entity() {
        let portal = FakePortal::default().with_plant("Home", 5000.0, 123_456.0);
        let mut integration = integration(&portal);
        integration.setup(&registry()).await.unwrap();

        let result = integration
            .handle_service_call(EntityId::new(), "update", serde_json::json!({}))
            .await;

        assert!(matches!(result, Err(SolarHubError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn should_refresh_entities_in_background() {
        let portal = FakePortal::default().with_plant("Home", 1000.0, 2000.0);
        let registry = registry();
        let mut integration = integration(&portal);
        integration.setup(&registry).await.unwrap();
        integration.start_background(registry.clone()).await.unwrap();

        portal.set_reading("Home", 9000.0, 10_000.0);
        tokio::time::sleep(Duration::from_secs(900 + 30)).await;

        let entity = registry
            .find_entity("sunnyportal.home_day_generated_energy")
            .unwrap();
        assert_eq!(entity.get_attribute("value"), Some(&AttributeValue::Float(9.0)));
        integration.teardown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_teardown_abort_background_task() {
        let portal = FakePortal::default().with_plant("Home", 1000.0, 2000.0);
        let registry = registry();
        let mut integration = integration(&portal);
        integration.setup(&registry).await.unwrap();
        integration.start_background(registry.clone()).await.unwrap();

        integration.teardown().await.unwrap();
        portal.set_reading("Home", 9000.0, 10_000.0);
        tokio::time::sleep(Duration::from_secs(3600)).await;

        assert!(integration.update_handle.is_none());
        assert!(integration.sensors.lock().await.is_empty());
        assert_eq!(portal.plant_calls(), 1);
    }
}
