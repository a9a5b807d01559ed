//! Platform setup: first poll, then one device per plant and one sensor per
//! configured metric.

use std::sync::Arc;

use solarhub_app::ports::IntegrationContext;
use solarhub_domain::device::Device;
use solarhub_domain::error::SolarHubError;

use crate::api::SunnyPortalApi;
use crate::client::PortalClient;
use crate::error::SunnyPortalError;
use crate::metric::MetricKind;
use crate::sensor::{SunnyPortalSensor, plant_object_ids};

const MANUFACTURER: &str = "SMA";
const MODEL: &str = "Sunny Portal plant";

fn plant_device(plant_name: &str, object_id: &str) -> Result<Device, SolarHubError> {
    Device::builder()
        .name(plant_name)
        .manufacturer(MANUFACTURER)
        .model(MODEL)
        .integration(crate::INTEGRATION_NAME)
        .unique_id(object_id)
        .build()
}

/// Poll once and register a sensor for every (plant, metric) pair.
///
/// Sensors are returned in plant-name order, metrics in configured order.
///
/// # Errors
///
/// Returns [`SolarHubError::NotReady`] when the first poll yields no plant
/// (portal unreachable, bad credentials, or an account without plants), so
/// the host can retry later. Registration failures are propagated as is.
pub async fn setup_platform<C: PortalClient>(
    api: &Arc<SunnyPortalApi<C>>,
    monitored: &[MetricKind],
    ctx: &impl IntegrationContext,
) -> Result<Vec<SunnyPortalSensor<C>>, SolarHubError> {
    api.update().await;

    let snapshot = api.snapshot();
    if snapshot.is_empty() {
        return Err(SunnyPortalError::NoPlants.into());
    }

    let mut sensors = Vec::with_capacity(snapshot.len() * monitored.len());
    for (plant_name, object_id) in plant_object_ids(snapshot.plant_names()) {
        tracing::info!(plant = %plant_name, %object_id, "discovered Sunny Portal plant");
        let device = ctx
            .upsert_device(plant_device(plant_name, &object_id)?)
            .await?;

        for &metric in monitored {
            let mut sensor =
                SunnyPortalSensor::new(Arc::clone(api), device.id, plant_name, &object_id, metric);
            sensor.read_snapshot();
            let entity = ctx.upsert_entity(sensor.to_entity()?).await?;
            sensor.id = entity.id;
            sensors.push(sensor);
        }
    }

    tracing::info!(sensors = sensors.len(), "Sunny Portal sensors registered");
    Ok(sensors)
}
