//! Integration port.
//!
//! An integration connects one external data source (such as a solar
//! monitoring portal) to the host. It registers the devices and entities it
//! finds during setup, refreshes them from a background task and answers
//! service calls for its own entities.

use std::future::Future;

use solarhub_domain::device::Device;
use solarhub_domain::entity::Entity;
use solarhub_domain::error::SolarHubError;
use solarhub_domain::id::EntityId;

/// Host-side registration surface handed to integrations.
///
/// [`EntityRegistry`](crate::registry::EntityRegistry) is the in-process
/// implementation.
pub trait IntegrationContext: Send + Sync {
    /// Register `device`, or refresh the one already known under the same
    /// `(integration, unique_id)`. The stored device keeps its first id.
    fn upsert_device(
        &self,
        device: Device,
    ) -> impl Future<Output = Result<Device, SolarHubError>> + Send;

    /// Register `entity`, or refresh the one already known under the same
    /// `entity_id` string. The stored entity keeps its first id.
    ///
    /// Publishes `EntityCreated` on first registration, then `StateChanged`
    /// and `AttributeChanged` for whatever differs from the stored copy.
    fn upsert_entity(
        &self,
        entity: Entity,
    ) -> impl Future<Output = Result<Entity, SolarHubError>> + Send;
}

/// Lifecycle of an integration as driven by the host.
///
/// The host calls [`setup`](Self::setup) until it stops returning
/// [`SolarHubError::NotReady`], then [`start_background`](Self::start_background)
/// once. [`handle_service_call`](Self::handle_service_call) may be called at
/// any point after setup, and [`teardown`](Self::teardown) ends the lifecycle.
pub trait Integration {
    /// Name the integration's devices and entities are registered under.
    fn name(&self) -> &'static str;

    /// Connect to the data source and register what it exposes through `ctx`.
    ///
    /// Return [`SolarHubError::NotReady`] when the source has nothing to offer
    /// yet; any other error is final.
    fn setup(
        &mut self,
        ctx: &impl IntegrationContext,
    ) -> impl Future<Output = Result<(), SolarHubError>> + Send;

    /// Spawn the refresh task, which pushes updates through `ctx`.
    ///
    /// Integrations without background work keep this no-op.
    fn start_background(
        &mut self,
        _ctx: impl IntegrationContext + Clone + 'static,
    ) -> impl Future<Output = Result<(), SolarHubError>> + Send {
        async { Ok(()) }
    }

    /// Run `service` against one of this integration's entities and return
    /// the entity as it stands afterwards.
    fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: &str,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<Entity, SolarHubError>> + Send;

    /// Stop background work and forget registered state.
    fn teardown(&mut self) -> impl Future<Output = Result<(), SolarHubError>> + Send;
}
