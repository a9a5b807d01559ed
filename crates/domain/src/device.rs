//! Device: a physical or virtual thing that exposes one or more entities.

use serde::{Deserialize, Serialize};

use crate::error::{SolarHubError, ValidationError};
use crate::id::DeviceId;

/// A physical or logical device, such as a solar plant.
///
/// Devices are identified across restarts by the `(integration, unique_id)`
/// pair; `id` is only stable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub integration: String,
    pub unique_id: String,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SolarHubError::Validation`] when `name` or `integration` is empty.
    pub fn validate(&self) -> Result<(), SolarHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.integration.is_empty() {
            return Err(ValidationError::EmptyIntegration.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    manufacturer: Option<String>,
    model: Option<String>,
    integration: Option<String>,
    unique_id: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn integration(mut self, integration: impl Into<String>) -> Self {
        self.integration = Some(integration.into());
        self
    }

    #[must_use]
    pub fn unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// When no `unique_id` is given the device name is used.
    ///
    /// # Errors
    ///
    /// Returns [`SolarHubError::Validation`] if `name` or `integration` is missing.
    pub fn build(self) -> Result<Device, SolarHubError> {
        let name = self.name.unwrap_or_default();
        let device = Device {
            id: self.id.unwrap_or_default(),
            unique_id: self.unique_id.unwrap_or_else(|| name.clone()),
            name,
            manufacturer: self.manufacturer,
            model: self.model,
            integration: self.integration.unwrap_or_default(),
        };
        device.validate()?;
        Ok(device)
    }
}
