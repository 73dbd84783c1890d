use crate::{
    devices::DeviceController,
    error::AppError,
    models::{Device, DeviceState},
    registry::DeviceRegistry,
};
use std::sync::Arc;

/// Read side of the API: the inventory and live per-device state.
#[derive(Clone)]
pub struct QueryService {
    registry: Arc<DeviceRegistry>,
    controller: Arc<dyn DeviceController>,
}

impl QueryService {
    pub fn new(registry: Arc<DeviceRegistry>, controller: Arc<dyn DeviceController>) -> Self {
        Self {
            registry,
            controller,
        }
    }

    pub fn list_devices(&self) -> Vec<Device> {
        self.registry.current_snapshot().devices.clone()
    }

    pub async fn get_device_state(&self, id: &str) -> Result<DeviceState, AppError> {
        let snapshot = self.registry.current_snapshot();
        let device = snapshot
            .devices
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::DeviceNotFound(id.to_string()))?;

        Ok(self.controller.query_state(&device.address).await?)
    }
}
