// commands/mod.rs
//! Fan-out of one command to many devices.
//!
//! Every targeted device gets its own spawned task. The dispatcher waits for
//! all of them and reports each outcome; one unreachable light never hides
//! the result of the others.

use crate::{
    devices::{ControlError, ControlOptions, DeviceController},
    error::AppError,
    models::{Device, Rgb},
};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SetColor { color: Rgb, brightness: u8 },
    SetPower { on: bool },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetColor { .. } => "set_color",
            Action::SetPower { .. } => "set_power",
        }
    }

    async fn execute(
        self,
        controller: &dyn DeviceController,
        address: &str,
    ) -> Result<(), ControlError> {
        // Delivery only; the light's own acknowledgement is not awaited.
        let options = ControlOptions::fire_and_forget();
        match self {
            Action::SetColor { color, brightness } => {
                controller
                    .set_color_with_brightness(address, color, brightness, options)
                    .await
            }
            Action::SetPower { on } => controller.set_power(address, on, options).await,
        }
    }
}

#[derive(Debug)]
pub struct CommandOutcome {
    pub device: Device,
    pub result: Result<(), ControlError>,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceFailure {
    pub device_id: String,
    pub address: String,
    pub error: String,
}

/// Body returned when every targeted device accepted the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DispatchReport {
    pub devices: Vec<String>,
}

/// Outcomes in the same order as the devices that were targeted.
#[derive(Debug, Default)]
pub struct AggregatedResult {
    pub outcomes: Vec<CommandOutcome>,
}

impl AggregatedResult {
    /// True when every outcome succeeded, including when there were none.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(CommandOutcome::is_success)
    }

    pub fn failures(&self) -> Vec<DeviceFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Ok(()) => None,
                Err(e) => Some(DeviceFailure {
                    device_id: o.device.id.clone(),
                    address: o.device.address.clone(),
                    error: e.to_string(),
                }),
            })
            .collect()
    }

    pub fn into_result(self) -> Result<DispatchReport, AppError> {
        if self.is_success() {
            return Ok(DispatchReport {
                devices: self.outcomes.into_iter().map(|o| o.device.id).collect(),
            });
        }

        let failures = self.failures();
        let attempted = self.outcomes.len();
        if failures.len() == attempted {
            Err(AppError::DispatchTotalFailure {
                attempted,
                failures,
            })
        } else {
            Err(AppError::DispatchPartialFailure {
                attempted,
                failures,
            })
        }
    }
}

#[derive(Clone)]
pub struct CommandDispatcher {
    controller: Arc<dyn DeviceController>,
}

impl CommandDispatcher {
    pub fn new(controller: Arc<dyn DeviceController>) -> Self {
        Self { controller }
    }

    /// Sends `action` to every device concurrently and waits for all of them.
    ///
    /// The per-device tasks are detached from the caller: dropping the
    /// returned future does not cancel commands already in flight.
    pub async fn dispatch<'a, I>(&self, devices: I, action: Action) -> AggregatedResult
    where
        I: IntoIterator<Item = &'a Device>,
    {
        let request_id = Uuid::new_v4();

        let (devices, tasks): (Vec<Device>, Vec<JoinHandle<Result<(), ControlError>>>) = devices
            .into_iter()
            .map(|device| {
                let controller = Arc::clone(&self.controller);
                let address = device.address.clone();
                let task =
                    tokio::spawn(async move { action.execute(controller.as_ref(), &address).await });
                (device.clone(), task)
            })
            .unzip();

        let outcomes: Vec<CommandOutcome> = devices
            .into_iter()
            .zip(join_all(tasks).await)
            .map(|(device, joined)| {
                let result = joined.unwrap_or_else(|e| Err(ControlError::TaskFailed(e.to_string())));
                if let Err(ref e) = result {
                    warn!(%request_id, id = %device.id, address = %device.address, error = %e, "Device command failed");
                }
                CommandOutcome { device, result }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            %request_id,
            action = action.name(),
            devices = outcomes.len(),
            failed,
            "Dispatched command"
        );
        crate::metrics::record_dispatch(action.name(), outcomes.len() - failed, failed);

        AggregatedResult { outcomes }
    }
}
