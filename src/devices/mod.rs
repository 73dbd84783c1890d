// devices/mod.rs
pub mod magic_home;
#[cfg(test)]
pub mod testing;

use crate::models::{Device, DeviceState, Rgb};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Discovery I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Discovery timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Command task failed: {0}")]
    TaskFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlOptions {
    /// Wait for the device to acknowledge the command before returning.
    pub wait_for_reply: bool,
}

impl ControlOptions {
    pub fn fire_and_forget() -> Self {
        Self {
            wait_for_reply: false,
        }
    }
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            wait_for_reply: true,
        }
    }
}

/// Finds the lights currently reachable on the network.
#[async_trait::async_trait]
pub trait DeviceDiscoverer: Send + Sync {
    async fn scan(&self, timeout: Duration) -> Result<Vec<Device>, DiscoveryError>;
}

/// Speaks the control protocol of a light at a given address.
#[async_trait::async_trait]
pub trait DeviceController: Send + Sync {
    async fn set_color_with_brightness(
        &self,
        address: &str,
        color: Rgb,
        brightness: u8,
        options: ControlOptions,
    ) -> Result<(), ControlError>;

    async fn set_power(
        &self,
        address: &str,
        on: bool,
        options: ControlOptions,
    ) -> Result<(), ControlError>;

    async fn query_state(&self, address: &str) -> Result<DeviceState, ControlError>;
}
