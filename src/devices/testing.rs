//! In-memory discoverers and controllers for tests.

use super::{ControlError, ControlOptions, DeviceController, DeviceDiscoverer, DiscoveryError};
use crate::models::{Device, DeviceState, Rgb};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;
use tokio::sync::Barrier;

pub fn device(id: &str, address: &str) -> Device {
    Device {
        id: id.to_string(),
        address: address.to_string(),
        model: Some("AK001-ZJ100".to_string()),
    }
}

/// `n` devices with ids `dev-1..` and addresses `10.0.0.1..`.
pub fn devices(n: usize) -> Vec<Device> {
    (1..=n)
        .map(|i| device(&format!("dev-{i}"), &format!("10.0.0.{i}")))
        .collect()
}

/// Returns whatever device list it currently holds, or fails on demand.
#[derive(Default)]
pub struct StaticDiscoverer {
    devices: Mutex<Vec<Device>>,
    failing: AtomicBool,
    scans: AtomicUsize,
}

impl StaticDiscoverer {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: Mutex::new(devices),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set(&self, devices: Vec<Device>) {
        *self.devices.lock().unwrap() = devices;
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceDiscoverer for StaticDiscoverer {
    async fn scan(&self, _timeout: Duration) -> Result<Vec<Device>, DiscoveryError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DiscoveryError::TimedOut(Duration::from_millis(1000)));
        }
        Ok(self.devices.lock().unwrap().clone())
    }
}

pub struct FailingDiscoverer;

#[async_trait]
impl DeviceDiscoverer for FailingDiscoverer {
    async fn scan(&self, _timeout: Duration) -> Result<Vec<Device>, DiscoveryError> {
        Err(DiscoveryError::Io(std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "no broadcast interface",
        )))
    }
}

/// Never answers until the outer deadline kicks in.
pub struct HangingDiscoverer;

#[async_trait]
impl DeviceDiscoverer for HangingDiscoverer {
    async fn scan(&self, _timeout: Duration) -> Result<Vec<Device>, DiscoveryError> {
        std::future::pending().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Color {
        address: String,
        color: Rgb,
        brightness: u8,
        options: ControlOptions,
    },
    Power {
        address: String,
        on: bool,
        options: ControlOptions,
    },
    Query {
        address: String,
    },
}

/// Records every call and fails the addresses it is told to.
#[derive(Default)]
pub struct MockController {
    failing: HashSet<String>,
    state: DeviceState,
    barrier: Option<Arc<Barrier>>,
    calls: Mutex<Vec<Call>>,
    completed: AtomicUsize,
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, address: &str) -> Self {
        self.failing.insert(address.to_string());
        self
    }

    pub fn with_state(mut self, state: DeviceState) -> Self {
        self.state = state;
        self
    }

    /// Every command waits on `barrier` before completing.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    async fn finish(&self, address: &str) -> Result<(), ControlError> {
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(address) {
            return Err(ControlError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceController for MockController {
    async fn set_color_with_brightness(
        &self,
        address: &str,
        color: Rgb,
        brightness: u8,
        options: ControlOptions,
    ) -> Result<(), ControlError> {
        self.calls.lock().unwrap().push(Call::Color {
            address: address.to_string(),
            color,
            brightness,
            options,
        });
        self.finish(address).await
    }

    async fn set_power(
        &self,
        address: &str,
        on: bool,
        options: ControlOptions,
    ) -> Result<(), ControlError> {
        self.calls.lock().unwrap().push(Call::Power {
            address: address.to_string(),
            on,
            options,
        });
        self.finish(address).await
    }

    async fn query_state(&self, address: &str) -> Result<DeviceState, ControlError> {
        self.calls.lock().unwrap().push(Call::Query {
            address: address.to_string(),
        });
        self.finish(address).await?;
        Ok(self.state.clone())
    }
}
