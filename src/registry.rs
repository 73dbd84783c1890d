// registry.rs
//! Process-wide device inventory, rebuilt from discovery on a fixed period.
//!
//! The current [`Snapshot`] sits behind a `watch` channel. Readers clone the
//! `Arc` out of it and keep whichever snapshot they got for as long as they
//! need it; a refresh swaps a whole new snapshot in.

use crate::{
    devices::{DeviceDiscoverer, DiscoveryError},
    models::Device,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

/// Slack given to a discoverer past its own scan timeout.
const SCAN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub devices: Vec<Device>,
    /// `None` until the first successful scan.
    pub refreshed_at: Option<DateTime<Utc>>,
}

pub struct DeviceRegistry {
    discoverer: Arc<dyn DeviceDiscoverer>,
    scan_timeout: Duration,
    current: watch::Sender<Arc<Snapshot>>,
    refresh_lock: Mutex<()>,
}

impl DeviceRegistry {
    pub fn new(discoverer: Arc<dyn DeviceDiscoverer>, scan_timeout: Duration) -> Self {
        let (current, _) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            discoverer,
            scan_timeout,
            current,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    /// Runs one discovery scan and swaps in the result.
    ///
    /// Returns `true` if the snapshot was replaced. A failed scan keeps the
    /// previous snapshot, and a call made while another refresh is running
    /// returns immediately.
    pub async fn refresh(&self) -> bool {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            debug!("Refresh already in progress, skipping");
            return false;
        };

        info!("Scanning for devices ...");
        match self.scan().await {
            Ok(devices) => {
                let s = if devices.len() == 1 { "" } else { "s" };
                info!("Found {} device{}", devices.len(), s);
                for device in &devices {
                    debug!(id = %device.id, address = %device.address, model = ?device.model, "Discovered device");
                }

                crate::metrics::record_refresh(Some(devices.len()));
                self.current.send_replace(Arc::new(Snapshot {
                    devices,
                    refreshed_at: Some(Utc::now()),
                }));
                true
            }
            Err(e) => {
                warn!(error = %e, "Device discovery failed, keeping previous inventory");
                crate::metrics::record_refresh(None);
                false
            }
        }
    }

    async fn scan(&self) -> Result<Vec<Device>, DiscoveryError> {
        let deadline = self.scan_timeout + SCAN_GRACE;
        tokio::time::timeout(deadline, self.discoverer.scan(self.scan_timeout))
            .await
            .unwrap_or(Err(DiscoveryError::TimedOut(deadline)))
    }

    /// Refreshes immediately, then once per `period`. A slow scan delays the
    /// next tick instead of overlapping it.
    pub fn spawn_refresh_loop(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        })
    }
}
