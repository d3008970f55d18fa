//! Lease registry: exclusive, time-bounded claims on local devices.
//!
//! One record per device, created at construction and never removed.
//! A device is FREE iff its expiration is at or before now; otherwise it is
//! held by `holder_task_id`. Nothing evicts lapsed leases: a lease is freed
//! implicitly the next time a reserve call scans past it.
//!
//! Every reserve runs its scan and its mutation under one lock, so two
//! concurrent probes can never be handed the same device.

use std::sync::Arc;
use std::time::Duration;

use fedgov_core::clock::{deadline, SharedClock};
use fedgov_core::{DeviceLease, DeviceSelector, SwarmError};
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct DeviceRecord {
    id: u32,
    holder_task_id: String,
    /// Unix ms.
    expiration: u64,
}

impl DeviceRecord {
    fn is_free(&self, now: u64) -> bool {
        self.expiration <= now
    }

    fn to_lease(&self) -> DeviceLease {
        DeviceLease {
            id: self.id,
            task_id: self.holder_task_id.clone(),
            expiration: self.expiration,
        }
    }
}

/// Derived state of a device at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    Free,
    Reserved,
}

/// Read-only view of one device, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub id: u32,
    pub state: DeviceState,
    /// Last holder. Still reported after the lease lapses.
    pub task_id: String,
    /// Milliseconds left on the lease, 0 when free.
    pub expires_in_ms: u64,
}

/// Per-device lease state for this node.
#[derive(Clone)]
pub struct LeaseRegistry {
    devices: Arc<Mutex<Vec<DeviceRecord>>>,
    clock: SharedClock,
}

impl LeaseRegistry {
    /// Create `device_count` FREE devices with ids `0..device_count`.
    pub fn new(device_count: u32, clock: SharedClock) -> Self {
        let devices = (0..device_count)
            .map(|id| DeviceRecord {
                id,
                holder_task_id: String::new(),
                expiration: 0,
            })
            .collect();
        Self {
            devices: Arc::new(Mutex::new(devices)),
            clock,
        }
    }

    /// Take any free device (`DeviceSelector::Any`) or extend a held one
    /// (`DeviceSelector::Device`).
    pub async fn reserve(
        &self,
        device: DeviceSelector,
        task_id: &str,
        duration: Duration,
    ) -> Result<DeviceLease, SwarmError> {
        let mut devices = self.devices.lock().await;
        let now = self.clock.now_ms();

        match device {
            DeviceSelector::Device(device_id) => {
                let record = devices
                    .iter_mut()
                    .find(|d| d.id == device_id && d.holder_task_id == task_id && !d.is_free(now))
                    .ok_or_else(|| SwarmError::LeaseMismatch {
                        device_id,
                        task_id: task_id.to_string(),
                    })?;
                record.expiration = deadline(now, duration);
                tracing::debug!(device = device_id, task_id, "lease extended");
                Ok(record.to_lease())
            }
            DeviceSelector::Any => {
                let record = devices
                    .iter_mut()
                    .find(|d| d.is_free(now))
                    .ok_or(SwarmError::LeaseUnavailable)?;
                record.holder_task_id = task_id.to_string();
                record.expiration = deadline(now, duration);
                tracing::info!(device = record.id, task_id, "device leased");
                Ok(record.to_lease())
            }
        }
    }

    /// Snapshot of every device, in id order.
    pub async fn devices(&self) -> Vec<DeviceStatus> {
        let devices = self.devices.lock().await;
        let now = self.clock.now_ms();
        devices
            .iter()
            .map(|d| {
                let free = d.is_free(now);
                DeviceStatus {
                    id: d.id,
                    state: if free {
                        DeviceState::Free
                    } else {
                        DeviceState::Reserved
                    },
                    task_id: d.holder_task_id.clone(),
                    expires_in_ms: d.expiration.saturating_sub(now),
                }
            })
            .collect()
    }

    /// Number of devices currently free.
    pub async fn free_count(&self) -> usize {
        let devices = self.devices.lock().await;
        let now = self.clock.now_ms();
        devices.iter().filter(|d| d.is_free(now)).count()
    }

    /// Total number of devices.
    pub async fn len(&self) -> usize {
        self.devices.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.lock().await.is_empty()
    }
}
