//! Process-wide device inventory.
//!
//! Holds the device set produced by the most recent successful scan as an
//! immutable `Arc` snapshot. Writers swap the whole snapshot; readers clone
//! the `Arc` and never observe a partially replaced set.

use std::sync::Arc;

use tokio::sync::RwLock;

use netmon_core::DeviceRecord;

#[derive(Debug)]
pub struct DeviceInventory {
    devices: RwLock<Arc<[DeviceRecord]>>,
}

impl DeviceInventory {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Current device set.
    pub async fn snapshot(&self) -> Arc<[DeviceRecord]> {
        self.devices.read().await.clone()
    }

    /// Replace the device set wholesale. An empty `devices` clears it.
    pub async fn replace(&self, devices: Vec<DeviceRecord>) -> Arc<[DeviceRecord]> {
        let snapshot: Arc<[DeviceRecord]> = Arc::from(devices);
        *self.devices.write().await = snapshot.clone();
        snapshot
    }
}

impl Default for DeviceInventory {
    fn default() -> Self {
        Self::new()
    }
}
