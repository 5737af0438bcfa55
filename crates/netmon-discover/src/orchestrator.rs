//! Scan orchestration: validate → nmap → parse → swap inventory.
//!
//! Scans are serialized through a one-permit semaphore so that only one
//! nmap run can replace the inventory at a time. A failed scan never
//! touches the inventory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use uuid::Uuid;

use netmon_core::DeviceRecord;

use crate::config::ScanProfile;
use crate::error::Result;
use crate::inventory::DeviceInventory;
use crate::scanner::NmapScanner;
use crate::target::validate_target;

/// Outcome of a successful orchestrated scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub scan_id: Uuid,
    pub devices: Arc<[DeviceRecord]>,
    pub duration: Duration,
}

pub struct ScanOrchestrator {
    scanner: NmapScanner,
    inventory: Arc<DeviceInventory>,
    permit: Semaphore,
}

impl ScanOrchestrator {
    pub fn new(scanner: NmapScanner, inventory: Arc<DeviceInventory>) -> Self {
        Self {
            scanner,
            inventory,
            permit: Semaphore::new(1),
        }
    }

    pub fn scanner(&self) -> &NmapScanner {
        &self.scanner
    }

    pub fn inventory(&self) -> &Arc<DeviceInventory> {
        &self.inventory
    }

    /// Run one scan and, on success, replace the inventory with its result.
    ///
    /// The target is validated before any process is spawned. `profile`
    /// falls back to the scanner's configured one.
    pub async fn scan(&self, raw_target: &str, profile: Option<ScanProfile>) -> Result<ScanOutcome> {
        let target = validate_target(raw_target)?;

        let _permit = self
            .permit
            .acquire()
            .await
            .expect("scan semaphore is never closed");

        let result = match profile {
            Some(profile) => self.scanner.scan_with_profile(&target, profile).await?,
            None => self.scanner.scan(&target).await?,
        };
        let devices = self.inventory.replace(result.devices).await;

        tracing::info!(
            scan_id = %result.scan_id,
            target = %target,
            devices = devices.len(),
            "Device inventory replaced"
        );

        Ok(ScanOutcome {
            scan_id: result.scan_id,
            devices,
            duration: result.duration,
        })
    }
}
