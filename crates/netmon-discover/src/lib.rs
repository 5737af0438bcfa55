//! netmon-discover: Host/port discovery for netmon.
//!
//! Wraps nmap as a child process, normalizes its XML output into
//! `DeviceRecord`s, and keeps the device inventory replaced wholesale
//! after every successful scan.

pub mod config;
pub mod error;
pub mod inventory;
pub mod nmap_xml;
pub mod orchestrator;
pub mod scanner;
pub mod target;

pub use config::{ScanProfile, ScannerConfig};
pub use error::{DiscoverError, Result};
pub use inventory::DeviceInventory;
pub use orchestrator::{ScanOrchestrator, ScanOutcome};
pub use scanner::NmapScanner;
pub use target::{validate_target, ScanTarget};
