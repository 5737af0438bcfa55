//! netmon-core: Shared types and error handling for the netmon platform.
//!
//! This crate provides the foundational types used across all netmon components:
//! - `Identity` and `Role` for authenticated callers
//! - `DeviceRecord` for normalized scan results
//! - `AuditEvent` for captured request/response pairs
//! - Common error types

pub mod error;
pub mod events;
pub mod types;

pub use error::NetmonError;
pub use events::{AuditEvent, AuditEventId, ANONYMOUS_SUBJECT};
pub use types::{DeviceRecord, DeviceStatus, Identity, Role, UNKNOWN};
