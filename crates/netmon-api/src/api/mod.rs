//! HTTP handlers, one module per resource.

pub mod admin;
pub mod auth;
pub mod devices;
pub mod events;
pub mod metrics;
pub mod scan;
pub mod system;
pub mod types;
