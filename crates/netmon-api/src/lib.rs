//! netmon-api: HTTP gateway for the netmon platform.
//!
//! Request path, outermost first:
//! trace → audit capture → authentication → RBAC → handler.
//! Authentication failures and RBAC denials are audited like any other
//! response.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod rbac;

pub use app::{build_router, AppState};
pub use config::AppConfig;
pub use error::ApiError;
