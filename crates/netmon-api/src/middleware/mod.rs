//! Request pipeline stages, outermost first: audit capture, authentication,
//! authorization.

pub mod audit;
pub mod authn;
pub mod authz;
pub mod capture;

pub use audit::{audit_middleware, tag_matched_route, CaptureSettings};
pub use authn::auth_middleware;
pub use authz::rbac_middleware;
pub use capture::{CaptureBody, PendingEvent};
