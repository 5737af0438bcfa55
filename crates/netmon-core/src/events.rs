//! Audit event type shared by the capture middleware and the audit sinks.
//!
//! One `AuditEvent` is produced for every completed HTTP response and is
//! never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subject recorded when the request carried no verified identity.
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Unique identifier for an audit event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AuditEventId(pub Uuid);

impl AuditEventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A captured request/response pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: AuditEventId,
    /// When the response finished.
    pub timestamp: DateTime<Utc>,
    /// Authenticated subject, or [`ANONYMOUS_SUBJECT`].
    pub subject: String,
    pub method: String,
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    pub request_body: serde_json::Value,
    pub response_status: u16,
    pub response_body: String,
    /// True when the response body exceeded the capture limit.
    #[serde(default)]
    pub response_body_truncated: bool,
    pub client_address: Option<String>,
    pub user_agent: Option<String>,
    pub duration_ms: u64,
}

impl AuditEvent {
    /// `"<METHOD> <path>"`, the action label shown by consumers.
    pub fn action(&self) -> String {
        match &self.query {
            Some(q) if !q.is_empty() => format!("{} {}?{}", self.method, self.path, q),
            _ => format!("{} {}", self.method, self.path),
        }
    }
}
