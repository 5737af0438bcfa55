//! netmon-audit: Audit trail sinks.
//!
//! Every completed HTTP response becomes one `AuditEvent`, fanned out by an
//! `AuditPipeline` to:
//! - `AuditRing`, a bounded in-memory buffer served by `GET /events`
//! - `AuditLog`, an optional append-only JSON-lines file per UTC day, each
//!   line sealed with a BLAKE3 hash of the event

pub mod hash;
pub mod pipeline;
pub mod ring;
pub mod store;

pub use pipeline::{spawn_log_writer, AuditPipeline, AuditSink, LogWriterHandle};
pub use ring::AuditRing;
pub use store::{AuditLog, AuditRecord, AuditStoreError, RetentionPolicy};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};
    use netmon_core::{AuditEvent, AuditEventId, ANONYMOUS_SUBJECT};

    pub fn event_at(path: &str, timestamp: DateTime<Utc>) -> AuditEvent {
        AuditEvent {
            id: AuditEventId::new(),
            timestamp,
            subject: ANONYMOUS_SUBJECT.to_string(),
            method: "GET".to_string(),
            path: path.to_string(),
            query: None,
            request_body: serde_json::Value::Null,
            response_status: 200,
            response_body: "{}".to_string(),
            response_body_truncated: false,
            client_address: Some("127.0.0.1:40000".to_string()),
            user_agent: None,
            duration_ms: 1,
        }
    }

    pub fn event(path: &str) -> AuditEvent {
        event_at(path, Utc::now())
    }
}
