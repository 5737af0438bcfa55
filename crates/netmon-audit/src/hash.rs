//! BLAKE3 content hashing for tamper evidence.
//!
//! Each persisted audit line carries the hash of its event's canonical JSON,
//! so any later edit to the line is detectable.

use netmon_core::AuditEvent;

/// Compute the BLAKE3 hash of an audit event. Returns the hex-encoded hash.
pub fn compute_event_hash(event: &AuditEvent) -> String {
    let json = serde_json::to_vec(event).expect("AuditEvent serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}
