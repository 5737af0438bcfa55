//! Core domain types shared by the scanner, the audit pipeline, and the API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NetmonError;

/// Placeholder used for every device attribute the scanner did not report.
pub const UNKNOWN: &str = "Unknown";

// ── Identity ──────────────────────────────────────────────────────

/// Role attached to an authenticated identity.
///
/// Tokens carry the role as a free-form string, so anything other than the
/// two known roles is preserved as `Other` and denied by the RBAC engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Viewer,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "Admin",
            Self::Viewer => "Viewer",
            Self::Other(raw) => raw,
        }
    }

    /// Parse a role that may be assigned to a user account.
    /// Only `Admin` and `Viewer` are assignable.
    pub fn assignable(raw: &str) -> Result<Self, NetmonError> {
        match Role::from(raw) {
            Role::Other(other) => Err(NetmonError::InvalidRole(other)),
            role => Ok(role),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "Admin" => Self::Admin,
            "Viewer" => Self::Viewer,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// The authenticated caller of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub role: Option<Role>,
}

impl Identity {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role: Some(role),
        }
    }
}

// ── Devices ───────────────────────────────────────────────────────

/// Reachability reported by the scanner for a host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Up,
    Down,
    #[default]
    Unknown,
}

impl DeviceStatus {
    pub fn from_state(state: &str) -> Self {
        match state {
            "up" => Self::Up,
            "down" => Self::Down,
            _ => Self::Unknown,
        }
    }
}

/// One host discovered by a scan, normalized for API consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub ip: String,
    pub hostname: String,
    pub vendor: String,
    pub mac: String,
    pub status: DeviceStatus,
    /// Open ports in the order the scanner reported them.
    pub open_ports: Vec<u16>,
}
