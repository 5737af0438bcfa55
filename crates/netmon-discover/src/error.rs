//! Error types for the netmon-discover crate.

use thiserror::Error;

use crate::nmap_xml::ParseError;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Invalid scan target: {reason}")]
    InvalidTarget { reason: String },

    #[error("Nmap not found at path: {path}")]
    NmapNotFound { path: String },

    #[error("Nmap exited with code {code}: {stderr}")]
    NmapFailed { code: i32, stderr: String },

    #[error("Nmap did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to parse nmap XML output: {0}")]
    XmlParse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiscoverError {
    pub(crate) fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
