//! Scan target grammar.
//!
//! A target reaches nmap as a single argv entry, never through a shell, and
//! only after it matches one of: an IP address, a CIDR block, or a DNS
//! hostname.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::{DiscoverError, Result};

const MAX_TARGET_LEN: usize = 253;

/// A target that passed [`validate_target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget(String);

impl ScanTarget {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a caller-supplied host, hostname, or CIDR block.
pub fn validate_target(raw: &str) -> Result<ScanTarget> {
    let target = raw.trim();
    if target.is_empty() {
        return Err(DiscoverError::invalid_target("target is required"));
    }
    if target.len() > MAX_TARGET_LEN {
        return Err(DiscoverError::invalid_target("target is too long"));
    }
    if target.starts_with('-') {
        return Err(DiscoverError::invalid_target("target must not start with '-'"));
    }
    if let Some(bad) = target
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '/' | '-')))
    {
        return Err(DiscoverError::invalid_target(format!(
            "unexpected character {bad:?}"
        )));
    }

    if target.contains('/') {
        target
            .parse::<IpNet>()
            .map_err(|e| DiscoverError::invalid_target(format!("bad CIDR block: {e}")))?;
    } else if target.parse::<IpAddr>().is_err() && !is_hostname(target) {
        return Err(DiscoverError::invalid_target(
            "not an IP address, CIDR block, or hostname",
        ));
    }

    Ok(ScanTarget(target.to_string()))
}

fn is_hostname(s: &str) -> bool {
    s.split('.').all(|label| {
        (1..=63).contains(&label.len())
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}
