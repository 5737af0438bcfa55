//! Configuration for the nmap scanner.

use std::time::Duration;

use serde::Deserialize;

/// Scanner configuration.
///
/// Loaded from the `[scanner]` section of `netmon.toml` or
/// `NETMON__SCANNER__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Path to the nmap binary (default: "nmap").
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Flag set used for every scan.
    #[serde(default)]
    pub profile: ScanProfile,

    /// Upper bound on a single nmap run; the process is killed past it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ScannerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Predefined scan profiles mapping to nmap flag sets.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanProfile {
    /// Ping sweep only: `-sn -T4`
    Ping,
    /// Aggressive timing, top 100 ports: `-T4 -F`
    #[default]
    Fast,
    /// Aggressive timing, every TCP port: `-T4 -p-`
    Full,
}

impl ScanProfile {
    /// Return the nmap flags for this profile.
    pub fn nmap_flags(&self) -> Vec<&'static str> {
        match self {
            Self::Ping => vec!["-sn", "-T4"],
            Self::Fast => vec!["-T4", "-F"],
            Self::Full => vec!["-T4", "-p-"],
        }
    }
}

impl std::str::FromStr for ScanProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ping" => Ok(Self::Ping),
            "fast" => Ok(Self::Fast),
            "full" => Ok(Self::Full),
            _ => Err(format!("Invalid profile: {s}. Choose: ping, fast, full")),
        }
    }
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            nmap_path: default_nmap_path(),
            profile: ScanProfile::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
