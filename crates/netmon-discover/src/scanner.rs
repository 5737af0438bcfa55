//! Nmap process wrapper.
//!
//! Executes nmap as a child process via `tokio::process::Command` with a
//! discrete argument vector and parses the XML output into device records.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use uuid::Uuid;

use netmon_core::DeviceRecord;

use crate::config::{ScanProfile, ScannerConfig};
use crate::error::{DiscoverError, Result};
use crate::nmap_xml::{self, ParseError};
use crate::target::ScanTarget;

/// Result of a single nmap scan execution.
#[derive(Debug)]
pub struct ScanResult {
    /// Unique ID for this scan run.
    pub scan_id: Uuid,
    /// The target CIDR or host expression.
    pub target: String,
    /// Normalized hosts, in nmap's output order.
    pub devices: Vec<DeviceRecord>,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
}

/// Wrapper around the nmap binary.
#[derive(Debug, Clone)]
pub struct NmapScanner {
    nmap_path: String,
    profile: ScanProfile,
    timeout: Duration,
}

impl NmapScanner {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            nmap_path: config.nmap_path.clone(),
            profile: config.profile,
            timeout: config.timeout(),
        }
    }

    /// Override the per-scan timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Verify nmap is installed and accessible.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| DiscoverError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        if !output.status.success() {
            return Err(DiscoverError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Execute an nmap scan with the configured profile.
    pub async fn scan(&self, target: &ScanTarget) -> Result<ScanResult> {
        self.scan_with_profile(target, self.profile).await
    }

    /// Execute an nmap scan against an already-validated target.
    ///
    /// Nmap is invoked with `-oX -` to write XML to stdout. The child is
    /// killed if it outlives the configured timeout.
    pub async fn scan_with_profile(
        &self,
        target: &ScanTarget,
        profile: ScanProfile,
    ) -> Result<ScanResult> {
        let scan_id = Uuid::new_v4();
        let start = Instant::now();
        let flags = profile.nmap_flags();

        tracing::info!(
            scan_id = %scan_id,
            target = %target,
            profile = ?profile,
            "Starting nmap scan"
        );

        let child = Command::new(&self.nmap_path)
            .args(&flags)
            .arg("-oX")
            .arg("-")
            .arg("--noninteractive")
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DiscoverError::NmapNotFound {
                path: format!("{}: {e}", self.nmap_path),
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                tracing::warn!(
                    scan_id = %scan_id,
                    target = %target,
                    timeout_secs = self.timeout.as_secs(),
                    "Nmap scan timed out, process killed"
                );
                return Err(DiscoverError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let duration = start.elapsed();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(DiscoverError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        if !stderr.trim().is_empty() {
            tracing::warn!(scan_id = %scan_id, stderr = %stderr.trim(), "Nmap wrote diagnostics");
        }

        let devices = match nmap_xml::parse_devices(&output.stdout) {
            Ok(devices) => devices,
            Err(ParseError::MissingRoot) => {
                tracing::warn!(scan_id = %scan_id, "Nmap output has no <nmaprun> root, treating as zero hosts");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            scan_id = %scan_id,
            target = %target,
            hosts = devices.len(),
            duration_ms = duration.as_millis(),
            "Nmap scan complete"
        );

        Ok(ScanResult {
            scan_id,
            target: target.to_string(),
            devices,
            duration,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{fake_nmap, printing};
    use super::*;
    use crate::target::validate_target;

    const ONE_HOST: &str = r#"<nmaprun scanner="nmap">
<host><status state="up"/><address addr="10.0.0.7" addrtype="ipv4"/></host>
</nmaprun>"#;

    fn scanner_for(path: &std::path::Path) -> NmapScanner {
        NmapScanner::new(&ScannerConfig {
            nmap_path: path.display().to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn scan_parses_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let nmap = fake_nmap(dir.path(), &printing(ONE_HOST));
        let target = validate_target("10.0.0.0/24").unwrap();

        let result = scanner_for(&nmap).scan(&target).await.unwrap();
        assert_eq!(result.target, "10.0.0.0/24");
        assert_eq!(result.devices.len(), 1);
        assert_eq!(result.devices[0].ip, "10.0.0.7");
    }

    #[tokio::test]
    async fn target_is_passed_as_last_argument() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args");
        let body = format!(
            "printf '%s\\n' \"$@\" > '{}'\necho '<nmaprun/>'",
            args_file.display()
        );
        let nmap = fake_nmap(dir.path(), &body);
        let target = validate_target("gateway.lan").unwrap();

        scanner_for(&nmap).scan(&target).await.unwrap();

        let args = std::fs::read_to_string(&args_file).unwrap();
        let args: Vec<&str> = args.lines().collect();
        assert_eq!(
            args,
            vec!["-T4", "-F", "-oX", "-", "--noninteractive", "gateway.lan"]
        );
    }

    #[tokio::test]
    async fn requested_profile_overrides_configured_flags() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args");
        let body = format!(
            "printf '%s\\n' \"$@\" > '{}'\necho '<nmaprun/>'",
            args_file.display()
        );
        let nmap = fake_nmap(dir.path(), &body);
        let target = validate_target("10.0.0.0/24").unwrap();

        scanner_for(&nmap)
            .scan_with_profile(&target, ScanProfile::Ping)
            .await
            .unwrap();

        let args = std::fs::read_to_string(&args_file).unwrap();
        let args: Vec<&str> = args.lines().collect();
        assert_eq!(
            args,
            vec!["-sn", "-T4", "-oX", "-", "--noninteractive", "10.0.0.0/24"]
        );
    }

    #[tokio::test]
    async fn version_check_reports_version() {
        let dir = tempfile::tempdir().unwrap();
        let nmap = fake_nmap(dir.path(), "echo 'Nmap version 7.94'");

        let version = scanner_for(&nmap).verify_installation().await.unwrap();
        assert!(version.starts_with("Nmap version 7.94"));
    }

    #[tokio::test]
    async fn version_check_fails_on_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let nmap = fake_nmap(dir.path(), "echo 'broken install' >&2\nexit 2");

        let err = scanner_for(&nmap).verify_installation().await.unwrap_err();
        match err {
            DiscoverError::NmapFailed { code, stderr } => {
                assert_eq!(code, 2);
                assert_eq!(stderr, "broken install");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let nmap = fake_nmap(dir.path(), "echo 'requires root' >&2\nexit 3");
        let target = validate_target("10.0.0.1").unwrap();

        let err = scanner_for(&nmap).scan(&target).await.unwrap_err();
        match err {
            DiscoverError::NmapFailed { code, stderr } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "requires root");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stderr_on_success_is_only_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("echo 'WARNING: slow' >&2\n{}", printing(ONE_HOST));
        let nmap = fake_nmap(dir.path(), &body);
        let target = validate_target("10.0.0.1").unwrap();

        let result = scanner_for(&nmap).scan(&target).await.unwrap();
        assert_eq!(result.devices.len(), 1);
    }

    #[tokio::test]
    async fn missing_root_is_zero_hosts() {
        let dir = tempfile::tempdir().unwrap();
        let nmap = fake_nmap(dir.path(), "true");
        let target = validate_target("10.0.0.1").unwrap();

        let result = scanner_for(&nmap).scan(&target).await.unwrap();
        assert!(result.devices.is_empty());
    }

    #[tokio::test]
    async fn malformed_output_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let nmap = fake_nmap(dir.path(), "echo '<nmaprun><host>'");
        let target = validate_target("10.0.0.1").unwrap();

        let err = scanner_for(&nmap).scan(&target).await.unwrap_err();
        assert!(matches!(err, DiscoverError::XmlParse(ParseError::Malformed(_))));
    }

    #[tokio::test]
    async fn slow_scan_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let nmap = fake_nmap(dir.path(), "sleep 5");
        let target = validate_target("10.0.0.1").unwrap();

        let started = Instant::now();
        let err = scanner_for(&nmap)
            .with_timeout(Duration::from_millis(200))
            .scan(&target)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoverError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let target = validate_target("10.0.0.1").unwrap();

        let err = scanner_for(&dir.path().join("no-such-nmap"))
            .scan(&target)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoverError::NmapNotFound { .. }));
    }
}
