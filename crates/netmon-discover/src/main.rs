//! CLI entry point for one-shot netmon discovery scans.
//!
//! Prints the normalized device records as JSON on stdout.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use netmon_discover::{validate_target, NmapScanner, ScanProfile, ScannerConfig};

#[derive(Parser)]
#[command(name = "netmon-discover")]
#[command(about = "Run a single nmap discovery scan and print the devices found")]
struct Cli {
    /// Target to scan (IP, hostname, or CIDR, e.g. 10.0.1.0/24).
    #[arg(short, long)]
    target: String,

    /// Scan profile override: ping, fast, full.
    #[arg(short, long)]
    profile: Option<ScanProfile>,

    /// Timeout override in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Config file prefix (default: netmon).
    #[arg(short, long, default_value = "netmon")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();

    let cli = Cli::parse();
    let mut scanner_config = load_scanner_config(&cli.config)?;
    if let Some(profile) = cli.profile {
        scanner_config.profile = profile;
    }

    let mut scanner = NmapScanner::new(&scanner_config);
    if let Some(secs) = cli.timeout_secs {
        scanner = scanner.with_timeout(Duration::from_secs(secs));
    }

    let version = scanner.verify_installation().await?;
    tracing::info!(nmap_version = %version.lines().next().unwrap_or_default(), "Nmap verified");

    let target = validate_target(&cli.target)?;
    let result = scanner.scan(&target).await?;
    println!("{}", serde_json::to_string_pretty(&result.devices)?);

    Ok(())
}

fn load_scanner_config(file_prefix: &str) -> anyhow::Result<ScannerConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("NETMON")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<ScannerConfig>("scanner") {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(ScannerConfig::default()),
        Err(e) => Err(e.into()),
    }
}
