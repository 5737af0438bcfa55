//! Logging and metrics wiring for the API server.
//!
//! Initialization is guarded by `OnceLock` so tests may build several
//! routers in one process.

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, EnvFilter};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// JSON logs on stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .try_init();
}

/// The process-wide Prometheus recorder, installed on first use.
pub fn metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                describe_metrics();
                handle
            }
            Err(e) => {
                // Another recorder already owns the facade; render an empty one.
                tracing::warn!(error = %e, "Metrics recorder not installed");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

fn describe_metrics() {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_counter!("scans_total", "Completed scans by outcome");
    metrics::describe_gauge!("inventory_devices", "Devices in the current inventory");
    metrics::describe_counter!(
        "audit_log_dropped_total",
        "Audit events not persisted because the writer queue was full"
    );
}

/// Count one finished request.
pub fn record_request(method: &str, route: &str, status: u16) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status_code" => status.to_string(),
    )
    .increment(1);
}
