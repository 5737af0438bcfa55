//! netmon API server.

use std::net::SocketAddr;

use clap::Parser;

use netmon_api::{build_router, observability, AppConfig, AppState};
use netmon_audit::{spawn_log_writer, AuditLog};
use netmon_core::Role;

#[derive(Parser)]
#[command(name = "netmon-api")]
#[command(about = "Network monitoring API: scans, device inventory, audit trail")]
struct Cli {
    /// Config file prefix (default: netmon).
    #[arg(short, long, default_value = "netmon")]
    config: String,

    /// Listen address override, e.g. 127.0.0.1:8080.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let (log_writer, writer_task) = match &config.audit.log_dir {
        Some(dir) => {
            let log = AuditLog::open(dir, config.audit.retention())?;
            let (handle, task) = spawn_log_writer(log, config.audit.log_queue_capacity);
            (Some(handle), Some(task))
        }
        None => (None, None),
    };

    let state = AppState::new(&config, log_writer);

    if let Some(admin) = &config.auth.bootstrap_admin {
        state
            .users
            .create(&admin.username, &admin.password, Role::Admin)?;
    }

    match state.orchestrator.scanner().verify_installation().await {
        Ok(version) => {
            tracing::info!(nmap_version = %version.lines().next().unwrap_or_default(), "Nmap verified");
        }
        Err(e) => tracing::warn!(error = %e, "Nmap unavailable; scans will fail until it is installed"),
    }

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "netmon API listening");

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(task) = writer_task {
        let _ = task.await;
    }
    tracing::info!("netmon API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
