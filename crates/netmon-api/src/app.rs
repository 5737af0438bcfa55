//! HTTP application wiring.
//!
//! Builds the router, the middleware chain, and the shared state injected
//! into handlers. `main` stays small so the whole stack is testable with
//! `tower::ServiceExt::oneshot`.

use std::any::Any;
use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use netmon_audit::{AuditPipeline, AuditRing, LogWriterHandle};
use netmon_discover::{DeviceInventory, NmapScanner, ScanOrchestrator};

use crate::api;
use crate::auth::{Authenticator, JwtAuthenticator, UserStore};
use crate::config::AppConfig;
use crate::error::api_internal_message;
use crate::middleware::{
    audit_middleware, auth_middleware, rbac_middleware, tag_matched_route, CaptureSettings,
};
use crate::observability;
use crate::rbac::RbacPolicy;

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<dyn Authenticator>,
    pub users: Arc<UserStore>,
    pub rbac: Arc<RbacPolicy>,
    pub orchestrator: Arc<ScanOrchestrator>,
    pub events: Arc<AuditRing>,
    pub audit: AuditPipeline,
    pub capture: CaptureSettings,
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Assemble state from configuration. `log_writer` adds the durable
    /// audit sink when present.
    pub fn new(config: &AppConfig, log_writer: Option<LogWriterHandle>) -> Self {
        let scanner = NmapScanner::new(&config.scanner);
        let orchestrator = ScanOrchestrator::new(scanner, Arc::new(DeviceInventory::new()));

        let events = Arc::new(AuditRing::new(config.audit.max_events));
        let mut audit = AuditPipeline::new().with_sink(events.clone());
        if let Some(writer) = log_writer {
            audit = audit.with_sink(Arc::new(writer));
        }

        Self {
            authenticator: Arc::new(JwtAuthenticator::new(
                &config.auth.jwt_secret,
                config.auth.token_ttl_secs,
            )),
            users: Arc::new(UserStore::new()),
            rbac: Arc::new(RbacPolicy::new(&config.rbac)),
            orchestrator: Arc::new(orchestrator),
            events,
            audit,
            capture: CaptureSettings::from(&config.audit),
            metrics: observability::metrics_handle(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/login", post(api::auth::login))
        .route("/register", post(api::auth::register))
        .route("/health", get(api::system::health));

    // Route layers run innermost-last: authenticate, then authorize.
    let protected = Router::new()
        .route("/scan", post(api::scan::run_scan))
        .route("/devices", get(api::devices::list_devices))
        .route("/events", get(api::events::list_events))
        .route("/metrics", get(api::metrics::render_metrics))
        .route("/metrics/json", get(api::metrics::render_metrics_json))
        .route(
            "/metrics/{namespace}",
            get(api::metrics::render_namespace_metrics),
        )
        .route("/admin/users", get(api::admin::list_users))
        .route(
            "/admin/users/{username}/role",
            put(api::admin::update_role),
        )
        .route_layer(from_fn_with_state(state.clone(), rbac_middleware))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public)
        .merge(protected)
        .route_layer(from_fn(tag_matched_route))
        .fallback(api::system::not_found)
        // Inside audit so a panic anywhere below still yields an audited 500.
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(state.clone(), audit_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    tracing::error!(panic = %detail, "Handler panicked");
    api_internal_message("internal server error").into_response()
}
