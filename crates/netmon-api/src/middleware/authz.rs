use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use netmon_core::Identity;

use crate::app::AppState;
use crate::error::{api_forbidden, api_payload_too_large, api_validation_error};
use crate::rbac::{resolve_namespace, DecisionReason};

/// Apply the RBAC policy to an authenticated request.
///
/// Runs after routing so the `namespace` path parameter is visible. The
/// request body has already been buffered by the audit stage; it is read
/// once more for a `namespace` field and handed on unchanged.
pub async fn rbac_middleware(
    State(state): State<AppState>,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let path_params: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let query = match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
        Ok(Query(query)) => query,
        Err(e) => return api_validation_error(&e.body_text()).into_response(),
    };
    let bytes = match axum::body::to_bytes(body, state.capture.max_request_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => return api_payload_too_large(state.capture.max_request_body_bytes).into_response(),
    };
    let json = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice::<serde_json::Value>(&bytes).ok()
    };
    let namespace = resolve_namespace(&path_params, json.as_ref(), &query);

    let path = parts.uri.path();
    let decision = match parts.extensions.get::<Identity>() {
        Some(identity) => state.rbac.authorize(identity, path, namespace.as_deref()),
        None => {
            return api_forbidden(DecisionReason::MissingRole.message()).into_response();
        }
    };

    if !decision.allow {
        tracing::info!(
            path = %path,
            namespace = namespace.as_deref().unwrap_or_default(),
            reason = ?decision.reason,
            "Access denied"
        );
        return api_forbidden(decision.reason.message()).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
