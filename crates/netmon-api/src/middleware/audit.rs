//! Outermost application middleware: records every request/response pair.

use std::future::poll_fn;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use http_body::Body as _;
use serde_json::Value;

use netmon_core::{Identity, ANONYMOUS_SUBJECT};

use super::capture::{CaptureBody, PendingEvent};
use crate::app::AppState;
use crate::config::AuditConfig;
use crate::error::{api_payload_too_large, api_validation_error};

pub const REDACTED: &str = "[REDACTED]";

/// Limits applied while capturing a request/response pair.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub max_request_body_bytes: usize,
    pub response_capture_bytes: usize,
    pub redact_fields: Arc<[String]>,
}

impl From<&AuditConfig> for CaptureSettings {
    fn from(config: &AuditConfig) -> Self {
        Self {
            max_request_body_bytes: config.max_request_body_bytes,
            response_capture_bytes: config.response_capture_bytes,
            redact_fields: config.redact_fields.clone().into(),
        }
    }
}

pub async fn audit_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let settings = &state.capture;
    let (parts, body) = request.into_parts();

    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(str::to_string);
    let client_address = client_address(
        parts.extensions.get::<ConnectInfo<SocketAddr>>(),
        &parts.headers,
    );
    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (response, request_body) = match read_bounded(body, settings.max_request_body_bytes).await {
        Ok(bytes) => {
            let recorded = recorded_body(&bytes, &settings.redact_fields);
            let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;
            (response, recorded)
        }
        Err(BodyReadError::TooLarge) => {
            tracing::warn!(path = %path, limit = settings.max_request_body_bytes, "Request body too large");
            (
                api_payload_too_large(settings.max_request_body_bytes).into_response(),
                Value::Null,
            )
        }
        Err(BodyReadError::Failed(e)) => {
            tracing::warn!(path = %path, error = %e, "Failed to read request body");
            (
                api_validation_error("failed to read request body").into_response(),
                Value::Null,
            )
        }
    };

    let subject = response
        .extensions()
        .get::<Identity>()
        .map(|identity| identity.subject.clone())
        .unwrap_or_else(|| ANONYMOUS_SUBJECT.to_string());
    let route = response
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string());

    let pending = PendingEvent {
        subject,
        method,
        path,
        query,
        request_body,
        response_status: response.status().as_u16(),
        client_address,
        user_agent,
        route,
        started,
    };

    let (parts, body) = response.into_parts();
    let body = CaptureBody::new(
        body,
        settings.response_capture_bytes,
        pending,
        state.audit.clone(),
    );
    Response::from_parts(parts, Body::new(body))
}

/// Route-level layer that exposes the matched route template to the audit
/// stage, which runs before routing.
pub async fn tag_matched_route(matched: MatchedPath, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.extensions_mut().insert(matched);
    response
}

#[derive(Debug)]
enum BodyReadError {
    TooLarge,
    Failed(axum::Error),
}

async fn read_bounded(mut body: Body, limit: usize) -> Result<Bytes, BodyReadError> {
    if body.size_hint().lower() > limit as u64 {
        return Err(BodyReadError::TooLarge);
    }

    let mut buf = BytesMut::new();
    while let Some(frame) = poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await {
        let frame = frame.map_err(BodyReadError::Failed)?;
        if let Ok(data) = frame.into_data() {
            if buf.len() + data.len() > limit {
                return Err(BodyReadError::TooLarge);
            }
            buf.extend_from_slice(&data);
        }
    }
    Ok(buf.freeze())
}

/// Request body as stored in the event: `null` when empty, redacted JSON
/// when it parses, lossy UTF-8 text otherwise.
fn recorded_body(bytes: &[u8], redact_fields: &[String]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut json) => {
            redact(&mut json, redact_fields);
            json
        }
        Err(_) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn redact(value: &mut Value, fields: &[String]) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if fields.iter().any(|f| f.eq_ignore_ascii_case(key)) {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    redact(v, fields);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| redact(v, fields)),
        _ => {}
    }
}

fn client_address(connect: Option<&ConnectInfo<SocketAddr>>, headers: &HeaderMap) -> Option<String> {
    if let Some(ConnectInfo(addr)) = connect {
        return Some(addr.to_string());
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
