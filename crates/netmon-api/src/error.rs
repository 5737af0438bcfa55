//! API error type and helpers.
//!
//! Every failure leaves the server as `{code, message}` JSON with a status
//! matching the code. Internal failures log details server-side and return a
//! generic message; nmap stderr never reaches the client.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use netmon_discover::DiscoverError;

use crate::api::types::ErrorResponse;

/// Structured error returned by handlers and middleware.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    ApiError::new(StatusCode::CONFLICT, code, message)
}

/// Build a 500 from an error whose details stay in the server log.
pub fn api_internal(message: &str, err: &dyn std::error::Error) -> ApiError {
    tracing::error!(error = %err, "{}", message);
    api_internal_message(message)
}

pub fn api_internal_message(message: &str) -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Authentication missing.
pub fn api_unauthorized(message: &str) -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Authentication present but rejected, or authorization denied.
pub fn api_forbidden(message: &str) -> ApiError {
    ApiError::new(StatusCode::FORBIDDEN, "forbidden", message)
}

pub fn api_validation_error(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn api_payload_too_large(limit: usize) -> ApiError {
    ApiError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        "payload_too_large",
        &format!("request body exceeds {limit} bytes"),
    )
}

impl From<DiscoverError> for ApiError {
    fn from(err: DiscoverError) -> Self {
        match &err {
            DiscoverError::InvalidTarget { reason } => api_validation_error(reason),
            DiscoverError::Timeout { secs } => {
                tracing::error!(error = %err, "Scan timed out");
                ApiError::new(
                    StatusCode::GATEWAY_TIMEOUT,
                    "scan_timeout",
                    &format!("scan did not finish within {secs}s"),
                )
            }
            DiscoverError::NmapNotFound { .. }
            | DiscoverError::NmapFailed { .. }
            | DiscoverError::XmlParse(_)
            | DiscoverError::Io(_) => api_internal("scan failed", &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmon_discover::nmap_xml::ParseError;

    #[test]
    fn helpers_build_expected_codes() {
        let cases = [
            (api_not_found("x"), StatusCode::NOT_FOUND, "not_found"),
            (api_conflict("user_exists", "x"), StatusCode::CONFLICT, "user_exists"),
            (api_internal_message("x"), StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            (api_unauthorized("x"), StatusCode::UNAUTHORIZED, "unauthorized"),
            (api_forbidden("x"), StatusCode::FORBIDDEN, "forbidden"),
            (api_validation_error("x"), StatusCode::BAD_REQUEST, "validation_error"),
            (api_payload_too_large(10), StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status, status);
            assert_eq!(err.body.code, code);
        }
    }

    #[test]
    fn scan_errors_map_to_status() {
        let invalid: ApiError = DiscoverError::InvalidTarget {
            reason: "target must not be empty".to_string(),
        }
        .into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.body.message, "target must not be empty");

        let timeout: ApiError = DiscoverError::Timeout { secs: 5 }.into();
        assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.body.code, "scan_timeout");

        let parse: ApiError = DiscoverError::XmlParse(ParseError::Malformed("eof".into())).into();
        assert_eq!(parse.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn nmap_stderr_is_not_exposed() {
        let err: ApiError = DiscoverError::NmapFailed {
            code: 1,
            stderr: "Failed to resolve secret-host.internal".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.code, "internal");
        assert!(!err.body.message.contains("secret-host"));
    }
}
