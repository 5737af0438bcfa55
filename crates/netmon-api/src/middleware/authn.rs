use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::app::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;

/// Resolve the caller's `Identity` from the bearer token.
///
/// The identity is attached to the request for the stages below and to the
/// response so the audit stage can name the subject.
pub async fn auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = match bearer_token(request.headers()).and_then(|t| state.authenticator.verify(t)) {
        Ok(identity) => identity,
        Err(err) => {
            tracing::debug!(path = %request.uri().path(), error = %err, "Authentication failed");
            return ApiError::from(err).into_response();
        }
    };

    request.extensions_mut().insert(identity.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(identity);
    response
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::TokenInvalid("empty bearer token".to_string()));
    }
    Ok(token)
}
