use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use netmon_core::Role;

use crate::api::types::{Credentials, LoginResponse};
use crate::app::AppState;
use crate::auth::UserSummary;
use crate::error::{api_validation_error, ApiError};

/// `POST /login`: exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(credentials) = payload.map_err(|e| api_validation_error(&e.body_text()))?;

    let role = state
        .users
        .authenticate(&credentials.username, &credentials.password)
        .inspect_err(|_| {
            tracing::info!(username = %credentials.username, "Login rejected");
        })?;
    let issued = state.authenticator.issue(credentials.username.trim(), &role)?;

    tracing::info!(username = %credentials.username, role = %role, "Login succeeded");
    Ok(Json(LoginResponse {
        token: issued.token,
        expires_in: issued.expires_in,
        role,
    }))
}

/// `POST /register`: self-service sign-up. New accounts are Viewers.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    let Json(credentials) = payload.map_err(|e| api_validation_error(&e.body_text()))?;
    let user = state
        .users
        .create(&credentials.username, &credentials.password, Role::Viewer)?;
    Ok((StatusCode::CREATED, Json(user)))
}
