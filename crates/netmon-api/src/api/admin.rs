use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use netmon_core::Role;

use crate::api::types::RoleUpdate;
use crate::app::AppState;
use crate::auth::{AuthError, UserSummary};
use crate::error::{api_validation_error, ApiError};

/// `GET /admin/users`
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserSummary>> {
    Json(state.users.list())
}

/// `PUT /admin/users/{username}/role`: takes effect at the user's next login.
pub async fn update_role(
    State(state): State<AppState>,
    Path(username): Path<String>,
    payload: Result<Json<RoleUpdate>, JsonRejection>,
) -> Result<Json<UserSummary>, ApiError> {
    let Json(update) = payload.map_err(|e| api_validation_error(&e.body_text()))?;
    let role = Role::assignable(&update.role).map_err(AuthError::from)?;
    Ok(Json(state.users.set_role(&username, role)?))
}
