use axum::extract::State;
use axum::Json;

use netmon_core::AuditEvent;

use crate::app::AppState;

/// `GET /events`: buffered audit events, newest first.
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<AuditEvent>> {
    Json(state.events.newest_first())
}
