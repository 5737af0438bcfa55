use axum::extract::State;
use axum::Json;

use netmon_core::DeviceRecord;

use crate::app::AppState;

/// `GET /devices`: the inventory from the most recent successful scan.
pub async fn list_devices(State(state): State<AppState>) -> Json<Vec<DeviceRecord>> {
    let snapshot = state.orchestrator.inventory().snapshot().await;
    Json(snapshot.to_vec())
}
