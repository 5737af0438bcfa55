use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use netmon_core::DeviceRecord;

use crate::api::types::ScanRequest;
use crate::app::AppState;
use crate::error::{api_validation_error, ApiError};

/// `POST /scan`: run nmap against `target` and replace the inventory.
///
/// The caller waits for the scan; concurrent requests queue behind the
/// running one.
pub async fn run_scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<Vec<DeviceRecord>>, ApiError> {
    let Json(request) = payload.map_err(|e| api_validation_error(&e.body_text()))?;

    match state.orchestrator.scan(&request.target, request.profile).await {
        Ok(outcome) => {
            metrics::counter!("scans_total", "outcome" => "success").increment(1);
            metrics::gauge!("inventory_devices").set(outcome.devices.len() as f64);
            tracing::info!(
                scan_id = %outcome.scan_id,
                devices = outcome.devices.len(),
                duration_ms = outcome.duration.as_millis() as u64,
                "Scan request completed"
            );
            Ok(Json(outcome.devices.to_vec()))
        }
        Err(e) => {
            metrics::counter!("scans_total", "outcome" => "failure").increment(1);
            Err(e.into())
        }
    }
}
