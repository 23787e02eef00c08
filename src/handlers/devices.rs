//! Device listing and removal.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::models::DeviceInfo;

#[derive(Debug, Deserialize)]
pub struct DeviceListQuery {
    pub license_key: String,
}

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub status: &'static str,
    pub devices: Vec<DeviceInfo>,
}

fn device_list(conn: &rusqlite::Connection, license_id: &str) -> Result<DeviceListResponse> {
    let devices = queries::list_activations(conn, license_id)?
        .into_iter()
        .map(DeviceInfo::from)
        .collect();
    Ok(DeviceListResponse {
        status: "ok",
        devices,
    })
}

/// GET /license/devices?license_key=
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceListQuery>,
) -> Result<Json<DeviceListResponse>> {
    let conn = state.db.get()?;
    let license = queries::get_license_by_key(&conn, &query.license_key)?
        .ok_or(AppError::LicenseNotFound)?;
    Ok(Json(device_list(&conn, &license.id)?))
}

/// DELETE /license/devices/{device_id}?license_key=
///
/// Idempotent: removing an unknown device is not an error. Frees one
/// quota slot and returns the post-removal device list.
pub async fn remove_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(query): Query<DeviceListQuery>,
) -> Result<Json<DeviceListResponse>> {
    let conn = state.db.get()?;
    let license = queries::get_license_by_key(&conn, &query.license_key)?
        .ok_or(AppError::LicenseNotFound)?;

    if queries::delete_activation(&conn, &license.id, &device_id)? {
        tracing::info!(
            license_key = %license.license_key,
            device_id = %device_id,
            "device removed"
        );
    }

    Ok(Json(device_list(&conn, &license.id)?))
}
