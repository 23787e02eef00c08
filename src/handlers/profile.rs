//! Current license state for a client, optionally scoped to a device.

use axum::extract::State;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query};

use super::LicenseResponse;

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub license_key: String,
    pub device_id: Option<String>,
}

/// GET /license/profile?license_key=&device_id=
///
/// When `device_id` is supplied the device must already be activated on
/// the license. Read-only: does not refresh seen-time.
pub async fn get_profile(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<LicenseResponse>> {
    let conn = state.db.get()?;

    let license = queries::get_license_by_key(&conn, &query.license_key)?
        .ok_or(AppError::LicenseNotFound)?;

    if let Some(device_id) = &query.device_id {
        queries::get_activation(&conn, &license.id, device_id)?
            .ok_or(AppError::ActivationNotFound)?;
    }

    let envelope = state.issuer.issue(&license)?;
    Ok(Json(LicenseResponse::new(envelope)))
}
