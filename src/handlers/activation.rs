//! Device activation and validation against a license's device quota.

use axum::extract::State;
use serde::Deserialize;

use crate::clock;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;

use super::LicenseResponse;

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub license_key: String,
    pub device_id: String,
    pub device_name: Option<String>,
    pub current_version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub license_key: String,
    pub device_id: String,
    pub current_version: Option<String>,
}

/// POST /license/activate
///
/// Binds the device to the license, enforcing `max_devices`. Re-activation
/// by an already-bound device refreshes its seen-time without consuming
/// quota.
pub async fn activate_license(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<LicenseResponse>> {
    let mut conn = state.db.get()?;

    let license = queries::get_license_by_key(&conn, &req.license_key)?
        .ok_or(AppError::LicenseNotFound)?;
    if license.trial_expired(clock::now_ts()) {
        return Err(AppError::TrialExpired);
    }

    match queries::activate_device(
        &mut conn,
        &license,
        &req.device_id,
        req.device_name.as_deref(),
    )? {
        queries::ActivationOutcome::Created(activation) => {
            tracing::info!(
                license_key = %license.license_key,
                device_id = %activation.device_id,
                "device activated"
            );
        }
        queries::ActivationOutcome::Existing(_) => {}
    }

    let envelope = state.issuer.issue(&license)?;
    Ok(Json(LicenseResponse::new(envelope)))
}

/// POST /license/validate
///
/// Requires a pre-existing activation; does not implicitly activate.
/// Refreshes the device's seen-time on success.
pub async fn validate_license(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<LicenseResponse>> {
    let conn = state.db.get()?;

    let license = queries::get_license_by_key(&conn, &req.license_key)?
        .ok_or(AppError::LicenseNotFound)?;

    let activation = queries::get_activation(&conn, &license.id, &req.device_id)?
        .ok_or(AppError::ActivationNotFound)?;

    if license.trial_expired(clock::now_ts()) {
        return Err(AppError::TrialExpired);
    }

    queries::touch_activation(&conn, &activation.id)?;

    let envelope = state.issuer.issue(&license)?;
    Ok(Json(LicenseResponse::new(envelope)))
}
