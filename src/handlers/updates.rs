//! Client update gate: is a newer version available, and is the current
//! one still acceptable.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::payload::LicenseEnvelope;
use crate::version;

#[derive(Debug, Deserialize)]
pub struct UpdateCheckRequest {
    pub license_key: String,
    pub device_id: String,
    pub current_version: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateCheckResponse {
    pub status: &'static str,
    pub has_update: bool,
    pub mandatory: bool,
    pub latest_version: String,
    pub download_url: String,
    pub license: LicenseEnvelope,
}

/// POST /updates/check
///
/// The calling device must already be activated; this endpoint never
/// activates implicitly.
pub async fn check_update(
    State(state): State<AppState>,
    Json(req): Json<UpdateCheckRequest>,
) -> Result<Json<UpdateCheckResponse>> {
    let conn = state.db.get()?;

    let license = queries::get_license_by_key(&conn, &req.license_key)?
        .ok_or(AppError::LicenseNotFound)?;

    queries::get_activation(&conn, &license.id, &req.device_id)?
        .ok_or(AppError::ActivationNotFound)?;

    let versions = state.issuer.effective_versions(&license);
    let has_update = version::is_older(&req.current_version, &versions.latest_version);
    let mandatory = version::is_older(&req.current_version, &versions.minimum_version);

    let envelope = state.issuer.issue(&license)?;

    Ok(Json(UpdateCheckResponse {
        status: "ok",
        has_update,
        mandatory,
        latest_version: versions.latest_version,
        download_url: versions.download_url,
        license: envelope,
    }))
}
