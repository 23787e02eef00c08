//! Trial lifecycle: one trial grant per device, enforced by deriving the
//! license key from the device identifier.

use axum::extract::State;
use serde::Deserialize;

use crate::clock;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{CreateLicense, UserType};

use super::LicenseResponse;

#[derive(Debug, Deserialize)]
pub struct TrialStartRequest {
    pub device_id: String,
    pub device_name: Option<String>,
    pub current_version: Option<String>,
}

fn trial_key(device_id: &str) -> String {
    format!("trial-{}", device_id)
}

/// POST /license/trial/start
///
/// Idempotent: repeated requests from the same device return the current
/// payload unchanged. The trial window is never extended and the record
/// is never reset.
pub async fn start_trial(
    State(state): State<AppState>,
    Json(req): Json<TrialStartRequest>,
) -> Result<Json<LicenseResponse>> {
    let conn = state.db.get()?;
    let license_key = trial_key(&req.device_id);

    let license = match queries::get_license_by_key(&conn, &license_key)? {
        Some(license) => license,
        None => {
            let now = clock::now_ts();
            let input = CreateLicense {
                license_key: license_key.clone(),
                user_type: UserType::Trial,
                expire_at: Some(clock::days_from_now(state.trial_days)),
                trial_started_at: Some(now),
                max_devices: 1,
                notes: Some("auto trial".to_string()),
                activation_code_id: None,
            };
            match queries::create_license(&conn, &input) {
                Ok(license) => {
                    tracing::info!(license_key = %license.license_key, "trial license created");
                    license
                }
                // Lost a race with a concurrent start from the same
                // device; the winner's record is the answer.
                Err(AppError::Database(e)) if is_unique_violation(&e) => {
                    queries::get_license_by_key(&conn, &license_key)?.ok_or_else(|| {
                        AppError::Internal("trial license vanished after conflict".to_string())
                    })?
                }
                Err(e) => return Err(e),
            }
        }
    };

    let envelope = state.issuer.issue(&license)?;
    Ok(Json(LicenseResponse::new(envelope)))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
