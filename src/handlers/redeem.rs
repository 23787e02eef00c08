//! Activation code redemption.
//!
//! Redeeming a code for the first time creates a license whose key equals
//! the code string; later redemptions renew/upgrade that license in
//! place, bounded by the code's own usage limit.

use axum::extract::State;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;

use super::LicenseResponse;

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub activation_code: String,
    pub device_id: String,
    pub device_name: Option<String>,
    pub current_version: Option<String>,
}

/// POST /license/redeem
///
/// Redemption does not bind the calling device; the client activates
/// against the granted key afterwards.
pub async fn redeem_code(
    State(state): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<LicenseResponse>> {
    let mut conn = state.db.get()?;

    let license = queries::redeem_activation_code(&mut conn, &req.activation_code)?;
    tracing::info!(
        license_key = %license.license_key,
        user_type = %license.user_type,
        "activation code redeemed"
    );

    let envelope = state.issuer.issue(&license)?;
    Ok(Json(LicenseResponse::new(envelope)))
}
