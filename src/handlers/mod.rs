mod activation;
mod devices;
mod profile;
mod redeem;
mod trial;
mod updates;

pub use activation::*;
pub use devices::*;
pub use profile::*;
pub use redeem::*;
pub use trial::*;
pub use updates::*;

use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use serde::Serialize;

use crate::db::AppState;
use crate::payload::LicenseEnvelope;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Response wrapper shared by every endpoint that returns a license.
#[derive(Debug, Serialize)]
pub struct LicenseResponse {
    pub status: &'static str,
    pub license: LicenseEnvelope,
}

impl LicenseResponse {
    pub fn new(license: LicenseEnvelope) -> Self {
        Self {
            status: "ok",
            license,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/license/trial/start", post(start_trial))
        .route("/license/activate", post(activate_license))
        .route("/license/validate", post(validate_license))
        .route("/license/profile", get(get_profile))
        .route("/license/devices", get(list_devices))
        .route("/license/devices/{device_id}", delete(remove_device))
        .route("/license/redeem", post(redeem_code))
        .route("/updates/check", post(check_update))
}
