use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Request-rejection conditions plus internal failures.
///
/// Every domain rejection maps to a distinct HTTP status and a stable
/// machine-readable code string in the response body; clients branch on
/// the code, not the message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("license not found")]
    LicenseNotFound,

    #[error("activation not found")]
    ActivationNotFound,

    #[error("trial expired")]
    TrialExpired,

    #[error("device limit exceeded")]
    DeviceLimitExceeded,

    #[error("activation code not found")]
    ActivationCodeNotFound,

    #[error("activation code expired")]
    ActivationCodeExpired,

    #[error("activation code depleted")]
    ActivationCodeDepleted,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// Stable code string carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::LicenseNotFound => "license_not_found",
            AppError::ActivationNotFound => "activation_not_found",
            AppError::TrialExpired => "trial_expired",
            AppError::DeviceLimitExceeded => "device_limit_exceeded",
            AppError::ActivationCodeNotFound => "activation_code_not_found",
            AppError::ActivationCodeExpired => "activation_code_expired",
            AppError::ActivationCodeDepleted => "activation_code_depleted",
            AppError::BadRequest(_) => "bad_request",
            AppError::Json(_) => "invalid_json",
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rej: JsonRejection) -> Self {
        AppError::BadRequest(rej.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rej: QueryRejection) -> Self {
        AppError::BadRequest(rej.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rej: PathRejection) -> Self {
        AppError::BadRequest(rej.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            AppError::LicenseNotFound
            | AppError::ActivationNotFound
            | AppError::ActivationCodeNotFound => (StatusCode::NOT_FOUND, None),
            AppError::TrialExpired | AppError::DeviceLimitExceeded => (StatusCode::FORBIDDEN, None),
            AppError::ActivationCodeExpired | AppError::ActivationCodeDepleted => {
                (StatusCode::BAD_REQUEST, None)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
            AppError::Json(e) => (StatusCode::BAD_REQUEST, Some(e.to_string())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ErrorResponse {
            error: self.code(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
