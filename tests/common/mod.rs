//! Test utilities and fixtures for Keywarden integration tests

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

pub use keywarden::db::{AppState, DbPool, create_pool, init_db, queries};
pub use keywarden::handlers;
pub use keywarden::models::*;
pub use keywarden::payload::{IssuerDefaults, LicensePayload, PayloadIssuer};
pub use keywarden::signing::Signer;

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_LATEST_VERSION: &str = "2.0.0";
pub const TEST_MINIMUM_VERSION: &str = "1.5.0";
pub const TEST_DOWNLOAD_URL: &str = "https://example.com/downloads/latest";

/// Issuer configured identically to the one inside the test AppState,
/// for verifying signatures on responses.
pub fn test_issuer() -> PayloadIssuer {
    PayloadIssuer::new(
        Signer::new(TEST_SECRET),
        IssuerDefaults {
            latest_version: TEST_LATEST_VERSION.to_string(),
            minimum_version: TEST_MINIMUM_VERSION.to_string(),
            download_url: TEST_DOWNLOAD_URL.to_string(),
        },
    )
}

/// Path for a throwaway database file. Shared-cache in-memory databases
/// don't mix well with a connection pool, so tests use real temp files.
pub fn temp_db_path() -> String {
    std::env::temp_dir()
        .join(format!("keywarden-test-{}.db", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned()
}

/// AppState backed by a fresh temp-file database.
pub fn create_test_app_state() -> AppState {
    let pool = create_pool(&temp_db_path()).expect("Failed to create test pool");
    {
        let conn = pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize schema");
    }
    AppState {
        db: pool,
        issuer: test_issuer(),
        trial_days: 15,
    }
}

/// Router with all endpoints wired to the given state.
pub fn app(state: AppState) -> Router {
    handlers::router().with_state(state)
}

/// Current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Future timestamp (days from now)
pub fn future_timestamp(days: i64) -> i64 {
    now() + days * 86400
}

/// Past timestamp (days ago)
pub fn past_timestamp(days: i64) -> i64 {
    now() - days * 86400
}

pub fn create_pro_license(
    conn: &Connection,
    license_key: &str,
    max_devices: i64,
    expire_at: Option<i64>,
) -> License {
    queries::create_license(
        conn,
        &CreateLicense {
            license_key: license_key.to_string(),
            user_type: UserType::Pro,
            expire_at,
            trial_started_at: None,
            max_devices,
            notes: None,
            activation_code_id: None,
        },
    )
    .expect("Failed to create test license")
}

pub fn create_trial_license(
    conn: &Connection,
    license_key: &str,
    expire_at: Option<i64>,
) -> License {
    queries::create_license(
        conn,
        &CreateLicense {
            license_key: license_key.to_string(),
            user_type: UserType::Trial,
            expire_at,
            trial_started_at: Some(now()),
            max_devices: 1,
            notes: Some("auto trial".to_string()),
            activation_code_id: None,
        },
    )
    .expect("Failed to create test trial license")
}

pub fn create_code(
    conn: &Connection,
    code: &str,
    valid_days: Option<i64>,
    max_devices: i64,
    usage_limit: Option<i64>,
    expires_at: Option<i64>,
) -> ActivationCode {
    queries::create_activation_code(
        conn,
        &CreateActivationCode {
            code: code.to_string(),
            user_type: UserType::Pro,
            valid_days,
            max_devices,
            usage_limit,
            expires_at,
            notes: None,
        },
    )
    .expect("Failed to create test activation code")
}

/// Fire one request at the router and decode the JSON response.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response should be valid JSON")
    };
    (status, json)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body)).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "DELETE", uri, None).await
}

/// Decode the envelope payload from a response body and check its
/// signature with the test issuer.
pub fn verify_envelope(body: &Value) -> LicensePayload {
    let envelope = &body["license"];
    let payload: LicensePayload = serde_json::from_value(envelope["payload"].clone())
        .expect("Envelope payload should deserialize");
    let signature = envelope["signature"]
        .as_str()
        .expect("Envelope should carry a signature");
    assert!(
        test_issuer()
            .verify(&payload, signature)
            .expect("Signature verification should not fail"),
        "envelope signature should verify against the payload"
    );
    payload
}
