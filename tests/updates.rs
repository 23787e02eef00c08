//! Tests for POST /updates/check.

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{
    TEST_DOWNLOAD_URL, app, create_pro_license, create_test_app_state, post_json, queries,
    verify_envelope,
};

async fn setup_activated(state: &common::AppState, key: &str) {
    let conn = state.db.get().unwrap();
    let license = create_pro_license(&conn, key, 3, None);
    queries::create_activation(&conn, &license.id, "device-1", None).unwrap();
}

#[tokio::test]
async fn unknown_license_is_not_found() {
    let state = create_test_app_state();
    let app = app(state);

    let (status, body) = post_json(
        &app,
        "/updates/check",
        json!({"license_key": "missing", "device_id": "device-1", "current_version": "1.0.0"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "license_not_found");
}

#[tokio::test]
async fn unactivated_device_is_rejected() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_pro_license(&conn, "PRO-U", 3, None);
    }
    let app = app(state);

    let (status, body) = post_json(
        &app,
        "/updates/check",
        json!({"license_key": "PRO-U", "device_id": "device-1", "current_version": "1.0.0"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "activation_not_found");
}

#[tokio::test]
async fn outdated_client_sees_update() {
    let state = create_test_app_state();
    setup_activated(&state, "PRO-U1").await;
    let app = app(state);

    // Defaults: latest 2.0.0, minimum 1.5.0
    let (status, body) = post_json(
        &app,
        "/updates/check",
        json!({"license_key": "PRO-U1", "device_id": "device-1", "current_version": "1.4.0"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["has_update"], true);
    assert_eq!(body["mandatory"], true);
    assert_eq!(body["latest_version"], "2.0.0");
    assert_eq!(body["download_url"], TEST_DOWNLOAD_URL);
    verify_envelope(&body);
}

#[tokio::test]
async fn current_client_sees_no_update() {
    let state = create_test_app_state();
    setup_activated(&state, "PRO-U2").await;
    let app = app(state);

    let (status, body) = post_json(
        &app,
        "/updates/check",
        json!({"license_key": "PRO-U2", "device_id": "device-1", "current_version": "2.0.0"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_update"], false);
    assert_eq!(body["mandatory"], false);
}

#[tokio::test]
async fn multi_digit_segments_compare_numerically() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        let license = create_pro_license(&conn, "PRO-U3", 3, None);
        queries::create_activation(&conn, &license.id, "device-1", None).unwrap();
        // Per-license override with a multi-digit minor version
        conn.execute(
            "UPDATE licenses SET latest_version = '1.10', minimum_version = '1.10' WHERE id = ?1",
            rusqlite::params![license.id],
        )
        .unwrap();
    }
    let app = app(state);

    // Lexicographically "1.9" > "1.10"; numerically it is older.
    let (status, body) = post_json(
        &app,
        "/updates/check",
        json!({"license_key": "PRO-U3", "device_id": "device-1", "current_version": "1.9"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_update"], true);
    assert_eq!(body["mandatory"], true);
    assert_eq!(body["latest_version"], "1.10");
}

#[tokio::test]
async fn per_license_download_override_is_returned() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        let license = create_pro_license(&conn, "PRO-U4", 3, None);
        queries::create_activation(&conn, &license.id, "device-1", None).unwrap();
        conn.execute(
            "UPDATE licenses SET download_url = 'https://mirror.example.com/app' WHERE id = ?1",
            rusqlite::params![license.id],
        )
        .unwrap();
    }
    let app = app(state);

    let (_, body) = post_json(
        &app,
        "/updates/check",
        json!({"license_key": "PRO-U4", "device_id": "device-1", "current_version": "2.0.0"}),
    )
    .await;

    assert_eq!(body["download_url"], "https://mirror.example.com/app");
}
