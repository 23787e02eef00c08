//! Tests for GET /license/devices and DELETE /license/devices/{device_id}.

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{app, create_pro_license, create_test_app_state, delete, get, post_json, queries};

#[tokio::test]
async fn list_unknown_license_is_not_found() {
    let state = create_test_app_state();
    let app = app(state);

    let (status, body) = get(&app, "/license/devices?license_key=missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "license_not_found");
}

#[tokio::test]
async fn list_orders_devices_by_activation_time() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        let license = create_pro_license(&conn, "PRO-L", 5, None);
        for (device, offset) in [("second", 200), ("first", 300), ("third", 100)] {
            let activation =
                queries::create_activation(&conn, &license.id, device, Some("Box")).unwrap();
            conn.execute(
                "UPDATE activations SET activated_at = activated_at - ?1 WHERE id = ?2",
                rusqlite::params![offset, activation.id],
            )
            .unwrap();
        }
    }
    let app = app(state);

    let (status, body) = get(&app, "/license/devices?license_key=PRO-L").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let ids: Vec<&str> = body["devices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["device_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn remove_returns_post_removal_list() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_pro_license(&conn, "PRO-R", 5, None);
    }
    let app = app(state.clone());

    for device in ["a-one", "b-two"] {
        let (status, _) = post_json(
            &app,
            "/license/activate",
            json!({"license_key": "PRO-R", "device_id": device}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = delete(&app, "/license/devices/a-one?license_key=PRO-R").await;
    assert_eq!(status, StatusCode::OK);

    let devices = body["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["device_id"], "b-two");
}

#[tokio::test]
async fn remove_is_idempotent() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        let license = create_pro_license(&conn, "PRO-I", 5, None);
        queries::create_activation(&conn, &license.id, "keeper", None).unwrap();
    }
    let app = app(state);

    for _ in 0..2 {
        let (status, body) = delete(&app, "/license/devices/ghost?license_key=PRO-I").await;
        assert_eq!(status, StatusCode::OK, "absent binding is not an error");
        assert_eq!(body["devices"].as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn remove_unknown_license_is_not_found() {
    let state = create_test_app_state();
    let app = app(state);

    let (status, body) = delete(&app, "/license/devices/any?license_key=missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "license_not_found");
}
