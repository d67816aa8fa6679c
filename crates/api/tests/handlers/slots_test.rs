use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use scheddy_core::config::BookingConfig;
use scheddy_core::models::{Role, Session};
use scheddy_core::store::StoreError;
use scheddy_db::mock::repositories::MockStore;
use scheddy_db::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::test_utils::{at, caller, get, post, server_for, test_config, TestApp, STUDENT, ZONE};

fn starts(overview: &Value, type_id: &str, mentor_id: i64) -> Vec<Value> {
    overview["table"]["slots"][type_id]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|slot| slot["mentorId"] == json!(mentor_id))
        .map(|slot| slot["interval"]["start"].clone())
        .collect()
}

#[tokio::test]
async fn test_requires_authentication() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/slots").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = get(&app.server, "/api/slots", "nobody").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Authentication error: Invalid or expired token" })
    );
}

#[tokio::test]
async fn test_lists_slots_per_type() {
    let app = TestApp::new().await;

    let response = get(&app.server, "/api/slots", STUDENT).await;
    response.assert_status_ok();
    let overview = response.json::<Value>();

    assert_eq!(overview["pendingSessions"], json!(0));
    assert_eq!(overview["atMaxSessions"], json!(false));

    let short = starts(&overview, "short", 1);
    assert_eq!(short.len(), 8);
    assert_eq!(short[0], json!(at(16, 14, 0)));
    assert_eq!(short[7], json!(at(16, 17, 30)));

    let long = starts(&overview, "long", 2);
    assert_eq!(
        long,
        vec![
            json!(at(16, 14, 0)),
            json!(at(16, 15, 0)),
            json!(at(16, 16, 0)),
            json!(at(16, 17, 0)),
        ]
    );
}

#[tokio::test]
async fn test_session_type_filter() {
    let app = TestApp::new().await;

    let response = get(&app.server, "/api/slots?sessionType=long", STUDENT).await;
    response.assert_status_ok();
    let overview = response.json::<Value>();

    let slots = overview["table"]["slots"].as_object().unwrap();
    assert_eq!(slots.keys().cloned().collect::<Vec<_>>(), vec!["long".to_string()]);
}

#[tokio::test]
async fn test_booked_time_disappears() {
    let app = TestApp::new().await;

    post(&app.server, "/api/bookings", STUDENT)
        .json(&json!({
            "sessionTypeId": "long",
            "slot": { "start": at(16, 14, 0), "mentorId": 1 },
            "timezone": ZONE,
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let overview = get(&app.server, "/api/slots", STUDENT).await.json::<Value>();
    assert_eq!(overview["pendingSessions"], json!(1));

    let short = starts(&overview, "short", 1);
    assert_eq!(short[0], json!(at(16, 15, 0)));
    assert!(!short.contains(&json!(at(16, 14, 30))));
}

#[tokio::test]
async fn test_reschedule_keeps_own_time() {
    let app = TestApp::new().await;

    let session = post(&app.server, "/api/bookings", STUDENT)
        .json(&json!({
            "sessionTypeId": "long",
            "slot": { "start": at(16, 14, 0), "mentorId": 1 },
            "timezone": ZONE,
        }))
        .await
        .json::<Session>();

    let path = format!("/api/slots?reschedule={}", session.id);
    let overview = get(&app.server, &path, STUDENT).await.json::<Value>();
    assert!(starts(&overview, "long", 1).contains(&json!(at(16, 14, 0))));
}

#[tokio::test]
async fn test_cap_reached_returns_empty_table() {
    let app = TestApp::with_config(BookingConfig {
        max_pending_sessions: 1,
        ..test_config()
    })
    .await;

    post(&app.server, "/api/bookings", STUDENT)
        .json(&json!({
            "sessionTypeId": "short",
            "slot": { "start": at(16, 14, 0), "mentorId": 1 },
            "timezone": ZONE,
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let overview = get(&app.server, "/api/slots", STUDENT).await.json::<Value>();
    assert_eq!(overview["atMaxSessions"], json!(true));
    assert_eq!(overview["table"]["slots"], json!({}));
}

#[tokio::test]
async fn test_storage_failure_is_internal_error() {
    let identity = Arc::new(MemoryStore::new());
    identity.add_caller(STUDENT, caller(100, Role::Student)).await;

    let mut store = MockStore::new();
    store
        .expect_list_session_types()
        .returning(|| Err(StoreError::Backend(eyre::eyre!("relation does not exist"))));

    let server = server_for(Arc::new(store), identity, test_config());

    let response = get(&server, "/api/slots", STUDENT).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Internal server error" })
    );
}
