use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use rstest::rstest;
use scheddy_core::models::{Role, SessionCategory, SessionType};
use serde_json::json;

use crate::test_utils::{caller, get, post, put, session_type, TestApp, MENTOR, STAFF, STUDENT};

fn ids(categories: &[SessionCategory]) -> Vec<(String, Vec<String>)> {
    categories
        .iter()
        .map(|c| {
            (
                c.category.clone(),
                c.items.iter().map(|t| t.id.clone()).collect(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_lists_eligible_types_by_category() {
    let app = TestApp::new().await;
    let mut retired = session_type("retired", "Ground", 30, 0);
    retired.bookable = false;
    app.store.add_session_type(retired).await;
    app.store.add_session_type(session_type("brief", "Ground", 15, 3)).await;

    let response = get(&app.server, "/api/session-types", STUDENT).await;
    response.assert_status_ok();

    assert_eq!(
        ids(&response.json::<Vec<SessionCategory>>()),
        vec![
            ("Ground".to_string(), vec!["short".to_string()]),
            ("Flight".to_string(), vec!["long".to_string()]),
            ("Ground".to_string(), vec!["brief".to_string()]),
        ]
    );
}

#[tokio::test]
async fn test_listing_respects_allowed_types() {
    let app = TestApp::new().await;
    let mut restricted = caller(102, Role::Student);
    restricted.allowed_session_types = Some(vec!["long".to_string()]);
    app.store.add_caller("restricted-token", restricted).await;

    let categories = get(&app.server, "/api/session-types", "restricted-token")
        .await
        .json::<Vec<SessionCategory>>();
    assert_eq!(
        ids(&categories),
        vec![("Flight".to_string(), vec!["long".to_string()])]
    );
}

#[rstest]
#[case(STUDENT)]
#[case(MENTOR)]
#[tokio::test]
async fn test_only_staff_create_types(#[case] token: &str) {
    let app = TestApp::new().await;

    post(&app.server, "/api/session-types", token)
        .json(&json!({ "name": "Checkride", "category": "Flight", "lengthMinutes": 120 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_staff_manage_types() {
    let app = TestApp::new().await;

    let response = post(&app.server, "/api/session-types", STAFF)
        .json(&json!({ "name": "Checkride", "category": "Flight", "lengthMinutes": 120 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created = response.json::<SessionType>();
    assert_eq!(created.length_minutes, 120);
    assert_eq!(created.min_rating, 2);
    assert!(created.bookable);

    let response = put(&app.server, &format!("/api/session-types/{}", created.id), STAFF)
        .json(&json!({
            "name": "Checkride",
            "category": "Flight",
            "lengthMinutes": 90,
            "bookable": false,
        }))
        .await;
    response.assert_status_ok();
    let updated = response.json::<SessionType>();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.length_minutes, 90);
    assert!(!updated.bookable);

    put(&app.server, "/api/session-types/missing", STAFF)
        .json(&json!({ "name": "X", "category": "Y", "lengthMinutes": 30 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rejects_invalid_drafts() {
    let app = TestApp::new().await;

    let response = post(&app.server, "/api/session-types", STAFF)
        .json(&json!({ "name": "Nothing", "category": "Ground", "lengthMinutes": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<serde_json::Value>(),
        json!({ "error": "Validation error: length must be at least one minute" })
    );
}
