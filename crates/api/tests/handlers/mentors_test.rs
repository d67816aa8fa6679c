use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::test_utils::{at, get, put, TestApp, MENTOR, STAFF, STUDENT};

fn tuesday_morning() -> Value {
    json!({
        "tuesday": {
            "available": true,
            "start": { "hour": 9, "minute": 0 },
            "end": { "hour": 11, "minute": 0 }
        }
    })
}

#[test_log::test(tokio::test)]
async fn test_get_availability() {
    let app = TestApp::new().await;

    let response = get(&app.server, "/api/mentors/1/availability", STUDENT).await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({
            "monday": {
                "available": true,
                "start": { "hour": 14, "minute": 0 },
                "end": { "hour": 18, "minute": 0 }
            },
            "exceptions": {}
        })
    );

    get(&app.server, "/api/mentors/99/availability", STUDENT)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn test_mentor_updates_own_availability() {
    let app = TestApp::new().await;

    let response = put(&app.server, "/api/mentors/1/availability", MENTOR)
        .json(&tuesday_morning())
        .await;
    response.assert_status_ok();

    // Monday is gone, Tuesday now offers slots.
    let overview = get(&app.server, "/api/slots", STUDENT).await.json::<Value>();
    let starts: Vec<Value> = overview["table"]["slots"]["long"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|slot| slot["mentorId"] == json!(1))
        .map(|slot| slot["interval"]["start"].clone())
        .collect();
    assert_eq!(starts, vec![json!(at(17, 9, 0)), json!(at(17, 10, 0))]);
}

#[test_log::test(tokio::test)]
async fn test_availability_edit_permissions() {
    let app = TestApp::new().await;

    put(&app.server, "/api/mentors/2/availability", MENTOR)
        .json(&tuesday_morning())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    put(&app.server, "/api/mentors/1/availability", STUDENT)
        .json(&tuesday_morning())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    put(&app.server, "/api/mentors/2/availability", STAFF)
        .json(&tuesday_morning())
        .await
        .assert_status_ok();
}

#[test_log::test(tokio::test)]
async fn test_rejects_inverted_ranges() {
    let app = TestApp::new().await;

    let response = put(&app.server, "/api/mentors/1/availability", MENTOR)
        .json(&json!({
            "friday": {
                "available": true,
                "start": { "hour": 17, "minute": 0 },
                "end": { "hour": 9, "minute": 0 }
            }
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let error = response.json::<Value>()["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Invalid availability: friday"), "{}", error);
}
