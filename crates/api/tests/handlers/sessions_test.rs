use axum::http::StatusCode;
use axum_test::TestServer;
use pretty_assertions::assert_eq;
use scheddy_core::config::BookingConfig;
use scheddy_core::models::Session;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::test_utils::{
    at, get, patch, post, put, test_config, TestApp, MENTOR, OTHER_STUDENT, STAFF, STUDENT, ZONE,
};

async fn book(server: &TestServer, token: &str, type_id: &str, mentor_id: i64, hour: u32) -> Session {
    let response = post(server, "/api/bookings", token)
        .json(&json!({
            "sessionTypeId": type_id,
            "slot": { "start": at(16, hour, 0), "mentorId": mentor_id },
            "timezone": ZONE,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Session>()
}

#[tokio::test]
async fn test_book_session() {
    let app = TestApp::new().await;

    let session = book(&app.server, STUDENT, "long", 1, 14).await;
    assert_eq!(session.mentor_id, 1);
    assert_eq!(session.student_id, 100);
    assert_eq!(session.start, at(16, 14, 0));
    assert!(!session.cancelled);

    assert_eq!(app.store.sessions().await, vec![session]);
}

#[tokio::test]
async fn test_taken_slot_conflicts() {
    let app = TestApp::new().await;
    book(&app.server, STUDENT, "long", 1, 14).await;

    let response = post(&app.server, "/api/bookings", OTHER_STUDENT)
        .json(&json!({
            "sessionTypeId": "short",
            "slot": { "start": at(16, 14, 30), "mentorId": 1 },
            "timezone": ZONE,
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "The selected slot is no longer available" })
    );
}

#[tokio::test]
async fn test_booking_cap() {
    let app = TestApp::new().await;
    book(&app.server, STUDENT, "short", 1, 14).await;
    book(&app.server, STUDENT, "short", 2, 14).await;

    let response = post(&app.server, "/api/bookings", STUDENT)
        .json(&json!({
            "sessionTypeId": "short",
            "slot": { "start": at(16, 16, 0), "mentorId": 1 },
            "timezone": ZONE,
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Booking limit reached: at most 2 pending sessions allowed" })
    );
}

#[tokio::test]
async fn test_invalid_timezone_and_unknown_type() {
    let app = TestApp::new().await;

    let response = post(&app.server, "/api/bookings", STUDENT)
        .json(&json!({
            "sessionTypeId": "short",
            "slot": { "start": at(16, 14, 0), "mentorId": 1 },
            "timezone": "Mars/Olympus_Mons",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = post(&app.server, "/api/bookings", STUDENT)
        .json(&json!({
            "sessionTypeId": "aerobatics",
            "slot": { "start": at(16, 14, 0), "mentorId": 1 },
            "timezone": ZONE,
        }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reschedule_moves_session() {
    let app = TestApp::new().await;
    let session = book(&app.server, STUDENT, "long", 1, 14).await;

    let response = put(&app.server, &format!("/api/sessions/{}", session.id), STUDENT)
        .json(&json!({
            "sessionTypeId": "long",
            "slot": { "start": at(16, 16, 0), "mentorId": 2 },
            "timezone": ZONE,
        }))
        .await;
    response.assert_status_ok();

    let moved = response.json::<Session>();
    assert_eq!(moved.id, session.id);
    assert_eq!(moved.mentor_id, 2);
    assert_eq!(moved.start, at(16, 16, 0));
}

#[tokio::test]
async fn test_reschedule_cutoff_for_students() {
    let app = TestApp::with_config(BookingConfig {
        reschedule_cutoff_hours: 24,
        ..test_config()
    })
    .await;
    let session = book(&app.server, STUDENT, "long", 1, 14).await;

    let body = json!({
        "sessionTypeId": "long",
        "slot": { "start": at(16, 16, 0), "mentorId": 1 },
        "timezone": ZONE,
    });
    let path = format!("/api/sessions/{}", session.id);

    put(&app.server, &path, STUDENT)
        .json(&body)
        .await
        .assert_status(StatusCode::CONFLICT);

    // The mentor is not bound by the cutoff.
    put(&app.server, &path, MENTOR)
        .json(&body)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_cancel_session() {
    let app = TestApp::new().await;
    let session = book(&app.server, STUDENT, "short", 1, 14).await;
    let path = format!("/api/sessions/{}/cancel", session.id);

    post(&app.server, &path, OTHER_STUDENT)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = post(&app.server, &path, STUDENT)
        .json(&json!({ "reason": "Weather" }))
        .await;
    response.assert_status_ok();
    let cancelled = response.json::<Session>();
    assert!(cancelled.cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Weather"));
    assert_eq!(cancelled.cancellation_user_level, Some(10));

    post(&app.server, &path, STUDENT)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // The freed time can be booked again.
    book(&app.server, OTHER_STUDENT, "short", 1, 14).await;
}

#[tokio::test]
async fn test_cancel_without_body() {
    let app = TestApp::new().await;
    let session = book(&app.server, STUDENT, "short", 1, 14).await;

    let response = post(&app.server, &format!("/api/sessions/{}/cancel", session.id), STAFF).await;
    response.assert_status_ok();

    let cancelled = response.json::<Session>();
    assert_eq!(cancelled.cancellation_reason, None);
    assert_eq!(cancelled.cancellation_user_level, Some(30));
}

#[tokio::test]
async fn test_get_session_visibility() {
    let app = TestApp::new().await;
    let session = book(&app.server, STUDENT, "short", 1, 14).await;
    let path = format!("/api/sessions/{}", session.id);

    for token in [STUDENT, MENTOR, STAFF] {
        let response = get(&app.server, &path, token).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Session>(), session);
    }

    get(&app.server, &path, OTHER_STUDENT)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    get(&app.server, &format!("/api/sessions/{}", Uuid::new_v4()), STAFF)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_direct_session_creation() {
    let app = TestApp::new().await;
    let body = json!({
        "mentorId": 2,
        "studentId": 101,
        "typeId": "long",
        // Outside the mentor's availability.
        "start": at(17, 9, 0),
        "timezone": ZONE,
    });

    post(&app.server, "/api/sessions", STUDENT)
        .json(&body)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Mentors can only place sessions for themselves.
    let response = post(&app.server, "/api/sessions", MENTOR).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    let session = response.json::<Session>();
    assert_eq!(session.mentor_id, 1);
    assert_eq!(session.student_id, 101);
    assert_eq!(session.created_by, Some(1));

    let response = post(&app.server, "/api/sessions", STAFF).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Session>().mentor_id, 2);
}

#[tokio::test]
async fn test_direct_session_must_start_on_whole_minute() {
    let app = TestApp::new().await;

    let response = post(&app.server, "/api/sessions", MENTOR)
        .json(&json!({
            "mentorId": 1,
            "studentId": 101,
            "typeId": "short",
            "start": "2026-03-16T18:00:30Z",
            "timezone": ZONE,
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(app.store.sessions().await.is_empty());
}

#[tokio::test]
async fn test_edit_session() {
    let app = TestApp::new().await;
    let session = book(&app.server, STUDENT, "short", 1, 14).await;
    let path = format!("/api/sessions/{}", session.id);
    // Tuesday morning, outside mentor 1's availability.
    let body = json!({
        "date": "2026-03-17",
        "time": { "hour": 9, "minute": 30 },
        "typeId": "long",
    });

    patch(&app.server, &path, STUDENT)
        .json(&body)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = patch(&app.server, &path, MENTOR).json(&body).await;
    response.assert_status_ok();
    let edited = response.json::<Session>();
    assert_eq!(edited.id, session.id);
    assert_eq!(edited.start, at(17, 9, 30));
    assert_eq!(edited.type_id, "long");
    assert_eq!(edited.mentor_id, 1);

    let reassign = json!({
        "date": "2026-03-17",
        "time": { "hour": 9, "minute": 30 },
        "typeId": "long",
        "mentorId": 2,
    });
    patch(&app.server, &path, MENTOR)
        .json(&reassign)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = patch(&app.server, &path, STAFF).json(&reassign).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Session>().mentor_id, 2);

    // Mentor 1 no longer runs the session.
    patch(&app.server, &path, MENTOR)
        .json(&body)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_edit_session_adds_exception() {
    let app = TestApp::new().await;
    let session = book(&app.server, STUDENT, "short", 1, 14).await;

    let response = patch(&app.server, &format!("/api/sessions/{}", session.id), MENTOR)
        .json(&json!({
            "date": "2026-03-16",
            "time": { "hour": 15, "minute": 0 },
            "typeId": "short",
            "addException": true,
        }))
        .await;
    response.assert_status_ok();

    let availability = get(&app.server, "/api/mentors/1/availability", MENTOR)
        .await
        .json::<Value>();
    assert_eq!(
        availability["exceptions"],
        json!({
            "2026-03-16": {
                "available": true,
                "start": { "hour": 14, "minute": 0 },
                "end": { "hour": 15, "minute": 0 },
                "extraRecords": [
                    { "start": { "hour": 15, "minute": 30 }, "end": { "hour": 18, "minute": 0 } }
                ]
            }
        })
    );
}

#[tokio::test]
async fn test_edit_session_overlap_conflicts() {
    let app = TestApp::new().await;
    let first = book(&app.server, STUDENT, "short", 1, 14).await;
    book(&app.server, OTHER_STUDENT, "short", 1, 15).await;

    patch(&app.server, &format!("/api/sessions/{}", first.id), MENTOR)
        .json(&json!({
            "date": "2026-03-16",
            "time": { "hour": 15, "minute": 15 },
            "typeId": "short",
        }))
        .await
        .assert_status(StatusCode::CONFLICT);
}
