use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use scheddy_core::store::StoreError;
use scheddy_db::mock::repositories::{MockIdentity, MockStore};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::test_utils::{server_for, test_config, TestApp};

#[tokio::test]
async fn test_health_and_version() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));

    let response = app.server.get("/version").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["version"],
        json!(env!("CARGO_PKG_VERSION"))
    );
}

#[tokio::test]
async fn test_ready_reports_store_outage() {
    let mut store = MockStore::new();
    store
        .expect_list_session_types()
        .returning(|| Err(StoreError::Backend(eyre::eyre!("connection refused"))));

    let server = server_for(Arc::new(store), Arc::new(MockIdentity::new()), test_config());

    let response = server.get("/ready").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>(), json!({ "status": "unavailable" }));
}
