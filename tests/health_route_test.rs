//! Liveness endpoint smoke test.

use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
use tower::util::ServiceExt;

use dsb_backoffice::health::health;

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = Router::new().route("/api/health", get(health));

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
}
