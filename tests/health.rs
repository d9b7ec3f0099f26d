//! Infrastructure endpoint behaviour.

use axum::http::{header, Method, StatusCode};
use request_observability::health::{AvailabilityChange, LivenessState, ReadinessState};
use request_observability::http::handlers::PROMETHEUS_CONTENT_TYPE;
use request_observability::RouteLabel;

mod common;

use common::{body_string, get, test_server};

#[tokio::test]
async fn test_readiness_follows_availability_events() {
    let (server, sink) = test_server();
    let router = server.router();

    assert_eq!(get(&router, "/ready").await.status(), StatusCode::OK);

    server
        .events()
        .publish(AvailabilityChange::Readiness(ReadinessState::RefusingTraffic));
    assert_eq!(get(&router, "/ready").await.status(), StatusCode::SERVICE_UNAVAILABLE);

    server
        .events()
        .publish(AvailabilityChange::Readiness(ReadinessState::AcceptingTraffic));
    assert_eq!(get(&router, "/ready").await.status(), StatusCode::OK);

    let ready = RouteLabel::Route("/ready".into());
    assert_eq!(server.metrics().count(&Method::GET, &ready, 200), 2);
    assert_eq!(server.metrics().count(&Method::GET, &ready, 503), 1);
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_liveness_broken_reports_500() {
    let (server, _sink) = test_server();
    let router = server.router();

    assert_eq!(get(&router, "/health").await.status(), StatusCode::OK);

    server
        .events()
        .publish(AvailabilityChange::Liveness(LivenessState::Broken));
    assert_eq!(
        get(&router, "/health").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    // Readiness is independent of liveness.
    assert_eq!(get(&router, "/ready").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_info_reports_build_identity() {
    let (server, sink) = test_server();
    let router = server.router();

    let response = get(&router, "/info").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "service": "test-service",
            "version": "test-version",
            "buildTime": "test-build-time",
        })
    );

    // /info is not an infrastructure path, so it is logged.
    assert_eq!(sink.records().len(), 1);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let (server, _sink) = test_server();
    let router = server.router();

    get(&router, "/info").await;
    get(&router, "/nope").await;

    let response = get(&router, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        PROMETHEUS_CONTENT_TYPE
    );

    let body = body_string(response).await;
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("http_request_duration_seconds_bucket"));
    assert!(body.contains(r#"path="/info""#));
    assert!(body.contains(r#"path="__unmatched__""#));
    assert!(!body.contains("/nope"));
    assert!(body.contains("build_info"));
    assert!(body.contains(r#"service="test-service""#));
}

#[tokio::test]
async fn test_subscribers_see_changes() {
    let (server, _sink) = test_server();
    let mut changes = server.events().subscribe();

    server
        .events()
        .publish(AvailabilityChange::Readiness(ReadinessState::RefusingTraffic));

    assert_eq!(
        changes.recv().await.unwrap(),
        AvailabilityChange::Readiness(ReadinessState::RefusingTraffic)
    );
}
