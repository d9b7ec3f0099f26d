//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use request_observability::config::{ServiceConfig, ServiceInfo};
use request_observability::observability::{AccessLogRecord, AccessLogSink, Severity};
use request_observability::HttpServer;
use tower::ServiceExt;

/// Access log sink that keeps every record in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Severity, AccessLogRecord)>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<(Severity, AccessLogRecord)> {
        self.records.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

impl AccessLogSink for MemorySink {
    fn emit(&self, severity: Severity, record: &AccessLogRecord) {
        self.records.lock().unwrap().push((severity, record.clone()));
    }
}

pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.service = ServiceInfo {
        name: "test-service".into(),
        version: "test-version".into(),
        build_time: "test-build-time".into(),
    };
    config
}

pub fn test_server() -> (HttpServer, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let server = HttpServer::with_sink(test_config(), sink.clone()).unwrap();
    (server, sink)
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
