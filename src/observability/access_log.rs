//! Structured access logging.
//!
//! # Responsibilities
//! - Skip infrastructure endpoints (probes, scrapes)
//! - Choose severity from the response status
//! - Attribute the client address for log purposes
//! - Emit one `http_request` record per remaining request
//!
//! # Design Decisions
//! - Forwarded headers are trusted for attribution only, never for access control
//! - The sink is a trait so the record can be routed anywhere; the default
//!   emits a `tracing` event on target `http`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, Method};
use serde::Serialize;

use crate::config::ServiceInfo;
use crate::routing::RouteLabel;

/// Exact paths that are never access-logged.
pub const INFRA_PATHS: [&str; 3] = ["/health", "/ready", "/metrics"];

/// Any path under this prefix is never access-logged.
pub const INFRA_PREFIX: &str = "/actuator";

pub fn is_infra_path(path: &str) -> bool {
    INFRA_PATHS.contains(&path) || path.starts_with(INFRA_PREFIX)
}

/// Log level of an access record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn from_status(status: u16) -> Self {
        if status >= 500 {
            Severity::Error
        } else if status >= 400 {
            Severity::Warn
        } else {
            Severity::Info
        }
    }
}

/// First non-empty of: first `X-Forwarded-For` entry, `X-Real-IP`, peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let forwarded = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = header("x-real-ip").map(str::trim).filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

/// Everything known about a request once it has finished.
#[derive(Debug, Clone)]
pub struct CompletedRequest {
    pub method: Method,
    pub raw_path: String,
    pub query: String,
    pub route: RouteLabel,
    pub status: u16,
    pub elapsed: Duration,
    pub request_id: String,
    pub client_ip: String,
    pub user_agent: String,
}

/// One access log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogRecord {
    pub service: String,
    pub version: String,
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub raw_path: String,
    pub query: String,
    pub status: u16,
    pub ip: String,
    pub latency_ms: f64,
    pub user_agent: String,
}

/// Destination for access records.
pub trait AccessLogSink: Send + Sync {
    fn emit(&self, severity: Severity, record: &AccessLogRecord);
}

/// Emits records as `tracing` events named `http_request`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AccessLogSink for TracingSink {
    fn emit(&self, severity: Severity, record: &AccessLogRecord) {
        macro_rules! http_request {
            ($level:expr) => {
                tracing::event!(
                    target: "http",
                    $level,
                    service = %record.service,
                    version = %record.version,
                    request_id = %record.request_id,
                    method = %record.method,
                    path = %record.path,
                    raw_path = %record.raw_path,
                    query = %record.query,
                    status = record.status,
                    ip = %record.ip,
                    latency_ms = record.latency_ms,
                    user_agent = %record.user_agent,
                    "http_request"
                )
            };
        }

        match severity {
            Severity::Error => http_request!(tracing::Level::ERROR),
            Severity::Warn => http_request!(tracing::Level::WARN),
            Severity::Info => http_request!(tracing::Level::INFO),
        }
    }
}

/// Decides whether a finished request is logged and builds its record.
#[derive(Clone)]
pub struct AccessLogger {
    service: String,
    version: String,
    sink: Arc<dyn AccessLogSink>,
}

impl AccessLogger {
    pub fn new(info: &ServiceInfo, sink: Arc<dyn AccessLogSink>) -> Self {
        Self {
            service: info.name.clone(),
            version: info.version.clone(),
            sink,
        }
    }

    /// Emit the record for `request` unless its raw path is infrastructure.
    /// Returns the severity used, or `None` when skipped.
    pub fn maybe_log(&self, request: &CompletedRequest) -> Option<Severity> {
        if is_infra_path(&request.raw_path) {
            return None;
        }

        let severity = Severity::from_status(request.status);
        let record = AccessLogRecord {
            service: self.service.clone(),
            version: self.version.clone(),
            request_id: request.request_id.clone(),
            method: request.method.to_string(),
            path: request.route.as_str().to_string(),
            raw_path: request.raw_path.clone(),
            query: request.query.clone(),
            status: request.status,
            ip: request.client_ip.clone(),
            latency_ms: request.elapsed.as_micros() as f64 / 1000.0,
            user_agent: request.user_agent.clone(),
        };
        self.sink.emit(severity, &record);
        Some(severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<(Severity, AccessLogRecord)>>);

    impl AccessLogSink for Collect {
        fn emit(&self, severity: Severity, record: &AccessLogRecord) {
            self.0.lock().unwrap().push((severity, record.clone()));
        }
    }

    fn completed(raw_path: &str, status: u16) -> CompletedRequest {
        CompletedRequest {
            method: Method::GET,
            raw_path: raw_path.into(),
            query: "a=1".into(),
            route: RouteLabel::resolve(None, status),
            status,
            elapsed: Duration::from_millis(12),
            request_id: "abc-123".into(),
            client_ip: "10.0.0.1".into(),
            user_agent: "curl/8".into(),
        }
    }

    #[test]
    fn test_severity_boundaries() {
        let cases = [
            (100, Severity::Info),
            (200, Severity::Info),
            (302, Severity::Info),
            (399, Severity::Info),
            (400, Severity::Warn),
            (404, Severity::Warn),
            (499, Severity::Warn),
            (500, Severity::Error),
            (503, Severity::Error),
            (599, Severity::Error),
        ];
        for (status, want) in cases {
            assert_eq!(Severity::from_status(status), want, "status {status}");
        }
    }

    #[test]
    fn test_infra_paths() {
        assert!(is_infra_path("/health"));
        assert!(is_infra_path("/ready"));
        assert!(is_infra_path("/metrics"));
        assert!(is_infra_path("/actuator"));
        assert!(is_infra_path("/actuator/prometheus"));
        assert!(!is_infra_path("/"));
        assert!(!is_infra_path("/info"));
        assert!(!is_infra_path("/health/deep"));
        assert!(!is_infra_path("/does-not-exist"));
    }

    #[test]
    fn test_client_ip_precedence() {
        let peer: SocketAddr = "192.168.1.5:40000".parse().unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)), "192.168.1.5");
        assert_eq!(client_ip(&headers, None), "");

        headers.insert("x-real-ip", HeaderValue::from_static(" 10.1.1.1 "));
        assert_eq!(client_ip(&headers, Some(peer)), "10.1.1.1");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.2"));
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn test_blank_forwarded_entry_falls_through() {
        let peer: SocketAddr = "192.168.1.5:40000".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("  "));
        assert_eq!(client_ip(&headers, Some(peer)), "192.168.1.5");
    }

    #[test]
    fn test_maybe_log_builds_record() {
        let sink = Arc::new(Collect::default());
        let info = ServiceInfo {
            name: "svc".into(),
            version: "1.0.0".into(),
            build_time: "now".into(),
        };
        let logger = AccessLogger::new(&info, sink.clone());

        assert_eq!(logger.maybe_log(&completed("/does-not-exist", 404)), Some(Severity::Warn));

        let records = sink.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        let (severity, record) = &records[0];
        assert_eq!(*severity, Severity::Warn);
        assert_eq!(record.path, "__unmatched__");
        assert_eq!(record.raw_path, "/does-not-exist");
        assert_eq!(record.service, "svc");
        assert_eq!(record.version, "1.0.0");
        assert_eq!(record.request_id, "abc-123");
        assert_eq!(record.latency_ms, 12.0);
    }

    #[test]
    fn test_infra_never_logged_whatever_status() {
        let sink = Arc::new(Collect::default());
        let logger = AccessLogger::new(&ServiceInfo::default(), sink.clone());

        for status in [200, 404, 500, 503] {
            assert_eq!(logger.maybe_log(&completed("/ready", status)), None);
            assert_eq!(logger.maybe_log(&completed("/actuator/health", status)), None);
        }
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = AccessLogRecord {
            service: "svc".into(),
            version: "1".into(),
            request_id: "r".into(),
            method: "GET".into(),
            path: "/".into(),
            raw_path: "/".into(),
            query: String::new(),
            status: 200,
            ip: "127.0.0.1".into(),
            latency_ms: 1.5,
            user_agent: "ua".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["requestId"], "r");
        assert_eq!(json["rawPath"], "/");
        assert_eq!(json["latencyMs"], 1.5);
        assert_eq!(json["userAgent"], "ua");
    }
}
