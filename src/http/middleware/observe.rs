//! Request timing, metrics and access logging.
//!
//! # Request lifecycle
//! ```text
//! START → ID_ASSIGNED (request_id stage)
//!       → DOWNSTREAM_RUNNING
//!       → DOWNSTREAM_OK | DOWNSTREAM_FAILED (panic) | dropped (client gone)
//!       → FINALIZED: elapsed, RouteLabel, metrics.record, access_log.maybe_log
//! ```
//!
//! FINALIZED runs exactly once on every exit path. A downstream panic is
//! finalized as 500 and then resumed unchanged for the recovery stage; a
//! request whose future is dropped early is finalized from `Drop` as 499.
//! A panic inside FINALIZED itself is contained there.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, State},
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;
use std::net::SocketAddr;

use crate::http::request::RequestIdExt;
use crate::observability::access_log::{client_ip, AccessLogger, CompletedRequest};
use crate::observability::metrics::MetricsRegistry;
use crate::routing::RouteLabel;

/// Status recorded when the client goes away before a response exists.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Finalization target shared by every request.
pub struct RequestObserver {
    metrics: Arc<MetricsRegistry>,
    access_log: AccessLogger,
}

impl RequestObserver {
    pub fn new(metrics: Arc<MetricsRegistry>, access_log: AccessLogger) -> Self {
        Self {
            metrics,
            access_log,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    fn finalize(&self, facts: RequestFacts, status: u16, started: Instant) {
        let elapsed = started.elapsed();
        let route = RouteLabel::resolve(facts.matched.as_deref(), status);

        self.metrics.record(&facts.method, &route, status, elapsed);
        self.access_log.maybe_log(&CompletedRequest {
            method: facts.method,
            raw_path: facts.raw_path,
            query: facts.query,
            route,
            status,
            elapsed,
            request_id: facts.request_id,
            client_ip: facts.client_ip,
            user_agent: facts.user_agent,
        });
    }
}

/// Request data captured before the handler consumes the request.
struct RequestFacts {
    method: Method,
    raw_path: String,
    query: String,
    matched: Option<String>,
    request_id: String,
    client_ip: String,
    user_agent: String,
}

impl RequestFacts {
    fn capture(request: &Request<Body>) -> Self {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            method: request.method().clone(),
            raw_path: request.uri().path().to_string(),
            query: request.uri().query().unwrap_or_default().to_string(),
            matched: request
                .extensions()
                .get::<MatchedPath>()
                .map(|p| p.as_str().to_string()),
            request_id: request
                .request_id()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
            client_ip: client_ip(request.headers(), peer),
            user_agent: request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Guard that finalizes its request exactly once.
struct InFlight {
    observer: Arc<RequestObserver>,
    started: Instant,
    facts: Option<RequestFacts>,
}

impl InFlight {
    fn begin(observer: Arc<RequestObserver>, request: &Request<Body>) -> Self {
        Self {
            observer,
            started: Instant::now(),
            facts: Some(RequestFacts::capture(request)),
        }
    }

    /// Observability is fail-open: a panicking sink is logged and dropped
    /// so it can neither replace the response nor the original panic.
    fn finish(&mut self, status: u16) {
        if let Some(facts) = self.facts.take() {
            let observer = &self.observer;
            let started = self.started;
            let finalized = std::panic::catch_unwind(AssertUnwindSafe(|| {
                observer.finalize(facts, status, started)
            }));
            if finalized.is_err() {
                tracing::error!(status, "observability_failed");
            }
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.facts.is_some() {
            tracing::debug!("request dropped before completion");
            self.finish(CLIENT_CLOSED_REQUEST);
        }
    }
}

/// Pipeline stage that times the downstream handler and finalizes.
pub async fn observe_middleware(
    State(observer): State<Arc<RequestObserver>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut in_flight = InFlight::begin(observer, &request);

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => {
            in_flight.finish(response.status().as_u16());
            response
        }
        Err(panic) => {
            in_flight.finish(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
            std::panic::resume_unwind(panic)
        }
    }
}
