//! Request correlation.
//!
//! # Responsibilities
//! - Reuse a well-formed inbound `X-Request-ID`, otherwise generate one
//! - Make the id available to every later stage of the same request
//! - Echo the id on the response
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Malformed inbound ids are replaced silently, never rejected, so
//!   untrusted header content never reaches logs or metrics
//! - The id lives in request extensions and in a `tracing` span around the
//!   downstream future; both are dropped with the request

use std::fmt;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the correlation id in both directions.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Longest inbound id that is reused.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Validated per-request correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Accept `raw` if, once trimmed, it is 1..=128 chars of `[A-Za-z0-9._-]`.
    pub fn parse(raw: &str) -> Option<Self> {
        let candidate = raw.trim();
        let valid = !candidate.is_empty()
            && candidate.len() <= MAX_REQUEST_ID_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
        valid.then(|| Self(candidate.to_string()))
    }

    /// Random UUID v4.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse the inbound header value when valid, otherwise generate.
    pub fn resolve(inbound: Option<&HeaderValue>) -> Self {
        inbound
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access to the correlation id from a request.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&RequestId>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&RequestId> {
        self.extensions().get::<RequestId>()
    }
}

/// Outermost pipeline stage: assign the id, run the rest of the request
/// inside its span, and stamp the response.
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = RequestId::resolve(request.headers().get(&X_REQUEST_ID));
    let header = request_id.header_value();

    match &header {
        Some(value) => {
            request.headers_mut().insert(X_REQUEST_ID, value.clone());
        }
        None => {
            request.headers_mut().remove(X_REQUEST_ID);
        }
    }
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
