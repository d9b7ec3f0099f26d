//! Request observability pipeline.
//!
//! Correlation ids, access logging, per-route metrics and readiness for an
//! axum service.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use routing::RouteLabel;
