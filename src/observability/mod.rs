//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every finished request (http::middleware::observe):
//!     → metrics.rs (counter + latency histogram per method/route/status)
//!     → access_log.rs (one structured record unless infrastructure path)
//!
//! Everything else:
//!     → logging.rs (tracing subscriber, JSON or pretty)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all subsystems via the request span
//! - Metrics are cheap (atomic increments after the first request per key)
//! - Observability never fails a request

pub mod access_log;
pub mod logging;
pub mod metrics;

pub use access_log::{AccessLogRecord, AccessLogSink, AccessLogger, Severity, TracingSink};
pub use metrics::{MetricKey, MetricsRegistry};
