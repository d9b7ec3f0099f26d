//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info)
//!     → request.rs (assign / validate X-Request-ID)
//!     → middleware/recovery.rs (panic → 500)
//!     → middleware/observe.rs (timing, metrics, access log)
//!     → handlers.rs (health, ready, info, metrics) or 404 fallback
//!     → Send to client with X-Request-ID
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{RequestId, RequestIdExt, X_REQUEST_ID};
pub use server::{instrument, AppState, HttpServer, ServerError};
