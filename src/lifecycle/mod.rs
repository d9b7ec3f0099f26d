//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging → Build server → Bind → Serve
//!
//! Shutdown (http::server + shutdown.rs):
//!     Signal received → readiness = RefusingTraffic → stop accepting
//!     → drain in-flight requests → exit (bounded by timeouts.shutdown_secs)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
