//! Process health subsystem.
//!
//! # Data Flow
//! ```text
//! Availability sources (startup, shutdown signal, operator hooks):
//!     → events.rs (AvailabilityEvents::publish)
//!     → state.rs (Readiness / Liveness holders, overwrite)
//!
//! Health endpoints:
//!     GET /health → Liveness::current → 200 | 500
//!     GET /ready  → Readiness::current → 200 | 503
//! ```
//!
//! # Design Decisions
//! - Holders are owned handles passed to whoever needs them, not globals
//! - Liveness and readiness are independent signals

pub mod events;
pub mod state;

pub use events::{AvailabilityChange, AvailabilityEvents};
pub use state::{Liveness, LivenessState, Readiness, ReadinessState};
