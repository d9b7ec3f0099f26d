//! Route classification.
//!
//! # Data Flow
//! ```text
//! axum router matches request
//!     → MatchedPath extension (or none, for the fallback)
//!     → handler runs, status known
//!     → label.rs resolves RouteLabel
//!     → metrics + access log dimensions
//! ```

pub mod label;

pub use label::{RouteLabel, UNMATCHED};
