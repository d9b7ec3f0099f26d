//! Pipeline stages applied around every route.
//!
//! Outermost first:
//! ```text
//! request_id (http::request) → recovery → observe → timeout → handler
//! ```

pub mod observe;
pub mod recovery;

pub use observe::{observe_middleware, RequestObserver};
pub use recovery::recovery_layer;
