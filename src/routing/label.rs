//! Route labels for metrics and access logs.
//!
//! # Responsibilities
//! - Turn the framework's matched route pattern into a bounded label
//! - Collapse "no route" and "catch-all answered 404" into one sentinel
//!
//! # Design Decisions
//! - Raw request paths never become labels; the label set is the declared
//!   route patterns plus [`UNMATCHED`]
//! - Resolution is a pure function of (pattern, status), so repeated
//!   identical requests always classify the same way

use std::fmt;

/// Sentinel label for requests that did not resolve to a declared route.
pub const UNMATCHED: &str = "__unmatched__";

/// Endpoint identity used as a metric/log dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteLabel {
    /// A route pattern declared on the router, e.g. `/users/{id}`.
    Route(String),
    /// No declared route handled the request.
    Unmatched,
}

impl RouteLabel {
    /// Resolve the label for a finished request.
    ///
    /// `matched` is the router's matched pattern, `None` when the request
    /// fell through to the fallback.
    pub fn resolve(matched: Option<&str>, status: u16) -> Self {
        match matched {
            None => RouteLabel::Unmatched,
            Some(pattern) if status == 404 && is_catch_all(pattern) => RouteLabel::Unmatched,
            Some(pattern) => RouteLabel::Route(pattern.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RouteLabel::Route(pattern) => pattern,
            RouteLabel::Unmatched => UNMATCHED,
        }
    }

    pub fn is_unmatched(&self) -> bool {
        matches!(self, RouteLabel::Unmatched)
    }
}

impl fmt::Display for RouteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when the last segment of `pattern` is a wildcard capture
/// (`{*rest}`) or a literal `*`.
pub fn is_catch_all(pattern: &str) -> bool {
    let last = pattern.rsplit('/').next().unwrap_or(pattern);
    last == "*" || (last.starts_with("{*") && last.ends_with('}'))
}
