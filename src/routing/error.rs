//! Route registration errors.

use thiserror::Error;

/// Errors returned when a pattern cannot be added to a tree.
///
/// Registration is the only fallible operation on a tree. Lookups never fail;
/// a path without a handler is reported as [`Lookup::NotFound`].
///
/// [`Lookup::NotFound`]: crate::routing::Lookup::NotFound
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("a handler is already registered for '{pattern}'")]
    DuplicateRoute { pattern: String },

    #[error("route '{pattern}' conflicts with existing route '{existing}'")]
    RouteConflict { pattern: String, existing: String },
}

impl RouteError {
    pub(crate) fn invalid(pattern: &str, reason: &'static str) -> Self {
        RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        }
    }

    pub(crate) fn conflict(pattern: &str, existing: &str) -> Self {
        RouteError::RouteConflict {
            pattern: pattern.to_string(),
            existing: existing.to_string(),
        }
    }
}
