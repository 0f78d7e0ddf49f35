//! Error types for route registration and parameter conversion.

use thiserror::Error;

use crate::router::pattern::ParamKind;

/// Errors that can occur while registering a route.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A placeholder name is empty or not an identifier.
    #[error("Invalid placeholder `{segment}` in route template: {template}")]
    InvalidPlaceholder { template: String, segment: String },

    /// The compiled pattern was rejected, e.g. a placeholder name used twice.
    #[error("Invalid route pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A captured path segment could not be converted to its declared kind.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Cannot convert `{value}` to {kind} for parameter `{name}`")]
pub struct ConversionError {
    pub name: String,
    pub kind: ParamKind,
    pub value: String,
}
