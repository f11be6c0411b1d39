//! Error types for classgraph operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.

use thiserror::Error;

/// Result type alias for classgraph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error type for graph-side operations: filter loading and configuration.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A filter record named a kind no builtin or registered builder provides
    #[error("Unknown filter kind: {kind}")]
    UnknownFilterKind {
        /// The unrecognized kind string
        kind: String,
    },

    /// A filter record carried parameters its kind cannot accept
    #[error("Invalid parameters for filter '{kind}': {message}")]
    InvalidFilterParams {
        /// Filter kind being built
        kind: String,
        /// What the parameters failed to satisfy
        message: String,
    },

    /// Configuration document failed to parse
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GraphError {
    /// Create an unknown-filter-kind error.
    pub fn unknown_filter_kind(kind: impl Into<String>) -> Self {
        Self::UnknownFilterKind { kind: kind.into() }
    }

    /// Create an invalid-filter-params error.
    pub fn invalid_filter_params(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFilterParams {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-configuration error from a message and optional source.
    pub fn invalid_config<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InvalidConfig {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }
}
