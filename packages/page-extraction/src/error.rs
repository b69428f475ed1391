//! Typed errors for pattern resolution.
//!
//! These never escape [`FieldExtractor::extract`](crate::FieldExtractor::extract):
//! a failing pattern is logged and treated as "no match".

use thiserror::Error;

/// Errors raised while resolving one pattern against a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The structural query could not be parsed
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The document cannot evaluate this kind of query
    #[error("unsupported query `{selector}`: {reason}")]
    Unsupported { selector: String, reason: String },

    /// Document URL could not be parsed
    #[error("invalid document URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
