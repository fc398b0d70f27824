//! Error types for state-space construction and search.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SearchResult<T> = Result<T, SearchError>;

/// Everything that can go wrong while parsing a problem or running a search.
///
/// An unreachable goal is not an error: searches report it as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Predicate text that could not be parsed.
    #[error("Malformed predicate `{predicate}`: {detail}")]
    Format { predicate: String, detail: String },

    /// Input that parses but does not fit the configured problem,
    /// e.g. an unknown location or an oversized tile subset.
    #[error("Domain error: {0}")]
    Domain(String),

    /// The configured expansion cap was hit before the search finished.
    #[error("Search stopped after {expanded} expansions (limit {limit})")]
    ResourceExhausted { expanded: usize, limit: usize },
}

impl SearchError {
    pub(crate) fn format(predicate: impl Into<String>, detail: impl Into<String>) -> Self {
        SearchError::Format {
            predicate: predicate.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn domain(msg: impl Into<String>) -> Self {
        SearchError::Domain(msg.into())
    }
}
