//! Error types for the listdata crate.

use thiserror::Error;

/// Errors raised for structurally invalid requests.
///
/// Data-level oddities (missing fields, type mismatches, empty input) never
/// produce an error; they degrade to documented defaults instead.
#[derive(Debug, Error)]
pub enum ListDataError {
    /// A filter could not be compiled.
    #[error("malformed filter on field '{field}': {reason}")]
    MalformedFilter { field: String, reason: &'static str },

    /// Invalid regular expression pattern in a string filter.
    #[error("invalid regex pattern for field '{field}': {source}")]
    InvalidRegex {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// A sort field has no usable path.
    #[error("malformed sort field at position {position}: empty field path segment")]
    MalformedSort { position: usize },

    /// Cursor token could not be decoded.
    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),

    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for listdata operations.
pub type Result<T> = std::result::Result<T, ListDataError>;
