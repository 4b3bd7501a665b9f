//! Schema compilation error types

use thiserror::Error;

/// Result type for schema compilation operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while fetching rows or compiling a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A SPARQL query against the shape store failed to parse or evaluate.
    #[error("row source query failed: {0}")]
    Query(String),

    /// Reading from the underlying store failed.
    #[error("store access failed: {0}")]
    Store(String),

    /// A row violated the row-source contract by omitting a required field.
    #[error("row is missing required field '{0}'")]
    MissingField(&'static str),

    /// A literal could not be parsed into the expected value space.
    #[error("malformed literal for '{field}': '{value}'")]
    MalformedLiteral {
        field: &'static str,
        value: String,
    },

    /// The row stream exceeded the representable index range.
    #[error("too many rows for iteration")]
    TooManyRows,

    /// Serializing the finished document failed.
    #[error("schema serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Loading a shapes file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
