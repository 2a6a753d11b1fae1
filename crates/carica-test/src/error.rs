//! Test error types.

use carica_core::CaricaError;
use thiserror::Error;

/// Errors raised while building, sending or reading test requests.
#[derive(Debug, Error)]
pub enum TestError {
    /// The URI could not be parsed.
    #[error("Invalid URI `{uri}`: {reason}")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A header name or value was rejected.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Form encoding failed.
    #[error("Form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    /// The body was not valid UTF-8.
    #[error("Body is not UTF-8: {0}")]
    BodyRead(#[from] std::str::Utf8Error),

    /// The handler returned an error instead of a response.
    #[error("Pipeline failed: {0}")]
    Pipeline(#[from] CaricaError),
}
