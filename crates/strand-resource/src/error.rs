//! Resource fetching error types.

use thiserror::Error;

/// Errors that can occur when fetching a vocabulary resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The resource body is neither valid JSON nor a valid definition file.
    #[error("parse error: {0}")]
    Parse(String),

    /// Reading a `file://` resource failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No resource is registered under this URL.
    #[error("unknown resource URL: {0}")]
    UnknownUrl(String),
}
