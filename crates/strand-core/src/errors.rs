//! Cross-cutting error types for Strand.
//!
//! Domain-specific errors (e.g., `DatabaseError`, `ResourceError`) are defined
//! in their respective crates and wrap `CoreError` where needed.

use thiserror::Error;

/// Errors that can be raised by any Strand crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A value could not be serialized into its canonical form (or decoded back).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A graph document failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}
