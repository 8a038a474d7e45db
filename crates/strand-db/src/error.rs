//! Database error types for strand-db.

use strand_core::errors::CoreError;
use strand_resource::ResourceError;
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An expected-unique lookup returned no row.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// An expected-unique lookup returned more than one row.
    #[error("{kind} is ambiguous: {key}")]
    AmbiguousResult { kind: &'static str, key: String },

    /// Caller-supplied data is unusable (e.g., a graph without a name).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation is not possible in the current state of the store.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A graph uses a keyword it does not declare.
    #[error("graph does not declare keyword '{keyword}'")]
    UnknownReference { keyword: String },

    /// A network with this name and version is already stored.
    #[error("network {name} v{version} already exists")]
    DuplicateNetwork { name: String, version: String },

    /// A SQL query returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Fetching a remote resource failed.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }
}
