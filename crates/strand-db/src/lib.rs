//! # strand-db
//!
//! Deduplicated libSQL persistence of causal-network graphs.
//!
//! Handles all relational state: controlled vocabularies and their ontology
//! links, equivalence classes, the seven content-addressed entity kinds and
//! network envelopes. [`service::GraphStore`] is the facade; repository modules
//! under [`repos`] add methods to it via `impl GraphStore` blocks.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) in local mode.

pub mod cache;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod telemetry;
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle.
///
/// Wraps a libSQL database and its single connection. Provides ID generation
/// and explicit transaction control for the store's unit of work.
pub struct GraphDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl GraphDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let graph_db = Self { db, conn };
        graph_db.run_migrations().await?;
        Ok(graph_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"net-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("generate_id returned no row".into()))?;
        Ok(row.get::<String>(0)?)
    }

    /// Whether a transaction is currently open on the connection.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Open a transaction unless one is already open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if `BEGIN` fails.
    pub async fn begin(&self) -> Result<(), DatabaseError> {
        if !self.in_transaction() {
            self.conn.execute("BEGIN", ()).await?;
        }
        Ok(())
    }

    /// Commit the open transaction, if any.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if `COMMIT` fails.
    pub async fn commit(&self) -> Result<(), DatabaseError> {
        if self.in_transaction() {
            self.conn.execute("COMMIT", ()).await?;
        }
        Ok(())
    }

    /// Roll back the open transaction, if any.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if `ROLLBACK` fails.
    pub async fn rollback(&self) -> Result<(), DatabaseError> {
        if self.in_transaction() {
            self.conn.execute("ROLLBACK", ()).await?;
        }
        Ok(())
    }
}
