//! The store facade.
//!
//! `GraphStore` wraps `GraphDb` (raw database access), a resource fetcher, a
//! canonicalizer and the two process-local caches. All repo methods are
//! implemented as `impl GraphStore` blocks under [`crate::repos`].
//!
//! Deduplicated rows follow a unit-of-work protocol:
//! 1. `get_or_create_*` stages new rows (cached immediately, not yet written)
//! 2. [`GraphStore::flush`] writes staged rows inside the open transaction
//! 3. [`GraphStore::commit`] flushes and commits
//! 4. [`GraphStore::rollback`] discards the transaction and evicts every row
//!    created since the last commit from the caches

use std::sync::Arc;

use strand_config::StrandConfig;
use strand_core::canonical::{BelCanonicalizer, Canonicalizer};
use strand_core::entities::DEFAULT_ENCODING;
use strand_core::enums::EntityKind;
use strand_resource::{HttpFetcher, ResourceFetcher};

use crate::GraphDb;
use crate::cache::{CacheStats, EntityCache, ResourceCache, StagedRow};
use crate::error::DatabaseError;

/// Behavior switches for a store instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Encoding given to namespace entries that declare none.
    pub default_encoding: String,
    /// Namespace resource for `GOCC` locations a graph does not declare.
    pub location_fallback_url: Option<String>,
    /// Default for [`GraphStore::insert`].
    pub deep_decomposition: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_encoding: DEFAULT_ENCODING.to_string(),
            location_fallback_url: None,
            deep_decomposition: false,
        }
    }
}

impl StoreOptions {
    #[must_use]
    pub fn from_config(config: &StrandConfig) -> Self {
        Self {
            default_encoding: config.resources.default_encoding.clone(),
            location_fallback_url: config.resources.location_fallback().map(String::from),
            deep_decomposition: config.general.deep_decomposition,
        }
    }
}

/// Deduplicating graph store. Single writer: every cache-mutating method takes `&mut self`.
pub struct GraphStore {
    db: GraphDb,
    pub(crate) fetcher: Arc<dyn ResourceFetcher>,
    pub(crate) canonicalizer: Box<dyn Canonicalizer>,
    pub(crate) options: StoreOptions,
    pub(crate) resources: ResourceCache,
    pub(crate) entities: EntityCache,
}

impl GraphStore {
    /// Open the configured database, fetching resources through `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open(
        config: &StrandConfig,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Result<Self, DatabaseError> {
        let db = GraphDb::open_local(&config.database.path).await?;
        Ok(Self::from_db(db, fetcher).with_options(StoreOptions::from_config(config)))
    }

    /// Open the configured database with an HTTP fetcher built from the same config.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the HTTP
    /// client cannot be built.
    pub async fn open_http(config: &StrandConfig) -> Result<Self, DatabaseError> {
        let fetcher = HttpFetcher::from_config(&config.resources)?;
        Self::open(config, Arc::new(fetcher)).await
    }

    /// Open a local database with default options.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(
        db_path: &str,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Result<Self, DatabaseError> {
        let db = GraphDb::open_local(db_path).await?;
        Ok(Self::from_db(db, fetcher))
    }

    /// Create from an existing `GraphDb`.
    #[must_use]
    pub fn from_db(db: GraphDb, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            db,
            fetcher,
            canonicalizer: Box::new(BelCanonicalizer),
            options: StoreOptions::default(),
            resources: ResourceCache::default(),
            entities: EntityCache::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_canonicalizer(mut self, canonicalizer: Box<dyn Canonicalizer>) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &GraphDb {
        &self.db
    }

    #[must_use]
    pub const fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Entity cache counters.
    #[must_use]
    pub const fn cache_stats(&self) -> CacheStats {
        self.entities.stats()
    }

    /// Number of rows of `kind` held in the process cache.
    #[must_use]
    pub fn cached_entities(&self, kind: EntityKind) -> usize {
        self.entities.cached(kind)
    }

    // ── Unit of work ───────────────────────────────────────────────

    /// Open a unit of work (a transaction) unless one is already open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the transaction cannot be started.
    pub async fn begin(&self) -> Result<(), DatabaseError> {
        self.db.begin().await
    }

    /// Write every staged row, opening a transaction if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any insert fails. The staged rows stay cached
    /// until [`Self::rollback`] evicts them.
    pub async fn flush(&mut self) -> Result<(), DatabaseError> {
        if !self.entities.has_staged() {
            return Ok(());
        }
        self.db.begin().await?;
        let staged = self.entities.take_staged();
        let count = staged.len();
        for row in &staged {
            match row {
                StagedRow::Author(author) => self.write_author(author).await?,
                StagedRow::Citation(citation) => self.write_citation(citation).await?,
                StagedRow::Evidence(evidence) => self.write_evidence(evidence).await?,
                StagedRow::Modification(modification) => {
                    self.write_modification(modification).await?;
                }
                StagedRow::TermInstance(term) => self.write_term_instance(term).await?,
                StagedRow::Property(property) => self.write_property(property).await?,
                StagedRow::StatementEdge(edge) => self.write_statement_edge(edge).await?,
            }
        }
        tracing::debug!(rows = count, "flushed staged rows");
        Ok(())
    }

    /// Flush and commit the unit of work.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the flush or the commit fails.
    pub async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.flush().await?;
        self.db.commit().await?;
        self.entities.mark_committed();
        Ok(())
    }

    /// Commit a vocabulary-side write opened with [`GraphDb::begin`], or roll
    /// it back when `result` is an error.
    pub(crate) async fn finish_write<T>(
        &self,
        result: Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                self.db.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.db.rollback().await {
                    tracing::warn!(error = %rollback, "rollback after failed write also failed");
                }
                Err(err)
            }
        }
    }

    /// Roll back the unit of work and evict its rows from the caches.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the rollback fails; the caches are
    /// purged regardless.
    pub async fn rollback(&mut self) -> Result<(), DatabaseError> {
        let evicted = self.entities.evict_uncommitted();
        tracing::debug!(evicted, "rolled back unit of work");
        self.db.rollback().await
    }
}
