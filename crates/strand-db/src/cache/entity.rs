//! Fingerprint-keyed caches for the seven deduplicated entity kinds, plus the
//! rows staged in the open unit of work.

use std::collections::HashMap;
use std::sync::Arc;

use strand_core::entities::{
    Author, Citation, Evidence, Modification, Property, StatementEdge, TermInstance,
};
use strand_core::enums::EntityKind;
use strand_core::fingerprint::Fingerprint;

/// One kind's `fingerprint -> row` map.
#[derive(Debug)]
pub struct KindCache<T> {
    rows: HashMap<Fingerprint, Arc<T>>,
}

impl<T> Default for KindCache<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<T> KindCache<T> {
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<T>> {
        self.rows.get(fingerprint).cloned()
    }

    pub fn insert(&mut self, fingerprint: Fingerprint, row: Arc<T>) {
        self.rows.insert(fingerprint, row);
    }

    pub fn remove(&mut self, fingerprint: &Fingerprint) {
        self.rows.remove(fingerprint);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row created in the current unit of work and not yet written.
#[derive(Debug, Clone)]
pub enum StagedRow {
    TermInstance(Arc<TermInstance>),
    StatementEdge(Arc<StatementEdge>),
    Citation(Arc<Citation>),
    Evidence(Arc<Evidence>),
    Author(Arc<Author>),
    Modification(Arc<Modification>),
    Property(Arc<Property>),
}

/// Cache counters, mostly useful in tests and debug logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the process cache.
    pub hits: u64,
    /// Lookups that went to the store.
    pub store_lookups: u64,
    /// Rows staged for creation.
    pub created: u64,
}

/// Glue between an entity type and its slot in [`EntityCache`].
pub trait CachedEntity: Sized {
    const KIND: EntityKind;

    fn fingerprint(&self) -> &Fingerprint;

    fn slot(cache: &EntityCache) -> &KindCache<Self>;

    fn slot_mut(cache: &mut EntityCache) -> &mut KindCache<Self>;

    fn staged(row: Arc<Self>) -> StagedRow;
}

macro_rules! cached_entity {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl CachedEntity for $ty {
            const KIND: EntityKind = EntityKind::$kind;

            fn fingerprint(&self) -> &Fingerprint {
                &self.fingerprint
            }

            fn slot(cache: &EntityCache) -> &KindCache<Self> {
                &cache.$field
            }

            fn slot_mut(cache: &mut EntityCache) -> &mut KindCache<Self> {
                &mut cache.$field
            }

            fn staged(row: Arc<Self>) -> StagedRow {
                StagedRow::$kind(row)
            }
        }
    };
}

cached_entity!(TermInstance, TermInstance, terms);
cached_entity!(StatementEdge, StatementEdge, edges);
cached_entity!(Citation, Citation, citations);
cached_entity!(Evidence, Evidence, evidences);
cached_entity!(Author, Author, authors);
cached_entity!(Modification, Modification, modifications);
cached_entity!(Property, Property, properties);

#[derive(Debug, Default)]
pub struct EntityCache {
    terms: KindCache<TermInstance>,
    edges: KindCache<StatementEdge>,
    citations: KindCache<Citation>,
    evidences: KindCache<Evidence>,
    authors: KindCache<Author>,
    modifications: KindCache<Modification>,
    properties: KindCache<Property>,
    staged: Vec<StagedRow>,
    uncommitted: Vec<(EntityKind, Fingerprint)>,
    stats: CacheStats,
}

impl EntityCache {
    /// Process-cache lookup. A miss is counted as a store lookup, since
    /// every caller goes to the store next.
    pub fn lookup<T: CachedEntity>(&mut self, fingerprint: &Fingerprint) -> Option<Arc<T>> {
        let hit = T::slot(self).get(fingerprint);
        if hit.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.store_lookups += 1;
        }
        hit
    }

    /// Cache a row that already exists in the store.
    pub fn remember<T: CachedEntity>(&mut self, row: T) -> Arc<T> {
        let row = Arc::new(row);
        T::slot_mut(self).insert(row.fingerprint().clone(), Arc::clone(&row));
        row
    }

    /// Cache a new row and stage it for the next flush.
    pub fn stage<T: CachedEntity>(&mut self, row: T) -> Arc<T> {
        let row = Arc::new(row);
        let fingerprint = row.fingerprint().clone();
        T::slot_mut(self).insert(fingerprint.clone(), Arc::clone(&row));
        self.staged.push(T::staged(Arc::clone(&row)));
        self.uncommitted.push((T::KIND, fingerprint));
        self.stats.created += 1;
        row
    }

    /// Hand over the staged rows in creation order.
    pub fn take_staged(&mut self) -> Vec<StagedRow> {
        std::mem::take(&mut self.staged)
    }

    #[must_use]
    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Everything created so far is durable.
    pub fn mark_committed(&mut self) {
        self.staged.clear();
        self.uncommitted.clear();
    }

    /// Drop every row created since the last commit from the caches.
    pub fn evict_uncommitted(&mut self) -> usize {
        self.staged.clear();
        let evicted = self.uncommitted.len();
        for (kind, fingerprint) in std::mem::take(&mut self.uncommitted) {
            match kind {
                EntityKind::TermInstance => self.terms.remove(&fingerprint),
                EntityKind::StatementEdge => self.edges.remove(&fingerprint),
                EntityKind::Citation => self.citations.remove(&fingerprint),
                EntityKind::Evidence => self.evidences.remove(&fingerprint),
                EntityKind::Author => self.authors.remove(&fingerprint),
                EntityKind::Modification => self.modifications.remove(&fingerprint),
                EntityKind::Property => self.properties.remove(&fingerprint),
            }
        }
        evicted
    }

    /// Number of cached rows of one kind.
    #[must_use]
    pub fn cached(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::TermInstance => self.terms.len(),
            EntityKind::StatementEdge => self.edges.len(),
            EntityKind::Citation => self.citations.len(),
            EntityKind::Evidence => self.evidences.len(),
            EntityKind::Author => self.authors.len(),
            EntityKind::Modification => self.modifications.len(),
            EntityKind::Property => self.properties.len(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }
}
