//! Vocabulary repository: two-tier ensure of namespaces and annotations.
//!
//! A vocabulary is looked up in the process cache, then in the store, and only
//! then fetched from its URL. Fetched cachable resources are written in one
//! transaction and cached; non-cachable ones are handed back as an ephemeral
//! `name -> value` mapping and never stored.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use strand_core::entities::{Vocabulary, VocabularyEntry};
use strand_core::enums::VocabularyKind;
use strand_core::ids::PREFIX_VOCABULARY;
use strand_resource::ResourceHeader;

use crate::cache::{VocabularyHandle, VocabularyKey};
use crate::error::DatabaseError;
use crate::helpers::{fetch_unique, format_datetime, get_bool, get_opt_string, parse_datetime, parse_enum};
use crate::service::GraphStore;

pub(crate) const VOCABULARY_COLUMNS: &str = "id, kind, url, keyword, name, domain, version, description, \
     author, contact, species, is_ontology, has_equivalences, created_at";

pub(crate) fn row_to_vocabulary(row: &libsql::Row) -> Result<Vocabulary, DatabaseError> {
    Ok(Vocabulary {
        id: row.get::<String>(0)?,
        kind: parse_enum(&row.get::<String>(1)?)?,
        url: row.get::<String>(2)?,
        keyword: get_opt_string(row, 3)?,
        name: get_opt_string(row, 4)?,
        domain: get_opt_string(row, 5)?,
        version: get_opt_string(row, 6)?,
        description: get_opt_string(row, 7)?,
        author: get_opt_string(row, 8)?,
        contact: get_opt_string(row, 9)?,
        species: get_opt_string(row, 10)?,
        is_ontology: get_bool(row, 11)?,
        has_equivalences: get_bool(row, 12)?,
        created_at: parse_datetime(&row.get::<String>(13)?)?,
    })
}

/// Expects `id, vocabulary_id, name, value, equivalence_id`.
pub(crate) fn row_to_entry(row: &libsql::Row) -> Result<VocabularyEntry, DatabaseError> {
    Ok(VocabularyEntry {
        id: row.get::<i64>(0)?,
        vocabulary_id: row.get::<String>(1)?,
        name: row.get::<String>(2)?,
        value: get_opt_string(row, 3)?,
        equivalence_id: get_opt_string(row, 4)?,
    })
}

/// Everything written for one fetched vocabulary.
pub(crate) struct VocabularyContent {
    pub header: ResourceHeader,
    pub entries: BTreeMap<String, Option<String>>,
    pub edges: BTreeSet<(String, String)>,
    pub is_ontology: bool,
}

impl GraphStore {
    /// Make sure the vocabulary at `url` is available, fetching it at most once.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Resource` if the fetch fails and
    /// `DatabaseError::LibSql` if the insert fails (nothing is cached then).
    pub async fn ensure(
        &mut self,
        kind: VocabularyKind,
        url: &str,
    ) -> Result<VocabularyHandle, DatabaseError> {
        let key = VocabularyKey::new(kind, url);
        if let Some(model) = self.resources.model(&key) {
            debug!(%kind, url, "vocabulary cache hit");
            return Ok(VocabularyHandle::Persisted(model));
        }

        if let Some(model) = self.find_vocabulary(kind, url).await? {
            debug!(%kind, url, "vocabulary loaded from store");
            let model = self.load_vocabulary(key, model).await?;
            return Ok(VocabularyHandle::Persisted(model));
        }

        let started = std::time::Instant::now();
        let description = self.fetcher.fetch(url).await?;

        if !description.cachable {
            info!(%kind, url, "resource is not cachable, keeping it out of the store");
            let values = description
                .values
                .iter()
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| {
                    let value = self.entry_value(kind, Some(value.as_str())).unwrap_or_default();
                    (name.clone(), value)
                })
                .collect();
            return Ok(VocabularyHandle::Ephemeral(Arc::new(values)));
        }

        let entries = description
            .values
            .iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), self.entry_value(kind, Some(value.as_str()))))
            .collect();
        let content = VocabularyContent {
            header: description.header,
            entries,
            edges: BTreeSet::new(),
            is_ontology: false,
        };
        let model = self.store_vocabulary(key, content).await?;
        info!(
            %kind,
            url,
            elapsed_ms = started.elapsed().as_millis(),
            "inserted vocabulary"
        );
        Ok(VocabularyHandle::Persisted(model))
    }

    pub async fn ensure_namespace(&mut self, url: &str) -> Result<VocabularyHandle, DatabaseError> {
        self.ensure(VocabularyKind::Namespace, url).await
    }

    pub async fn ensure_annotation(
        &mut self,
        url: &str,
    ) -> Result<VocabularyHandle, DatabaseError> {
        self.ensure(VocabularyKind::Annotation, url).await
    }

    /// Entry `name -> encoding` of a namespace, ensuring it first.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure`].
    pub async fn namespace_encodings(
        &mut self,
        url: &str,
    ) -> Result<BTreeMap<String, String>, DatabaseError> {
        self.entry_values(VocabularyKind::Namespace, url).await
    }

    /// Entry `name -> label` of an annotation, ensuring it first. Entries
    /// without a label map to the empty string.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure`].
    pub async fn annotation_labels(
        &mut self,
        url: &str,
    ) -> Result<BTreeMap<String, String>, DatabaseError> {
        self.entry_values(VocabularyKind::Annotation, url).await
    }

    /// Look up one entry of a stored vocabulary.
    ///
    /// Served from the cache when the vocabulary is loaded, otherwise with a
    /// single store query.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` when the vocabulary or the entry is
    /// missing (ephemeral vocabularies have no entries).
    pub async fn get_entry(
        &self,
        kind: VocabularyKind,
        url: &str,
        name: &str,
    ) -> Result<Arc<VocabularyEntry>, DatabaseError> {
        let lookup_key = format!("{kind} {url} {name}");
        let key = VocabularyKey::new(kind, url);
        if let Some(entries) = self.resources.entries(&key) {
            return entries
                .get(name)
                .cloned()
                .ok_or_else(|| DatabaseError::not_found("vocabulary entry", lookup_key));
        }

        let rows = self
            .db()
            .conn()
            .query(
                "SELECT e.id, e.vocabulary_id, e.name, e.value, e.equivalence_id
                 FROM vocabulary_entries e
                 JOIN vocabularies v ON v.id = e.vocabulary_id
                 WHERE v.kind = ?1 AND v.url = ?2 AND e.name = ?3",
                libsql::params![kind.as_str(), url, name],
            )
            .await?;
        let row = fetch_unique(rows, "vocabulary entry", &lookup_key).await?;
        Ok(Arc::new(row_to_entry(&row)?))
    }

    pub async fn list_vocabularies(
        &self,
        kind: VocabularyKind,
    ) -> Result<Vec<Vocabulary>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {VOCABULARY_COLUMNS} FROM vocabularies WHERE kind = ?1 ORDER BY url"
                ),
                [kind.as_str()],
            )
            .await?;
        let mut vocabularies = Vec::new();
        while let Some(row) = rows.next().await? {
            vocabularies.push(row_to_vocabulary(&row)?);
        }
        Ok(vocabularies)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no vocabulary is stored for `url`.
    pub async fn get_vocabulary_by_url(
        &self,
        kind: VocabularyKind,
        url: &str,
    ) -> Result<Vocabulary, DatabaseError> {
        self.find_vocabulary(kind, url)
            .await?
            .ok_or_else(|| DatabaseError::not_found("vocabulary", format!("{kind} {url}")))
    }

    /// Delete one vocabulary with its entries and ontology links.
    ///
    /// Terms and properties that pointed at its entries keep their rows with
    /// the entry reference cleared; annotation links to its entries go away.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if nothing is stored for `url`.
    pub async fn drop_vocabulary_by_url(
        &mut self,
        kind: VocabularyKind,
        url: &str,
    ) -> Result<(), DatabaseError> {
        let vocabulary = self.get_vocabulary_by_url(kind, url).await?;
        self.resources.remove(&VocabularyKey::new(kind, url));

        self.db().begin().await?;
        let result = self.delete_vocabulary_rows(Some(&vocabulary.id)).await;
        self.finish_write(result).await?;
        info!(%kind, url, "dropped vocabulary");
        Ok(())
    }

    /// Delete every vocabulary and clear the resource cache.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if a delete fails.
    pub async fn drop_vocabularies(&mut self) -> Result<(), DatabaseError> {
        self.resources.clear();
        self.db().begin().await?;
        let result = self.delete_vocabulary_rows(None).await;
        self.finish_write(result).await?;
        info!("dropped all vocabularies");
        Ok(())
    }

    // ── Internals shared with the ontology and equivalence repos ──

    pub(crate) async fn find_vocabulary(
        &self,
        kind: VocabularyKind,
        url: &str,
    ) -> Result<Option<Vocabulary>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {VOCABULARY_COLUMNS} FROM vocabularies WHERE kind = ?1 AND url = ?2"
                ),
                libsql::params![kind.as_str(), url],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_vocabulary(&row)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn vocabulary_entries(
        &self,
        vocabulary_id: &str,
    ) -> Result<Vec<VocabularyEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, vocabulary_id, name, value, equivalence_id
                 FROM vocabulary_entries WHERE vocabulary_id = ?1 ORDER BY name",
                [vocabulary_id],
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }

    /// Read a stored vocabulary's entries and ontology links into the cache.
    pub(crate) async fn load_vocabulary(
        &mut self,
        key: VocabularyKey,
        model: Vocabulary,
    ) -> Result<Arc<Vocabulary>, DatabaseError> {
        let entries = self.vocabulary_entries(&model.id).await?;

        let mut edges = BTreeSet::new();
        if model.is_ontology {
            let mut rows = self
                .db()
                .conn()
                .query(
                    "SELECT p.name, c.name
                     FROM entry_children ec
                     JOIN vocabulary_entries p ON p.id = ec.parent_id
                     JOIN vocabulary_entries c ON c.id = ec.child_id
                     WHERE p.vocabulary_id = ?1",
                    [model.id.as_str()],
                )
                .await?;
            while let Some(row) = rows.next().await? {
                edges.insert((row.get::<String>(0)?, row.get::<String>(1)?));
            }
        }

        let model = Arc::new(model);
        self.resources
            .insert(key, Arc::clone(&model), entries, edges);
        Ok(model)
    }

    /// Write a fetched vocabulary in one transaction and cache it.
    pub(crate) async fn store_vocabulary(
        &mut self,
        key: VocabularyKey,
        content: VocabularyContent,
    ) -> Result<Arc<Vocabulary>, DatabaseError> {
        self.db().begin().await?;
        let result = self.write_vocabulary(&key, &content).await;
        let (model, entries) = self.finish_write(result).await?;

        let model = Arc::new(model);
        self.resources
            .insert(key, Arc::clone(&model), entries, content.edges);
        Ok(model)
    }

    async fn write_vocabulary(
        &self,
        key: &VocabularyKey,
        content: &VocabularyContent,
    ) -> Result<(Vocabulary, Vec<VocabularyEntry>), DatabaseError> {
        let id = self.db().generate_id(PREFIX_VOCABULARY).await?;
        let created = format_datetime(&Utc::now());
        let header = &content.header;
        let conn = self.db().conn();

        conn.execute(
            &format!(
                "INSERT INTO vocabularies ({VOCABULARY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, ?13)"
            ),
            libsql::params![
                id.as_str(),
                key.kind.as_str(),
                key.url.as_str(),
                header.keyword.as_deref(),
                header.name.as_deref(),
                header.domain.as_deref(),
                header.version.as_deref(),
                header.description.as_deref(),
                header.author.as_deref(),
                header.contact.as_deref(),
                header.species.as_deref(),
                i64::from(content.is_ontology),
                created.as_str()
            ],
        )
        .await?;

        let mut entries = Vec::with_capacity(content.entries.len());
        let mut ids: HashMap<&str, i64> = HashMap::with_capacity(content.entries.len());
        for (name, value) in &content.entries {
            conn.execute(
                "INSERT INTO vocabulary_entries (vocabulary_id, name, value) VALUES (?1, ?2, ?3)",
                libsql::params![id.as_str(), name.as_str(), value.as_deref()],
            )
            .await?;
            let entry_id = conn.last_insert_rowid();
            ids.insert(name.as_str(), entry_id);
            entries.push(VocabularyEntry {
                id: entry_id,
                vocabulary_id: id.clone(),
                name: name.clone(),
                value: value.clone(),
                equivalence_id: None,
            });
        }

        for (parent, child) in &content.edges {
            let (Some(&parent_id), Some(&child_id)) =
                (ids.get(parent.as_str()), ids.get(child.as_str()))
            else {
                continue;
            };
            conn.execute(
                "INSERT OR IGNORE INTO entry_children (parent_id, child_id) VALUES (?1, ?2)",
                libsql::params![parent_id, child_id],
            )
            .await?;
        }

        let vocabulary = Vocabulary {
            id,
            kind: key.kind,
            url: key.url.clone(),
            keyword: header.keyword.clone(),
            name: header.name.clone(),
            domain: header.domain.clone(),
            version: header.version.clone(),
            description: header.description.clone(),
            author: header.author.clone(),
            contact: header.contact.clone(),
            species: header.species.clone(),
            is_ontology: content.is_ontology,
            has_equivalences: false,
            created_at: parse_datetime(&created)?,
        };
        Ok((vocabulary, entries))
    }

    /// Delete one vocabulary's rows, or all of them when `id` is `None`.
    async fn delete_vocabulary_rows(&self, id: Option<&str>) -> Result<(), DatabaseError> {
        let conn = self.db().conn();
        match id {
            Some(id) => {
                conn.execute(
                    "DELETE FROM entry_children
                     WHERE parent_id IN (SELECT id FROM vocabulary_entries WHERE vocabulary_id = ?1)
                        OR child_id IN (SELECT id FROM vocabulary_entries WHERE vocabulary_id = ?1)",
                    [id],
                )
                .await?;
                conn.execute("DELETE FROM vocabulary_entries WHERE vocabulary_id = ?1", [id])
                    .await?;
                conn.execute("DELETE FROM vocabularies WHERE id = ?1", [id])
                    .await?;
            }
            None => {
                conn.execute("DELETE FROM entry_children", ()).await?;
                conn.execute("DELETE FROM vocabulary_entries", ()).await?;
                conn.execute("DELETE FROM vocabularies", ()).await?;
            }
        }
        Ok(())
    }

    /// Stored value of an entry: namespaces fall back to the default
    /// encoding, annotations to no label.
    pub(crate) fn entry_value(&self, kind: VocabularyKind, value: Option<&str>) -> Option<String> {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => Some(value.to_string()),
            None => match kind {
                VocabularyKind::Namespace => Some(self.options.default_encoding.clone()),
                VocabularyKind::Annotation => None,
            },
        }
    }

    async fn entry_values(
        &mut self,
        kind: VocabularyKind,
        url: &str,
    ) -> Result<BTreeMap<String, String>, DatabaseError> {
        let handle = self.ensure(kind, url).await?;
        if let VocabularyHandle::Ephemeral(values) = handle {
            return Ok((*values).clone());
        }
        let key = VocabularyKey::new(kind, url);
        Ok(self
            .resources
            .entries(&key)
            .map(|entries| {
                entries
                    .values()
                    .map(|entry| (entry.name.clone(), entry.value.clone().unwrap_or_default()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strand_resource::ResourceDescription;

    use super::*;
    use crate::test_support::helpers::{HGNC_URL, store_with};

    #[tokio::test]
    async fn ensure_fetches_once_and_applies_default_encoding() {
        let (mut store, fetcher) = store_with(vec![(
            HGNC_URL,
            ResourceDescription::from_values([("AKT1", "GRP"), ("EGFR", ""), ("", "X")])
                .with_keyword("HGNC"),
        )])
        .await;

        let handle = store.ensure_namespace(HGNC_URL).await.unwrap();
        let vocabulary = handle.vocabulary().unwrap();
        assert_eq!(vocabulary.keyword.as_deref(), Some("HGNC"));
        assert!(!vocabulary.is_ontology);

        store.ensure_namespace(HGNC_URL).await.unwrap();
        assert_eq!(fetcher.fetch_count(HGNC_URL), 1);

        let encodings = store.namespace_encodings(HGNC_URL).await.unwrap();
        assert_eq!(encodings.len(), 2);
        assert_eq!(encodings["AKT1"], "GRP");
        assert_eq!(encodings["EGFR"], "ABCGMOPR");
    }

    #[tokio::test]
    async fn annotation_entries_without_label_have_no_value() {
        let url = "memory://anatomy";
        let (mut store, _) = store_with(vec![(
            url,
            ResourceDescription::from_values([("liver", "UBERON:0002107"), ("lung", "")]),
        )])
        .await;

        store.ensure_annotation(url).await.unwrap();
        let lung = store
            .get_entry(VocabularyKind::Annotation, url, "lung")
            .await
            .unwrap();
        assert_eq!(lung.value, None);
        let labels = store.annotation_labels(url).await.unwrap();
        assert_eq!(labels["liver"], "UBERON:0002107");
    }

    #[tokio::test]
    async fn non_cachable_resource_is_not_stored() {
        let url = "memory://volatile";
        let (mut store, fetcher) = store_with(vec![(
            url,
            ResourceDescription::from_values([("A", "")]).non_cachable(),
        )])
        .await;

        let handle = store.ensure_namespace(url).await.unwrap();
        let VocabularyHandle::Ephemeral(values) = handle else {
            panic!("expected an ephemeral vocabulary");
        };
        assert_eq!(values["A"], "ABCGMOPR");
        assert!(store.list_vocabularies(VocabularyKind::Namespace).await.unwrap().is_empty());

        store.ensure_namespace(url).await.unwrap();
        assert_eq!(fetcher.fetch_count(url), 2);
        assert!(matches!(
            store.get_entry(VocabularyKind::Namespace, url, "A").await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn get_entry_reports_missing_names() {
        let (mut store, _) = store_with(vec![(
            HGNC_URL,
            ResourceDescription::from_values([("AKT1", "GRP")]),
        )])
        .await;
        store.ensure_namespace(HGNC_URL).await.unwrap();

        let akt1 = store
            .get_entry(VocabularyKind::Namespace, HGNC_URL, "AKT1")
            .await
            .unwrap();
        assert_eq!(akt1.name, "AKT1");
        assert!(matches!(
            store.get_entry(VocabularyKind::Namespace, HGNC_URL, "NOPE").await,
            Err(DatabaseError::NotFound { kind: "vocabulary entry", .. })
        ));
    }

    #[tokio::test]
    async fn drop_vocabulary_allows_refetch() {
        let (mut store, fetcher) = store_with(vec![(
            HGNC_URL,
            ResourceDescription::from_values([("AKT1", "GRP")]),
        )])
        .await;
        store.ensure_namespace(HGNC_URL).await.unwrap();

        store
            .drop_vocabulary_by_url(VocabularyKind::Namespace, HGNC_URL)
            .await
            .unwrap();
        assert!(matches!(
            store
                .get_vocabulary_by_url(VocabularyKind::Namespace, HGNC_URL)
                .await,
            Err(DatabaseError::NotFound { .. })
        ));

        store.ensure_namespace(HGNC_URL).await.unwrap();
        assert_eq!(fetcher.fetch_count(HGNC_URL), 2);

        store.drop_vocabularies().await.unwrap();
        assert!(store.list_vocabularies(VocabularyKind::Namespace).await.unwrap().is_empty());
    }
}
