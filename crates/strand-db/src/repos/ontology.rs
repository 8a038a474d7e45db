//! Ontology repository: hierarchical vocabularies loaded from a term graph.
//!
//! Same two tiers as flat vocabularies, but the resource must carry a graph.
//! Its nodes and edge endpoints become entries and each edge a parent/child
//! link. The cachable flag of the resource is not consulted.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use strand_core::enums::VocabularyKind;

use super::vocabulary::VocabularyContent;
use crate::cache::{VocabularyHandle, VocabularyKey};
use crate::error::DatabaseError;
use crate::service::GraphStore;

fn not_an_ontology(url: &str) -> DatabaseError {
    DatabaseError::InvalidState(format!("{url} is stored as a flat vocabulary"))
}

impl GraphStore {
    /// Make sure the ontology at `url` is stored with its hierarchy.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the resource has no term graph
    /// or `url` is already stored as a flat vocabulary, and
    /// `DatabaseError::Resource` if the fetch fails.
    pub async fn ensure_ontology(
        &mut self,
        kind: VocabularyKind,
        url: &str,
    ) -> Result<VocabularyHandle, DatabaseError> {
        let key = VocabularyKey::new(kind, url);
        if let Some(model) = self.resources.model(&key) {
            if !model.is_ontology {
                return Err(not_an_ontology(url));
            }
            debug!(%kind, url, "ontology cache hit");
            return Ok(VocabularyHandle::Persisted(model));
        }

        if let Some(model) = self.find_vocabulary(kind, url).await? {
            if !model.is_ontology {
                return Err(not_an_ontology(url));
            }
            debug!(%kind, url, "ontology loaded from store");
            let model = self.load_vocabulary(key, model).await?;
            return Ok(VocabularyHandle::Persisted(model));
        }

        let started = std::time::Instant::now();
        let description = self.fetcher.fetch(url).await?;
        let graph = description.graph.ok_or_else(|| {
            DatabaseError::InvalidState(format!("resource {url} has no term graph"))
        })?;

        let edges: BTreeSet<(String, String)> = graph.edges.into_iter().collect();
        let mut names: BTreeSet<String> = graph.nodes.into_iter().collect();
        for (parent, child) in &edges {
            names.insert(parent.clone());
            names.insert(child.clone());
        }
        let entries: BTreeMap<String, Option<String>> = names
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(|name| {
                let value = self.entry_value(kind, None);
                (name, value)
            })
            .collect();

        let content = VocabularyContent {
            header: description.header,
            entries,
            edges,
            is_ontology: true,
        };
        let model = self.store_vocabulary(key, content).await?;
        info!(
            %kind,
            url,
            elapsed_ms = started.elapsed().as_millis(),
            "inserted ontology"
        );
        Ok(VocabularyHandle::Persisted(model))
    }

    /// Entry `name -> value` of an ontology, ensuring it first.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure_ontology`].
    pub async fn ontology_terms(
        &mut self,
        kind: VocabularyKind,
        url: &str,
    ) -> Result<BTreeMap<String, Option<String>>, DatabaseError> {
        self.ensure_ontology(kind, url).await?;
        let key = VocabularyKey::new(kind, url);
        Ok(self
            .resources
            .entries(&key)
            .map(|entries| {
                entries
                    .values()
                    .map(|entry| (entry.name.clone(), entry.value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// `(parent, child)` pairs of an ontology, ensuring it first.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure_ontology`].
    pub async fn ontology_edges(
        &mut self,
        kind: VocabularyKind,
        url: &str,
    ) -> Result<BTreeSet<(String, String)>, DatabaseError> {
        self.ensure_ontology(kind, url).await?;
        let key = VocabularyKey::new(kind, url);
        Ok(self.resources.edges(&key).cloned().unwrap_or_default())
    }
}
