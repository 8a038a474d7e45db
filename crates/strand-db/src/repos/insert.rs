//! Graph ingestion: resources, deduplicated parts and the network envelope.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use strand_core::entities::{Network, StatementEdge, TermInstance};
use strand_core::enums::VocabularyKind;
use strand_core::graph::{Graph, Relationship, is_unqualified};
use strand_core::ids::PREFIX_NETWORK;

use super::edge::EdgeContext;
use crate::error::DatabaseError;
use crate::helpers::{format_datetime, parse_datetime};
use crate::service::GraphStore;

/// Resolve the annotation keys of an edge to `(vocabulary url, value)` pairs.
///
/// Keys resolve against declared annotation URLs, then annotation
/// ontologies. Inline list annotations are skipped, as are pattern
/// annotations (with a warning).
///
/// # Errors
///
/// Returns `DatabaseError::UnknownReference` for a key the graph does not declare.
pub fn map_annotations<'g>(
    graph: &'g Graph,
    annotations: &'g BTreeMap<String, String>,
) -> Result<Vec<(&'g str, &'g str)>, DatabaseError> {
    let mut mapped = Vec::with_capacity(annotations.len());
    for (key, value) in annotations {
        if let Some(url) = graph.annotation_url.get(key) {
            mapped.push((url.as_str(), value.as_str()));
        } else if let Some(url) = graph.annotation_owl.get(key) {
            mapped.push((url.as_str(), value.as_str()));
        } else if graph.annotation_list.contains_key(key) {
            continue;
        } else if graph.annotation_pattern.contains_key(key) {
            warn!(key, value, "pattern annotations are not stored");
        } else {
            return Err(DatabaseError::UnknownReference {
                keyword: key.clone(),
            });
        }
    }
    Ok(mapped)
}

/// Terms that failed to resolve are skipped during deep decomposition.
const fn is_resolution_failure(err: &DatabaseError) -> bool {
    matches!(
        err,
        DatabaseError::UnknownReference { .. } | DatabaseError::NotFound { .. }
    )
}

impl GraphStore {
    /// [`Self::insert_graph`] with the configured decomposition default.
    ///
    /// # Errors
    ///
    /// Same as [`Self::insert_graph`].
    pub async fn insert(&mut self, graph: &Graph) -> Result<Network, DatabaseError> {
        let deep = self.options.deep_decomposition;
        self.insert_graph(graph, deep).await
    }

    /// Store `graph` as a new network.
    ///
    /// Every vocabulary and ontology the graph declares is ensured first. With
    /// `deep`, terms and relationships are also decomposed into deduplicated
    /// rows; terms that fail to resolve are skipped together with every
    /// relationship touching them. Everything after resource loading is one
    /// unit of work.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidInput` for a blank name or version,
    /// `DatabaseError::DuplicateNetwork` if the name and version are taken,
    /// and any resource or store error. On error nothing of the unit of work
    /// is kept, in the store or in the caches.
    pub async fn insert_graph(&mut self, graph: &Graph, deep: bool) -> Result<Network, DatabaseError> {
        let name = graph.metadata.name.trim();
        let version = graph.metadata.version.trim();
        if name.is_empty() || version.is_empty() {
            return Err(DatabaseError::InvalidInput(
                "network name and version must not be empty".into(),
            ));
        }
        graph.validate()?;
        if self.has_name_version(name, version).await? {
            return Err(DatabaseError::DuplicateNetwork {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        let started = Instant::now();
        self.ensure_declared_resources(graph, deep).await?;

        match self.store_graph(graph, deep).await {
            Ok(network) => {
                info!(
                    network = %network.id,
                    name,
                    version,
                    deep,
                    elapsed_ms = started.elapsed().as_millis(),
                    "inserted network"
                );
                Ok(network)
            }
            Err(err) => {
                if let Err(rollback) = self.rollback().await {
                    warn!(error = %rollback, "rollback after failed insert also failed");
                }
                Err(err)
            }
        }
    }

    async fn ensure_declared_resources(
        &mut self,
        graph: &Graph,
        deep: bool,
    ) -> Result<(), DatabaseError> {
        for url in graph.namespace_url.values() {
            self.ensure(VocabularyKind::Namespace, url).await?;
        }
        for url in graph.annotation_url.values() {
            self.ensure(VocabularyKind::Annotation, url).await?;
        }
        for url in graph.namespace_owl.values() {
            self.ensure_ontology(VocabularyKind::Namespace, url).await?;
        }
        for url in graph.annotation_owl.values() {
            self.ensure_ontology(VocabularyKind::Annotation, url).await?;
        }
        if deep {
            if let Some(url) = self.options.location_fallback_url.clone() {
                self.ensure(VocabularyKind::Namespace, &url).await?;
            }
        }
        Ok(())
    }

    async fn store_graph(&mut self, graph: &Graph, deep: bool) -> Result<Network, DatabaseError> {
        self.begin().await?;

        let mut terms: Vec<Option<Arc<TermInstance>>> = Vec::with_capacity(graph.terms.len());
        let mut edges: Vec<Arc<StatementEdge>> = Vec::new();

        if deep {
            for (idx, term) in graph.terms.iter().enumerate() {
                match self.get_or_create_term_instance(graph, term).await {
                    Ok(instance) => terms.push(Some(instance)),
                    Err(err) if is_resolution_failure(&err) => {
                        debug!(term = idx, error = %err, "skipping unresolvable term");
                        terms.push(None);
                    }
                    Err(err) => return Err(err),
                }
            }
            self.flush().await?;

            for (idx, relationship) in graph.relationships.iter().enumerate() {
                if let Some(edge) = self.store_relationship(graph, idx, relationship, &terms).await? {
                    edges.push(edge);
                }
            }
            self.flush().await?;
        }

        let network = self.write_network(graph, &terms, &edges).await?;
        self.commit().await?;
        Ok(network)
    }

    async fn store_relationship(
        &mut self,
        graph: &Graph,
        idx: usize,
        relationship: &Relationship,
        terms: &[Option<Arc<TermInstance>>],
    ) -> Result<Option<Arc<StatementEdge>>, DatabaseError> {
        let (Some(Some(source)), Some(Some(target))) =
            (terms.get(relationship.source), terms.get(relationship.target))
        else {
            debug!(relationship = idx, "skipping edge with an unresolved endpoint");
            return Ok(None);
        };
        let data = &relationship.data;
        let Some(relation) = data.relation.as_deref() else {
            debug!(relationship = idx, "skipping edge without a relation");
            return Ok(None);
        };

        if is_unqualified(relation) {
            let edge = self
                .get_or_create_statement_edge(graph, relationship, source, target, EdgeContext::default())
                .await?;
            return Ok(Some(edge));
        }

        let text = data.evidence.as_deref().filter(|t| !t.trim().is_empty());
        let citation = data.citation.as_ref().filter(|c| c.identity().is_some());
        let (Some(text), Some(citation)) = (text, citation) else {
            debug!(relationship = idx, relation, "skipping edge without evidence and citation");
            return Ok(None);
        };

        let citation = self.get_or_create_citation(citation).await?;
        let evidence = self.get_or_create_evidence(&citation, text).await?;
        let properties = self.get_or_create_properties(graph, data).await?;
        let mut annotations = Vec::new();
        for (url, value) in map_annotations(graph, &data.annotations)? {
            let entry = self.get_entry(VocabularyKind::Annotation, url, value).await?;
            annotations.push(entry.id);
        }

        let context = EdgeContext {
            evidence: Some(evidence.fingerprint.clone()),
            properties: properties.iter().map(|p| p.fingerprint.clone()).collect(),
            annotations,
        };
        let edge = self
            .get_or_create_statement_edge(graph, relationship, source, target, context)
            .await?;
        Ok(Some(edge))
    }

    async fn write_network(
        &self,
        graph: &Graph,
        terms: &[Option<Arc<TermInstance>>],
        edges: &[Arc<StatementEdge>],
    ) -> Result<Network, DatabaseError> {
        let id = self.db().generate_id(PREFIX_NETWORK).await?;
        let created = format_datetime(&Utc::now());
        let metadata = &graph.metadata;
        let network = Network {
            id,
            name: metadata.name.trim().to_string(),
            version: metadata.version.trim().to_string(),
            description: metadata.description.clone(),
            authors: metadata.authors.clone(),
            contact: metadata.contact.clone(),
            licenses: metadata.licenses.clone(),
            copyright: metadata.copyright.clone(),
            disclaimer: metadata.disclaimer.clone(),
            blob: graph.to_json()?,
            created: parse_datetime(&created)?,
        };

        let conn = self.db().conn();
        conn.execute(
            "INSERT INTO networks (id, name, version, description, authors, contact, licenses,
                 copyright, disclaimer, blob, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            libsql::params![
                network.id.as_str(),
                network.name.as_str(),
                network.version.as_str(),
                network.description.as_deref(),
                network.authors.as_deref(),
                network.contact.as_deref(),
                network.licenses.as_deref(),
                network.copyright.as_deref(),
                network.disclaimer.as_deref(),
                network.blob.as_str(),
                created.as_str()
            ],
        )
        .await?;

        for term in terms.iter().flatten() {
            conn.execute(
                "INSERT OR IGNORE INTO network_terms (network_id, term) VALUES (?1, ?2)",
                libsql::params![network.id.as_str(), term.fingerprint.as_str()],
            )
            .await?;
        }
        for edge in edges {
            conn.execute(
                "INSERT OR IGNORE INTO network_edges (network_id, edge) VALUES (?1, ?2)",
                libsql::params![network.id.as_str(), edge.fingerprint.as_str()],
            )
            .await?;
        }
        Ok(network)
    }
}
