//! In-memory causal network documents.
//!
//! A [`Graph`] is what callers hand to the store for ingestion and what the
//! store gives back when a network is loaded. It serializes to the JSON blob
//! kept on the network envelope.

mod edge;
mod term;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use edge::{
    AuthorList, CitationData, EdgeData, Effect, EffectValue, LOCATION_KEYWORD, ParticipantData,
    Relationship, UNQUALIFIED_RELATIONS, is_unqualified,
};
pub use term::{EntityRef, Fusion, FusionRange, Term, Variant};

use crate::errors::CoreError;

/// Whitelisted descriptive metadata of a network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GraphMetadata {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licenses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

/// A causal network: declared vocabularies, terms and relationships.
///
/// Every declaration map goes from the keyword used in the document to the
/// resource it refers to (a URL or a regular expression).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Graph {
    pub metadata: GraphMetadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub namespace_url: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub namespace_owl: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub namespace_pattern: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotation_url: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotation_owl: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotation_pattern: BTreeMap<String, String>,
    /// Annotations whose allowed values are listed inline.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotation_list: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Graph {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            metadata: GraphMetadata {
                name: name.into(),
                version: version.into(),
                ..GraphMetadata::default()
            },
            ..Self::default()
        }
    }

    /// Add a term, returning its index. An equal term already present is reused.
    pub fn add_term(&mut self, term: Term) -> usize {
        if let Some(idx) = self.terms.iter().position(|t| *t == term) {
            return idx;
        }
        self.terms.push(term);
        self.terms.len() - 1
    }

    /// Add a relationship between two term indexes.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if either index is out of range.
    pub fn add_relationship(
        &mut self,
        source: usize,
        target: usize,
        data: EdgeData,
    ) -> Result<(), CoreError> {
        for idx in [source, target] {
            if idx >= self.terms.len() {
                return Err(CoreError::Validation(format!(
                    "term index {idx} out of range ({} terms)",
                    self.terms.len()
                )));
            }
        }
        self.relationships.push(Relationship {
            source,
            target,
            data,
        });
        Ok(())
    }

    #[must_use]
    pub fn term(&self, idx: usize) -> Option<&Term> {
        self.terms.get(idx)
    }

    /// Check that every relationship points at an existing term.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` naming the first dangling relationship.
    pub fn validate(&self) -> Result<(), CoreError> {
        let n = self.terms.len();
        for (i, rel) in self.relationships.iter().enumerate() {
            if rel.source >= n || rel.target >= n {
                return Err(CoreError::Validation(format!(
                    "relationship {i} references a missing term ({} -> {}, {n} terms)",
                    rel.source, rel.target
                )));
            }
        }
        Ok(())
    }

    /// Merge several graphs into one.
    ///
    /// Metadata comes from the first graph. Declarations keep the first value
    /// seen for a keyword. Equal terms collapse into one node and identical
    /// relationships into one statement.
    #[must_use]
    pub fn union<'a, I>(graphs: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut out = Self::default();
        let mut first = true;
        let mut term_index: HashMap<Term, usize> = HashMap::new();
        let mut seen_rels: HashSet<Relationship> = HashSet::new();

        for graph in graphs {
            if first {
                out.metadata = graph.metadata.clone();
                first = false;
            }
            merge_decls(&mut out.namespace_url, &graph.namespace_url);
            merge_decls(&mut out.namespace_owl, &graph.namespace_owl);
            merge_decls(&mut out.namespace_pattern, &graph.namespace_pattern);
            merge_decls(&mut out.annotation_url, &graph.annotation_url);
            merge_decls(&mut out.annotation_owl, &graph.annotation_owl);
            merge_decls(&mut out.annotation_pattern, &graph.annotation_pattern);
            for (key, values) in &graph.annotation_list {
                out.annotation_list
                    .entry(key.clone())
                    .or_default()
                    .extend(values.iter().cloned());
            }

            let remap: Vec<usize> = graph
                .terms
                .iter()
                .map(|term| {
                    *term_index.entry(term.clone()).or_insert_with(|| {
                        out.terms.push(term.clone());
                        out.terms.len() - 1
                    })
                })
                .collect();

            for rel in &graph.relationships {
                let (Some(&source), Some(&target)) = (remap.get(rel.source), remap.get(rel.target))
                else {
                    continue;
                };
                let rel = Relationship {
                    source,
                    target,
                    data: rel.data.clone(),
                };
                if seen_rels.insert(rel.clone()) {
                    out.relationships.push(rel);
                }
            }
        }
        out
    }

    /// Serialize to the JSON blob stored on the network envelope.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if serialization fails.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored JSON blob.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` on malformed JSON and
    /// `CoreError::Validation` on dangling relationships.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let graph: Self = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }
}

fn merge_decls(into: &mut BTreeMap<String, String>, from: &BTreeMap<String, String>) {
    for (key, value) in from {
        into.entry(key.clone()).or_insert_with(|| value.clone());
    }
}
