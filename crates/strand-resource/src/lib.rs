//! # strand-resource
//!
//! Fetching of controlled-vocabulary resources for Strand.
//!
//! A resource is a remote description of a namespace, annotation, ontology or
//! equivalence mapping. The store only talks to the [`ResourceFetcher`] trait:
//! - [`HttpFetcher`] downloads `http(s)://` and reads `file://` URLs, decoding
//!   either JSON or the sectioned definition text format
//! - [`MemoryFetcher`] serves registered descriptions and counts fetches

pub mod definition;
pub mod http;

mod error;
mod memory;

pub use error::ResourceError;
pub use http::HttpFetcher;
pub use memory::MemoryFetcher;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ── Types ──────────────────────────────────────────────────────────

/// Descriptive metadata from a resource header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHeader {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
}

/// Term hierarchy of an ontology resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyGraph {
    pub nodes: Vec<String>,
    /// `(parent, child)` name pairs.
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

/// A fetched resource.
///
/// `values` maps entry names to their encoding (namespaces), label
/// (annotations) or equivalence-class label (equivalence mappings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescription {
    #[serde(default)]
    pub header: ResourceHeader,
    #[serde(default = "default_cachable")]
    pub cachable: bool,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub graph: Option<OntologyGraph>,
}

const fn default_cachable() -> bool {
    true
}

impl ResourceDescription {
    /// A cachable description holding only `name -> value` pairs.
    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            header: ResourceHeader::default(),
            cachable: true,
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            graph: None,
        }
    }

    /// A cachable ontology description.
    pub fn from_graph<N, E>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        E: IntoIterator<Item = (String, String)>,
    {
        Self {
            header: ResourceHeader::default(),
            cachable: true,
            values: BTreeMap::new(),
            graph: Some(OntologyGraph {
                nodes: nodes.into_iter().map(Into::into).collect(),
                edges: edges.into_iter().collect(),
            }),
        }
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.header.keyword = Some(keyword.into());
        self
    }

    #[must_use]
    pub const fn non_cachable(mut self) -> Self {
        self.cachable = false;
        self
    }
}

// ── Fetcher ────────────────────────────────────────────────────────

/// Retrieves a resource description by URL.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ResourceDescription, ResourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_defaults_to_cachable() {
        let description: ResourceDescription =
            serde_json::from_str(r#"{"values": {"a": "1"}}"#).unwrap();
        assert!(description.cachable);
        assert!(description.graph.is_none());
    }

    #[test]
    fn ontology_json_edges_are_pairs() {
        let description: ResourceDescription = serde_json::from_str(
            r#"{"graph": {"nodes": ["root", "leaf"], "edges": [["root", "leaf"]]}}"#,
        )
        .unwrap();
        let graph = description.graph.unwrap();
        assert_eq!(graph.edges, vec![("root".to_string(), "leaf".to_string())]);
    }
}
