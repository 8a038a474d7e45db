use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::VocabularyKind;

/// Encoding given to namespace entries whose resource declares none.
pub const DEFAULT_ENCODING: &str = "ABCGMOPR";

/// A controlled vocabulary loaded from a resource URL.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Vocabulary {
    pub id: String,
    pub kind: VocabularyKind,
    pub url: String,
    pub keyword: Option<String>,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub contact: Option<String>,
    pub species: Option<String>,
    pub is_ontology: bool,
    pub has_equivalences: bool,
    pub created_at: DateTime<Utc>,
}

/// One term of a vocabulary. `value` holds the encoding (namespaces) or label (annotations).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub id: i64,
    pub vocabulary_id: String,
    pub name: String,
    pub value: Option<String>,
    pub equivalence_id: Option<String>,
}

/// Cross-vocabulary identity shared by entries with the same label.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EquivalenceClass {
    pub id: String,
    pub label: String,
}
