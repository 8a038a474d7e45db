use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::term::EntityRef;
use crate::enums::Modifier;

/// Keyword under which cellular-component locations are resolved when a
/// network does not declare it.
pub const LOCATION_KEYWORD: &str = "GOCC";

/// Relations that are structural facts and carry no evidence or citation.
pub const UNQUALIFIED_RELATIONS: &[&str] = &[
    "hasReactant",
    "hasProduct",
    "hasComponent",
    "hasVariant",
    "transcribedTo",
    "translatedTo",
    "isA",
    "equivalentTo",
    "hasMember",
    "orthologous",
];

/// Whether `relation` is stored without evidence, citation or properties.
#[must_use]
pub fn is_unqualified(relation: &str) -> bool {
    UNQUALIFIED_RELATIONS.contains(&relation)
}

/// A directed statement between two terms of the same graph, by term index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Relationship {
    pub source: usize,
    pub target: usize,
    pub data: EdgeData,
}

/// Contextual data of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct EdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<CitationData>,
    /// Annotation keyword to annotation value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<ParticipantData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ParticipantData>,
}

impl EdgeData {
    #[must_use]
    pub fn relation(relation: impl Into<String>) -> Self {
        Self {
            relation: Some(relation.into()),
            ..Self::default()
        }
    }

    /// Attach evidence text and its citation.
    #[must_use]
    pub fn with_evidence(mut self, text: impl Into<String>, citation: CitationData) -> Self {
        self.evidence = Some(text.into());
        self.citation = Some(citation);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// Citation as written on an edge. Only `type` and `reference` identify it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CitationData {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<AuthorList>,
}

impl CitationData {
    #[must_use]
    pub fn new(kind: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    /// Trimmed `(type, reference)` when both are present and non-empty.
    #[must_use]
    pub fn identity(&self) -> Option<(&str, &str)> {
        let kind = self.kind.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let reference = self
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((kind, reference))
    }
}

/// Citation authors, either one `|`-delimited string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AuthorList {
    Delimited(String),
    Names(Vec<String>),
}

impl AuthorList {
    /// Trimmed, non-empty author names in order of first appearance, without duplicates.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::Delimited(s) => s.split('|').collect(),
            Self::Names(names) => names.iter().map(String::as_str).collect(),
        };
        let mut out: Vec<String> = Vec::with_capacity(raw.len());
        for name in raw.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
            if !out.iter().any(|seen| seen == name) {
                out.push(name.to_string());
            }
        }
        out
    }
}

/// Modifier information about one participant of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ParticipantData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<Modifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
}

/// Effect of an activity (single entity) or translocation (`fromLoc`/`toLoc` map).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Effect {
    Entity(EntityRef),
    Translocation(BTreeMap<String, EffectValue>),
}

/// One translocation effect value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum EffectValue {
    Entity(EntityRef),
    Literal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimited_authors_are_trimmed_and_deduplicated() {
        let authors = AuthorList::Delimited("Smith J| Doe A |Smith J||".to_string());
        assert_eq!(authors.names(), vec!["Smith J", "Doe A"]);
    }

    #[test]
    fn citation_identity_requires_both_fields() {
        assert_eq!(
            CitationData::new(" PubMed ", "123 ").identity(),
            Some(("PubMed", "123"))
        );
        let missing = CitationData {
            kind: Some("PubMed".into()),
            ..CitationData::default()
        };
        assert_eq!(missing.identity(), None);
        assert_eq!(CitationData::new("PubMed", "  ").identity(), None);
    }

    #[test]
    fn translocation_effect_parses_entities_and_literals() {
        let json = r#"{"modifier": "translocation", "effect": {
            "fromLoc": {"namespace": "GOCC", "name": "cytoplasm"},
            "toLoc": "nucleus"
        }}"#;
        let data: ParticipantData = serde_json::from_str(json).unwrap();
        let Some(Effect::Translocation(map)) = data.effect else {
            panic!("expected translocation effect");
        };
        assert_eq!(
            map["fromLoc"],
            EffectValue::Entity(EntityRef::new("GOCC", "cytoplasm"))
        );
        assert_eq!(map["toLoc"], EffectValue::Literal("nucleus".into()));
    }

    #[test]
    fn unqualified_relations() {
        assert!(is_unqualified("hasVariant"));
        assert!(!is_unqualified("increases"));
    }
}
