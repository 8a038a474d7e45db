use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Function;

/// A `namespace:name` reference to a vocabulary entry as written in a graph document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct EntityRef {
    pub namespace: String,
    pub name: String,
}

impl EntityRef {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// A node of a causal network.
///
/// Two terms are the same node exactly when they are equal field by field;
/// the term's fingerprint is computed over all of these fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Term {
    pub function: Function,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion: Option<Fusion>,
    /// Members of a complex or composite abundance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Term>,
}

impl Term {
    /// A named term, e.g. `Term::named(Function::Protein, "HGNC", "AKT1")`.
    #[must_use]
    pub fn named(function: Function, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            function,
            namespace: Some(namespace.into()),
            name: Some(name.into()),
            variants: Vec::new(),
            fusion: None,
            members: Vec::new(),
        }
    }

    /// A list abundance (complex or composite) built from its members.
    #[must_use]
    pub const fn list(function: Function, members: Vec<Self>) -> Self {
        Self {
            function,
            namespace: None,
            name: None,
            variants: Vec::new(),
            fusion: None,
            members,
        }
    }

    /// A fusion of two partners.
    #[must_use]
    pub const fn fused(function: Function, fusion: Fusion) -> Self {
        Self {
            function,
            namespace: None,
            name: None,
            variants: Vec::new(),
            fusion: Some(fusion),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }

    /// Whether this term carries variants or is a fusion.
    #[must_use]
    pub fn is_variant(&self) -> bool {
        !self.variants.is_empty() || self.fusion.is_some()
    }

    /// The `(namespace, name)` pair of a named term.
    #[must_use]
    pub fn entity(&self) -> Option<(&str, &str)> {
        match (&self.namespace, &self.name) {
            (Some(ns), Some(name)) => Some((ns.as_str(), name.as_str())),
            _ => None,
        }
    }
}

/// A variant attached to a gene, RNA or protein term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    /// Sequence variant in HGVS notation, e.g. `p.Ala127Tyr`.
    Hgvs { identifier: String },
    /// Protein fragment, either a `start`/`stop` range or a `missing` marker.
    Fragment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stop: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        missing: Option<String>,
    },
    /// Generic (gene) modification, e.g. methylation.
    Gmod { identifier: EntityRef },
    /// Protein modification with optional residue code and position.
    Pmod {
        identifier: EntityRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<u32>,
    },
}

/// Fusion of a 5' and a 3' partner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Fusion {
    pub partner_5p: EntityRef,
    pub range_5p: FusionRange,
    pub partner_3p: EntityRef,
    pub range_3p: FusionRange,
}

/// The retained range of one fusion partner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FusionRange {
    Missing {
        #[serde(default = "default_missing")]
        missing: String,
    },
    Enumerated {
        reference: String,
        start: String,
        stop: String,
    },
}

fn default_missing() -> String {
    "?".to_string()
}
