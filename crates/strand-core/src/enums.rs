//! Closed enums for vocabulary kinds, term functions, participants and entity kinds.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for the string stored in SQL.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// VocabularyKind
// ---------------------------------------------------------------------------

/// Whether a controlled vocabulary names terms (namespace) or tags edge context (annotation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyKind {
    Namespace,
    Annotation,
}

impl VocabularyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Annotation => "annotation",
        }
    }
}

impl fmt::Display for VocabularyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Function
// ---------------------------------------------------------------------------

/// The function (type tag) of a term in a causal network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    Abundance,
    Gene,
    Rna,
    MiRna,
    Protein,
    BiologicalProcess,
    Pathology,
    Complex,
    Composite,
}

impl Function {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abundance => "abundance",
            Self::Gene => "gene",
            Self::Rna => "rna",
            Self::MiRna => "mi_rna",
            Self::Protein => "protein",
            Self::BiologicalProcess => "biological_process",
            Self::Pathology => "pathology",
            Self::Complex => "complex",
            Self::Composite => "composite",
        }
    }

    /// Short function name used in canonical statement text, e.g. `p` for proteins.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Abundance => "a",
            Self::Gene => "g",
            Self::Rna => "r",
            Self::MiRna => "m",
            Self::Protein => "p",
            Self::BiologicalProcess => "bp",
            Self::Pathology => "path",
            Self::Complex => "complex",
            Self::Composite => "composite",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// Which end of a statement a property describes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
    Subject,
    Object,
}

impl Participant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Modifier
// ---------------------------------------------------------------------------

/// Modifier applied to a statement participant in a graph document.
///
/// A participant without an explicit modifier is a plain location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Location,
    Activity,
    Translocation,
    Degradation,
    CellSecretion,
    CellSurfaceExpression,
}

impl Modifier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Activity => "activity",
            Self::Translocation => "translocation",
            Self::Degradation => "degradation",
            Self::CellSecretion => "cell_secretion",
            Self::CellSurfaceExpression => "cell_surface_expression",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// The seven content-addressed entity kinds kept by the deduplication store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    TermInstance,
    StatementEdge,
    Citation,
    Evidence,
    Author,
    Modification,
    Property,
}

impl EntityKind {
    pub const ALL: [Self; 7] = [
        Self::TermInstance,
        Self::StatementEdge,
        Self::Citation,
        Self::Evidence,
        Self::Author,
        Self::Modification,
        Self::Property,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TermInstance => "term_instance",
            Self::StatementEdge => "statement_edge",
            Self::Citation => "citation",
            Self::Evidence => "evidence",
            Self::Author => "author",
            Self::Modification => "modification",
            Self::Property => "property",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
