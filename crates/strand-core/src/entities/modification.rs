use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::fingerprint::Fingerprint;
use crate::graph::FusionRange;

/// A vocabulary entry identified by resource URL and name.
///
/// Fingerprints reference entries this way rather than by row ID, so the same
/// content hashes identically in every database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct EntryKey {
    pub url: String,
    pub name: String,
}

impl EntryKey {
    #[must_use]
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FragmentSpan {
    Missing { marker: String },
    Range { start: String, stop: String },
}

/// Closed set of term modifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModificationKind {
    Hgvs {
        variant: String,
    },
    Fragment {
        span: FragmentSpan,
    },
    Gmod {
        namespace: String,
        name: String,
    },
    Pmod {
        namespace: String,
        name: String,
        residue: Option<String>,
        position: Option<u32>,
    },
    Fusion {
        partner_5p: EntryKey,
        partner_3p: EntryKey,
        range_5p: FusionRange,
        range_3p: FusionRange,
    },
}

impl ModificationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hgvs { .. } => "hgvs",
            Self::Fragment { .. } => "fragment",
            Self::Gmod { .. } => "gmod",
            Self::Pmod { .. } => "pmod",
            Self::Fusion { .. } => "fusion",
        }
    }

    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the value cannot be serialized.
    pub fn fingerprint(&self) -> Result<Fingerprint, CoreError> {
        Fingerprint::of(self)
    }
}

/// A deduplicated modification row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Modification {
    pub fingerprint: Fingerprint,
    pub kind: ModificationKind,
    /// Resolved entry row IDs of fusion partners.
    pub partner_5p_entry: Option<i64>,
    pub partner_3p_entry: Option<i64>,
}
