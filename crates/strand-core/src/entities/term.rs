use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Function;
use crate::errors::CoreError;
use crate::fingerprint::Fingerprint;
use crate::graph::Term;

/// A deduplicated network node.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TermInstance {
    pub fingerprint: Fingerprint,
    pub function: Function,
    /// Canonical text.
    pub bel: String,
    /// JSON of the originating [`Term`].
    pub blob: String,
    pub entry_id: Option<i64>,
    pub namespace_pattern: Option<String>,
    pub is_variant: bool,
    pub is_fusion: bool,
    /// Ordered modification fingerprints.
    pub modifications: Vec<Fingerprint>,
}

impl TermInstance {
    /// Fingerprint of a term: every field of the term value.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the term cannot be serialized.
    pub fn fingerprint_of(term: &Term) -> Result<Fingerprint, CoreError> {
        Fingerprint::of(term)
    }

    /// Decode the originating term.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` on a malformed blob.
    pub fn term(&self) -> Result<Term, CoreError> {
        Ok(serde_json::from_str(&self.blob)?)
    }
}
