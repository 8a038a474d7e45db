use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::fingerprint::Fingerprint;
use crate::graph::EdgeData;

/// A deduplicated statement between two term instances.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatementEdge {
    pub fingerprint: Fingerprint,
    pub source: Fingerprint,
    pub target: Fingerprint,
    pub relation: String,
    pub bel: String,
    /// JSON of the originating [`EdgeData`].
    pub blob: String,
    pub evidence: Option<Fingerprint>,
    /// Ordered property fingerprints.
    pub properties: Vec<Fingerprint>,
    /// Annotation vocabulary entry IDs.
    pub annotations: Vec<i64>,
}

impl StatementEdge {
    /// Fingerprint over both endpoints, the relation and the full edge data.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the data cannot be serialized.
    pub fn fingerprint_of(
        source: &Fingerprint,
        target: &Fingerprint,
        relation: &str,
        data: &EdgeData,
    ) -> Result<Fingerprint, CoreError> {
        Fingerprint::of(&(source, target, relation, data))
    }
}
