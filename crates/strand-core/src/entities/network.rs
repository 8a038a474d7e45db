use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::graph::Graph;

/// Stored envelope of one network version: metadata plus the full JSON snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub authors: Option<String>,
    pub contact: Option<String>,
    pub licenses: Option<String>,
    pub copyright: Option<String>,
    pub disclaimer: Option<String>,
    pub blob: String,
    pub created: DateTime<Utc>,
}

impl Network {
    /// Decode the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the blob is not a valid graph document.
    pub fn graph(&self) -> Result<Graph, CoreError> {
        Graph::from_json(&self.blob)
    }
}
