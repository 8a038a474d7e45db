use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::fingerprint::Fingerprint;

/// A literature reference, identified by trimmed `(type, reference)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Citation {
    pub fingerprint: Fingerprint,
    pub kind: String,
    pub reference: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub date: Option<NaiveDate>,
    pub first_author: Option<String>,
    pub last_author: Option<String>,
    /// Ordered, duplicate-free author names.
    pub authors: Vec<String>,
}

impl Citation {
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the basis cannot be serialized.
    pub fn fingerprint_of(kind: &str, reference: &str) -> Result<Fingerprint, CoreError> {
        Fingerprint::of(&("citation", kind.trim(), reference.trim()))
    }
}

/// Supporting text for a statement, owned by one citation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Evidence {
    pub fingerprint: Fingerprint,
    pub text: String,
    pub citation: Fingerprint,
}

impl Evidence {
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the basis cannot be serialized.
    pub fn fingerprint_of(
        text: &str,
        citation_kind: &str,
        citation_reference: &str,
    ) -> Result<Fingerprint, CoreError> {
        Fingerprint::of(&(
            "evidence",
            text,
            citation_kind.trim(),
            citation_reference.trim(),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Author {
    pub fingerprint: Fingerprint,
    pub name: String,
}

impl Author {
    /// Authors match on the trimmed name, case preserved.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the basis cannot be serialized.
    pub fn fingerprint_of(name: &str) -> Result<Fingerprint, CoreError> {
        Fingerprint::of(&("author", name.trim()))
    }
}
