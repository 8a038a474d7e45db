use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::modification::EntryKey;
use crate::enums::{Modifier, Participant};
use crate::errors::CoreError;
use crate::fingerprint::Fingerprint;
use crate::graph::EntityRef;

/// Value of one translocation effect key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Literal(String),
    Entry(EntryKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct TranslocationEffect {
    /// e.g. `fromLoc`, `toLoc`.
    pub key: String,
    pub value: PropertyValue,
}

/// Closed set of participant modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "modifier", rename_all = "snake_case")]
pub enum PropertyKind {
    Location {
        location: EntryKey,
    },
    Activity {
        effect: Option<EntityRef>,
    },
    Translocation {
        effect: Option<TranslocationEffect>,
    },
    Degradation,
    CellSecretion,
    CellSurfaceExpression,
}

impl PropertyKind {
    #[must_use]
    pub const fn modifier(&self) -> Modifier {
        match self {
            Self::Location { .. } => Modifier::Location,
            Self::Activity { .. } => Modifier::Activity,
            Self::Translocation { .. } => Modifier::Translocation,
            Self::Degradation => Modifier::Degradation,
            Self::CellSecretion => Modifier::CellSecretion,
            Self::CellSurfaceExpression => Modifier::CellSurfaceExpression,
        }
    }

    /// The vocabulary entry this property points at, if any.
    #[must_use]
    pub const fn entry(&self) -> Option<&EntryKey> {
        match self {
            Self::Location { location } => Some(location),
            Self::Translocation {
                effect:
                    Some(TranslocationEffect {
                        value: PropertyValue::Entry(key),
                        ..
                    }),
            } => Some(key),
            _ => None,
        }
    }
}

/// A deduplicated property row attached to statement edges.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Property {
    pub fingerprint: Fingerprint,
    pub participant: Participant,
    pub kind: PropertyKind,
    /// Row ID of [`PropertyKind::entry`] once resolved.
    pub entry_id: Option<i64>,
}

impl Property {
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the basis cannot be serialized.
    pub fn fingerprint_of(
        participant: Participant,
        kind: &PropertyKind,
    ) -> Result<Fingerprint, CoreError> {
        Fingerprint::of(&(participant, kind))
    }
}
