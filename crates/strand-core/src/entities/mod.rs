//! Entity structs for every persisted Strand row.
//!
//! Vocabulary-side rows (vocabularies, entries, equivalence classes, networks)
//! carry generated IDs. The seven deduplicated kinds carry a [`Fingerprint`]
//! as primary key; each exposes the function computing it from its basis.
//!
//! [`Fingerprint`]: crate::fingerprint::Fingerprint

mod citation;
mod edge;
mod modification;
mod network;
mod property;
mod term;
mod vocabulary;

pub use citation::{Author, Citation, Evidence};
pub use edge::StatementEdge;
pub use modification::{EntryKey, FragmentSpan, Modification, ModificationKind};
pub use network::Network;
pub use property::{Property, PropertyKind, PropertyValue, TranslocationEffect};
pub use term::TermInstance;
pub use vocabulary::{DEFAULT_ENCODING, EquivalenceClass, Vocabulary, VocabularyEntry};
