//! Repository modules implementing the store operations.
//!
//! Each module adds methods to `GraphStore` via `impl GraphStore` blocks.

pub mod citation;
pub mod edge;
pub mod equivalence;
pub mod insert;
pub mod network;
pub mod ontology;
pub mod stats;
pub mod term;
pub mod vocabulary;
