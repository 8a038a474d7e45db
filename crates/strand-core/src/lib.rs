//! # strand-core
//!
//! Core types, fingerprints, and error types for Strand.
//!
//! This crate provides the foundational types shared across all Strand crates:
//! - Graph documents: the in-memory network handed to the store for ingestion
//! - Entity structs for every persisted row kind (vocabularies, term instances,
//!   statement edges, citations, evidences, authors, modifications, properties)
//! - Closed enums for vocabulary kinds, term functions and participant roles
//! - Content fingerprints used as deduplication keys
//! - The canonicalizer seam producing human-readable statement text
//! - Cross-cutting error types

pub mod canonical;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod fingerprint;
pub mod graph;
pub mod ids;
