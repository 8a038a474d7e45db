//! ID prefix constants for rows that are not content-addressed.
//!
//! Content-addressed rows (term instances, edges, citations, ...) use their
//! fingerprint as primary key. Everything else gets a prefixed random ID,
//! e.g. `voc-a3f8b2c1`.

pub const PREFIX_VOCABULARY: &str = "voc";
pub const PREFIX_EQUIVALENCE: &str = "eqv";
pub const PREFIX_NETWORK: &str = "net";

pub const ALL_PREFIXES: &[&str] = &[PREFIX_VOCABULARY, PREFIX_EQUIVALENCE, PREFIX_NETWORK];
