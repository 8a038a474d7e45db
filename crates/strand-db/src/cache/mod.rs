//! Process-local caches owned by one [`GraphStore`](crate::service::GraphStore).
//!
//! Neither cache is bounded or expired; both live as long as the store.

mod entity;
mod resource;

pub use entity::{CacheStats, CachedEntity, EntityCache, KindCache, StagedRow};
pub use resource::{ResourceCache, VocabularyHandle, VocabularyKey};
