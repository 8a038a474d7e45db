//! In-memory resource fetcher for tests and embedded fixtures.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::ResourceError;
use crate::{ResourceDescription, ResourceFetcher};

/// Serves registered descriptions and counts fetches per URL.
#[derive(Default)]
pub struct MemoryFetcher {
    resources: Mutex<HashMap<String, ResourceDescription>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemoryFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the description served for `url`.
    pub fn insert(&self, url: impl Into<String>, description: ResourceDescription) {
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), description);
    }

    #[must_use]
    pub fn with(self, url: impl Into<String>, description: ResourceDescription) -> Self {
        self.insert(url, description);
        self
    }

    /// How many times `url` has been fetched, including failed fetches.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<ResourceDescription, ResourceError> {
        *self
            .fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default() += 1;
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .ok_or_else(|| ResourceError::UnknownUrl(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_every_fetch() {
        let fetcher =
            MemoryFetcher::new().with("mem://hgnc", ResourceDescription::from_values([("AKT1", "GRP")]));

        fetcher.fetch("mem://hgnc").await.unwrap();
        fetcher.fetch("mem://hgnc").await.unwrap();
        assert!(matches!(
            fetcher.fetch("mem://missing").await,
            Err(ResourceError::UnknownUrl(_))
        ));

        assert_eq!(fetcher.fetch_count("mem://hgnc"), 2);
        assert_eq!(fetcher.fetch_count("mem://missing"), 1);
        assert_eq!(fetcher.fetch_count("mem://never"), 0);
    }
}
