//! Vocabulary models, their entries and ontology edge sets, keyed by `(kind, url)`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use strand_core::entities::{Vocabulary, VocabularyEntry};
use strand_core::enums::VocabularyKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VocabularyKey {
    pub kind: VocabularyKind,
    pub url: String,
}

impl VocabularyKey {
    #[must_use]
    pub fn new(kind: VocabularyKind, url: &str) -> Self {
        Self {
            kind,
            url: url.to_string(),
        }
    }
}

/// Result of ensuring a vocabulary.
///
/// Non-cachable resources are never written to the store; callers get their
/// `name -> value` mapping directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabularyHandle {
    Persisted(Arc<Vocabulary>),
    Ephemeral(Arc<BTreeMap<String, String>>),
}

impl VocabularyHandle {
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Ephemeral(_))
    }

    #[must_use]
    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        match self {
            Self::Persisted(vocabulary) => Some(vocabulary),
            Self::Ephemeral(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResourceCache {
    models: HashMap<VocabularyKey, Arc<Vocabulary>>,
    entries: HashMap<VocabularyKey, HashMap<String, Arc<VocabularyEntry>>>,
    edges: HashMap<VocabularyKey, BTreeSet<(String, String)>>,
}

impl ResourceCache {
    #[must_use]
    pub fn model(&self, key: &VocabularyKey) -> Option<Arc<Vocabulary>> {
        self.models.get(key).cloned()
    }

    /// Cached entries of a vocabulary, if it has been loaded.
    #[must_use]
    pub fn entries(&self, key: &VocabularyKey) -> Option<&HashMap<String, Arc<VocabularyEntry>>> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn edges(&self, key: &VocabularyKey) -> Option<&BTreeSet<(String, String)>> {
        self.edges.get(key)
    }

    /// Cache a vocabulary with its entries and `(parent, child)` edges,
    /// replacing anything cached before. Edges are kept for ontologies only.
    pub fn insert(
        &mut self,
        key: VocabularyKey,
        model: Arc<Vocabulary>,
        entries: impl IntoIterator<Item = VocabularyEntry>,
        edges: BTreeSet<(String, String)>,
    ) {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), Arc::new(entry)))
            .collect();
        self.entries.insert(key.clone(), entries);
        if model.is_ontology {
            self.edges.insert(key.clone(), edges);
        } else {
            self.edges.remove(&key);
        }
        self.models.insert(key, model);
    }

    /// Forget one vocabulary entirely.
    pub fn remove(&mut self, key: &VocabularyKey) {
        self.models.remove(key);
        self.entries.remove(key);
        self.edges.remove(key);
    }

    pub fn clear(&mut self) {
        self.models.clear();
        self.entries.clear();
        self.edges.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn model(url: &str, is_ontology: bool) -> Arc<Vocabulary> {
        Arc::new(Vocabulary {
            id: format!("voc-{url}"),
            kind: VocabularyKind::Namespace,
            url: url.to_string(),
            keyword: None,
            name: None,
            domain: None,
            version: None,
            description: None,
            author: None,
            contact: None,
            species: None,
            is_ontology,
            has_equivalences: false,
            created_at: Utc::now(),
        })
    }

    #[test]
    fn flat_vocabularies_have_no_edge_set() {
        let mut cache = ResourceCache::default();
        let flat = VocabularyKey::new(VocabularyKind::Namespace, "memory://flat");
        let tree = VocabularyKey::new(VocabularyKind::Namespace, "memory://tree");
        let edges: BTreeSet<(String, String)> =
            [("root".to_string(), "leaf".to_string())].into_iter().collect();

        cache.insert(flat.clone(), model("memory://flat", false), [], edges.clone());
        cache.insert(tree.clone(), model("memory://tree", true), [], edges.clone());

        assert!(cache.edges(&flat).is_none());
        assert_eq!(cache.edges(&tree), Some(&edges));
        assert_eq!(cache.len(), 2);

        cache.insert(tree.clone(), model("memory://tree", false), [], edges);
        assert!(cache.edges(&tree).is_none());
    }
}
