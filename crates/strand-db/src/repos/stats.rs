//! Row counts per entity kind.

use strand_core::enums::EntityKind;

use crate::error::DatabaseError;
use crate::helpers::{entity_kind_to_table, fetch_count};
use crate::service::GraphStore;

impl GraphStore {
    /// Committed rows of one entity kind. Staged rows are not counted.
    pub async fn count_entities(&self, kind: EntityKind) -> Result<u64, DatabaseError> {
        let table = entity_kind_to_table(kind);
        let rows = self
            .db()
            .conn()
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await?;
        fetch_count(rows).await
    }

    /// Committed row counts for every entity kind.
    pub async fn entity_counts(&self) -> Result<Vec<(EntityKind, u64)>, DatabaseError> {
        let mut counts = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            counts.push((kind, self.count_entities(kind).await?));
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::helpers::{fixture_store, sample_graph};

    #[tokio::test]
    async fn counts_follow_a_deep_insert() {
        let (mut store, _) = fixture_store().await;
        assert!(
            store
                .entity_counts()
                .await
                .unwrap()
                .iter()
                .all(|(_, n)| *n == 0)
        );

        store.insert_graph(&sample_graph("1.0"), true).await.unwrap();
        let counts: HashMap<_, _> =
            store.entity_counts().await.unwrap().into_iter().collect();
        assert_eq!(counts[&EntityKind::TermInstance], 2);
        assert_eq!(counts[&EntityKind::StatementEdge], 1);
        assert_eq!(counts[&EntityKind::Citation], 1);
        assert_eq!(counts[&EntityKind::Evidence], 1);
        assert_eq!(counts[&EntityKind::Property], 1);
        assert_eq!(counts[&EntityKind::Author], 0);
        assert_eq!(counts[&EntityKind::Modification], 0);
    }
}
