//! End-to-end tests for graph ingestion and network queries.
//!
//! - Two versions of one network share every deduplicated row
//! - Terms resolve against their own graph's namespace declarations
//! - Unresolvable terms are skipped together with their edges
//! - Duplicate name/version pairs are rejected
//! - A rolled-back unit of work leaves nothing behind
//! - Network queries: versions, most recent, union, drop

use std::sync::Arc;

use pretty_assertions::assert_eq;

use strand_core::enums::{EntityKind, Function, Modifier, VocabularyKind};
use strand_core::graph::{CitationData, EdgeData, Graph, ParticipantData, Term};
use strand_db::error::DatabaseError;
use strand_db::service::GraphStore;
use strand_resource::{MemoryFetcher, ResourceDescription};

const HGNC_URL: &str = "memory://hgnc";
const GOCC_URL: &str = "memory://gocc";
const ANATOMY_URL: &str = "memory://anatomy";

fn fetcher() -> Arc<MemoryFetcher> {
    Arc::new(
        MemoryFetcher::new()
            .with(
                HGNC_URL,
                ResourceDescription::from_values([
                    ("AKT1", "GRP"),
                    ("EGFR", "GRP"),
                    ("MAPK1", "GRP"),
                ])
                .with_keyword("HGNC"),
            )
            .with(
                GOCC_URL,
                ResourceDescription::from_values([("nucleus", "A"), ("cytoplasm", "A")])
                    .with_keyword("GOCC"),
            )
            .with(
                ANATOMY_URL,
                ResourceDescription::from_values([("liver", "UBERON_0002107")])
                    .with_keyword("Anatomy"),
            ),
    )
}

async fn test_store() -> (GraphStore, Arc<MemoryFetcher>) {
    let fetcher = fetcher();
    let store = GraphStore::new_local(":memory:", fetcher.clone())
        .await
        .unwrap();
    (store, fetcher)
}

/// AKT1 and EGFR regulating each other, both statements from one sentence.
fn feedback_graph(version: &str) -> Graph {
    let mut graph = Graph::new("AKT feedback", version);
    graph.namespace_url.insert("HGNC".into(), HGNC_URL.into());
    graph.namespace_url.insert("GOCC".into(), GOCC_URL.into());
    graph
        .annotation_url
        .insert("Anatomy".into(), ANATOMY_URL.into());

    let akt1 = graph.add_term(Term::named(Function::Protein, "HGNC", "AKT1"));
    let egfr = graph.add_term(Term::named(Function::Protein, "HGNC", "EGFR"));
    let citation = CitationData::new("PubMed", "12345");
    let sentence = "AKT1 and EGFR regulate each other in the liver";

    let increases = EdgeData {
        subject: Some(ParticipantData {
            modifier: Some(Modifier::Activity),
            ..ParticipantData::default()
        }),
        ..EdgeData::relation("increases")
            .with_evidence(sentence, citation.clone())
            .with_annotation("Anatomy", "liver")
    };
    graph.add_relationship(akt1, egfr, increases).unwrap();
    graph
        .add_relationship(
            egfr,
            akt1,
            EdgeData::relation("decreases").with_evidence(sentence, citation),
        )
        .unwrap();
    graph
}

// ---------------------------------------------------------------------------
// Deduplication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_versions_share_every_row() {
    let (mut store, fetcher) = test_store().await;

    let first = store.insert_graph(&feedback_graph("1.0"), true).await.unwrap();
    let second = store.insert_graph(&feedback_graph("1.1"), true).await.unwrap();
    assert_ne!(first.id, second.id);

    assert_eq!(store.count_networks().await.unwrap(), 2);
    assert_eq!(store.count_entities(EntityKind::Citation).await.unwrap(), 1);
    assert_eq!(store.count_entities(EntityKind::Evidence).await.unwrap(), 1);
    assert_eq!(
        store.count_entities(EntityKind::TermInstance).await.unwrap(),
        2
    );
    assert_eq!(
        store.count_entities(EntityKind::StatementEdge).await.unwrap(),
        2
    );
    assert_eq!(store.count_entities(EntityKind::Property).await.unwrap(), 1);

    assert_eq!(fetcher.fetch_count(HGNC_URL), 1);
    assert_eq!(fetcher.fetch_count(ANATOMY_URL), 1);

    // Both envelopes point at the same shared rows.
    assert_eq!(
        store.network_edges(&first.id).await.unwrap(),
        store.network_edges(&second.id).await.unwrap()
    );
    assert_eq!(store.network_terms(&second.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn single_edge_versions_share_one_statement() {
    let (mut store, _) = test_store().await;
    let regulation = |version: &str| {
        let mut graph = Graph::new("Gene regulation", version);
        graph.namespace_url.insert("HGNC".into(), HGNC_URL.into());
        let gene = graph.add_term(Term::named(Function::Gene, "HGNC", "AKT1"));
        let protein = graph.add_term(Term::named(Function::Protein, "HGNC", "EGFR"));
        graph
            .add_relationship(
                gene,
                protein,
                EdgeData::relation("increases")
                    .with_evidence("AKT1 drives EGFR", CitationData::new("PubMed", "12345")),
            )
            .unwrap();
        graph
    };

    let first = store.insert_graph(&regulation("1.0"), true).await.unwrap();
    let second = store.insert_graph(&regulation("1.1"), true).await.unwrap();

    assert_eq!(store.count_networks().await.unwrap(), 2);
    assert_eq!(
        store.count_entities(EntityKind::StatementEdge).await.unwrap(),
        1
    );
    assert_eq!(store.count_entities(EntityKind::Citation).await.unwrap(), 1);
    assert_eq!(store.count_entities(EntityKind::Evidence).await.unwrap(), 1);
    assert_eq!(
        store.count_entities(EntityKind::TermInstance).await.unwrap(),
        2
    );
    assert_eq!(
        store.network_edges(&first.id).await.unwrap(),
        store.network_edges(&second.id).await.unwrap()
    );
}

#[tokio::test]
async fn second_insert_is_served_from_the_cache() {
    let (mut store, _) = test_store().await;

    store.insert_graph(&feedback_graph("1.0"), true).await.unwrap();
    let after_first = store.cache_stats();
    assert!(after_first.created > 0);

    store.insert_graph(&feedback_graph("2.0"), true).await.unwrap();
    let after_second = store.cache_stats();
    assert_eq!(after_second.created, after_first.created);
    assert!(after_second.hits > after_first.hits);
    assert_eq!(store.cached_entities(EntityKind::TermInstance), 2);
}

#[tokio::test]
async fn fresh_store_deduplicates_against_committed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graphs.db");
    let path = path.to_str().unwrap();
    let fetcher = fetcher();

    let mut store = GraphStore::new_local(path, fetcher.clone()).await.unwrap();
    store.insert_graph(&feedback_graph("1.0"), true).await.unwrap();
    drop(store);

    let mut reopened = GraphStore::new_local(path, fetcher.clone()).await.unwrap();
    reopened
        .insert_graph(&feedback_graph("1.1"), true)
        .await
        .unwrap();
    assert_eq!(reopened.cache_stats().created, 0);
    assert_eq!(
        reopened
            .count_entities(EntityKind::StatementEdge)
            .await
            .unwrap(),
        2
    );
    assert_eq!(fetcher.fetch_count(HGNC_URL), 1);
}

// ---------------------------------------------------------------------------
// Partial failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn undeclared_namespace_skips_term_and_its_edges() {
    let (mut store, _) = test_store().await;
    let mut graph = feedback_graph("1.0");
    let mouse = graph.add_term(Term::named(Function::Protein, "MGI", "Akt1"));
    graph
        .add_relationship(
            mouse,
            0,
            EdgeData::relation("increases")
                .with_evidence("mouse Akt1", CitationData::new("PubMed", "999")),
        )
        .unwrap();

    let network = store.insert_graph(&graph, true).await.unwrap();

    assert_eq!(network.graph().unwrap(), graph);
    assert_eq!(store.network_terms(&network.id).await.unwrap().len(), 2);
    assert_eq!(store.network_edges(&network.id).await.unwrap().len(), 2);
    assert_eq!(store.count_entities(EntityKind::Citation).await.unwrap(), 1);
}

#[tokio::test]
async fn cached_terms_need_their_namespace_declared() {
    let (mut store, _) = test_store().await;
    store.insert_graph(&feedback_graph("1.0"), true).await.unwrap();

    let mut bare = Graph::new("No declarations", "1.0");
    let akt1 = bare.add_term(Term::named(Function::Protein, "HGNC", "AKT1"));
    let egfr = bare.add_term(Term::named(Function::Protein, "HGNC", "EGFR"));
    bare.add_relationship(
        akt1,
        egfr,
        EdgeData::relation("increases")
            .with_evidence("AKT1 and EGFR", CitationData::new("PubMed", "12345")),
    )
    .unwrap();

    let network = store.insert_graph(&bare, true).await.unwrap();
    assert!(store.network_terms(&network.id).await.unwrap().is_empty());
    assert!(store.network_edges(&network.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_entry_skips_the_term() {
    let (mut store, _) = test_store().await;
    let mut graph = feedback_graph("1.0");
    graph.add_term(Term::named(Function::Protein, "HGNC", "NOTAGENE"));

    let network = store.insert_graph(&graph, true).await.unwrap();
    assert_eq!(store.network_terms(&network.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn ephemeral_namespace_terms_are_skipped() {
    let fetcher = fetcher();
    fetcher.insert(
        "memory://live",
        ResourceDescription::from_values([("AKT1", "GRP")]).non_cachable(),
    );
    let mut store = GraphStore::new_local(":memory:", fetcher.clone())
        .await
        .unwrap();

    let mut graph = feedback_graph("1.0");
    graph
        .namespace_url
        .insert("LIVE".into(), "memory://live".into());
    graph.add_term(Term::named(Function::Protein, "LIVE", "AKT1"));

    let network = store.insert_graph(&graph, true).await.unwrap();
    assert_eq!(store.network_terms(&network.id).await.unwrap().len(), 2);
    assert!(
        store
            .get_vocabulary_by_url(VocabularyKind::Namespace, "memory://live")
            .await
            .is_err()
    );
    assert_eq!(
        store
            .list_vocabularies(VocabularyKind::Namespace)
            .await
            .unwrap()
            .len(),
        2
    );
}

// ---------------------------------------------------------------------------
// Rejections and rollback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_name_and_version_is_rejected() {
    let (mut store, _) = test_store().await;
    store.insert_graph(&feedback_graph("1.0"), false).await.unwrap();

    let mut again = feedback_graph(" 1.0 ");
    again.metadata.name = " AKT feedback".into();
    let err = store.insert_graph(&again, true).await.unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::DuplicateNetwork { ref name, ref version }
            if name == "AKT feedback" && version == "1.0"
    ));
    assert_eq!(store.count_networks().await.unwrap(), 1);
    assert_eq!(
        store.count_entities(EntityKind::TermInstance).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn rollback_evicts_uncommitted_rows() {
    let (mut store, _) = test_store().await;

    store.begin().await.unwrap();
    let author = store.get_or_create_author("Smith J").await.unwrap();
    assert_eq!(store.cached_entities(EntityKind::Author), 1);
    store.rollback().await.unwrap();

    assert_eq!(store.cached_entities(EntityKind::Author), 0);
    assert_eq!(store.count_entities(EntityKind::Author).await.unwrap(), 0);

    store.begin().await.unwrap();
    let again = store.get_or_create_author("Smith J").await.unwrap();
    store.commit().await.unwrap();
    assert_eq!(again.fingerprint, author.fingerprint);
    assert_eq!(store.count_entities(EntityKind::Author).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Network queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn network_queries_follow_versions() {
    let (mut store, _) = test_store().await;
    let old = store.insert_graph(&feedback_graph("1.0"), false).await.unwrap();
    let new = store.insert_graph(&feedback_graph("1.1"), false).await.unwrap();
    let mut other = Graph::new("Other", "0.1");
    other.namespace_url.insert("HGNC".into(), HGNC_URL.into());
    other.add_term(Term::named(Function::Protein, "HGNC", "MAPK1"));
    let other = store.insert_graph(&other, true).await.unwrap();

    assert_eq!(
        store
            .get_most_recent_network_by_name("AKT feedback")
            .await
            .unwrap()
            .id,
        new.id
    );
    let recent: Vec<String> = store
        .list_recent_networks()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(recent, vec![new.id.clone(), other.id.clone()]);
    assert_eq!(store.list_networks().await.unwrap().len(), 3);

    let union = store
        .get_graph_by_ids(&[old.id.as_str(), other.id.as_str()])
        .await
        .unwrap();
    assert_eq!(union.metadata.name, "AKT feedback");
    assert_eq!(union.terms.len(), 3);
    assert_eq!(union.relationships.len(), 2);

    store.drop_network_by_id(&old.id).await.unwrap();
    assert_eq!(
        store.get_network_versions("AKT feedback").await.unwrap(),
        ["1.1".to_string()].into_iter().collect()
    );
    assert!(matches!(
        store.get_network_by_id(&old.id).await,
        Err(DatabaseError::NotFound { .. })
    ));
}
