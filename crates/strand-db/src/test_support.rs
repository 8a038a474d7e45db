#[cfg(test)]
pub(crate) mod helpers {
    use std::sync::Arc;

    use strand_core::enums::{Function, Modifier};
    use strand_core::graph::{CitationData, EdgeData, Graph, ParticipantData, Term};
    use strand_resource::{MemoryFetcher, ResourceDescription};

    use crate::service::GraphStore;

    pub const HGNC_URL: &str = "memory://hgnc";
    pub const GOCC_URL: &str = "memory://gocc";
    pub const ANATOMY_URL: &str = "memory://anatomy";

    /// In-memory store whose fetcher serves exactly `resources`.
    pub async fn store_with(
        resources: Vec<(&str, ResourceDescription)>,
    ) -> (GraphStore, Arc<MemoryFetcher>) {
        file_store(":memory:", resources).await
    }

    pub async fn file_store(
        path: &str,
        resources: Vec<(&str, ResourceDescription)>,
    ) -> (GraphStore, Arc<MemoryFetcher>) {
        let fetcher = Arc::new(MemoryFetcher::new());
        for (url, description) in resources {
            fetcher.insert(url, description);
        }
        let store = GraphStore::new_local(path, fetcher.clone()).await.unwrap();
        (store, fetcher)
    }

    /// Store serving the HGNC and GOCC namespaces and the Anatomy annotation.
    pub async fn fixture_store() -> (GraphStore, Arc<MemoryFetcher>) {
        store_with(vec![
            (
                HGNC_URL,
                ResourceDescription::from_values([
                    ("AKT1", "GRP"),
                    ("EGFR", "GRP"),
                    ("MAPK1", "GRP"),
                    ("TMPRSS2", "G"),
                    ("ERG", "GRP"),
                ])
                .with_keyword("HGNC"),
            ),
            (
                GOCC_URL,
                ResourceDescription::from_values([("nucleus", "A"), ("cytoplasm", "A")])
                    .with_keyword("GOCC"),
            ),
            (
                ANATOMY_URL,
                ResourceDescription::from_values([
                    ("liver", "UBERON_0002107"),
                    ("lung", "UBERON_0002048"),
                ])
                .with_keyword("Anatomy"),
            ),
        ])
        .await
    }

    /// `act(p(HGNC:AKT1)) increases p(HGNC:EGFR)`, cited and annotated.
    pub fn sample_graph(version: &str) -> Graph {
        let mut graph = Graph::new("Sample", version);
        graph.namespace_url.insert("HGNC".into(), HGNC_URL.into());
        graph.namespace_url.insert("GOCC".into(), GOCC_URL.into());
        graph
            .annotation_url
            .insert("Anatomy".into(), ANATOMY_URL.into());

        let akt1 = graph.add_term(Term::named(Function::Protein, "HGNC", "AKT1"));
        let egfr = graph.add_term(Term::named(Function::Protein, "HGNC", "EGFR"));
        let data = EdgeData {
            subject: Some(ParticipantData {
                modifier: Some(Modifier::Activity),
                ..ParticipantData::default()
            }),
            ..EdgeData::relation("increases")
                .with_evidence("AKT1 increases EGFR", CitationData::new("PubMed", "12345"))
                .with_annotation("Anatomy", "liver")
        };
        graph.add_relationship(akt1, egfr, data).unwrap();
        graph
    }
}
