//! Term instance and modification repository.

use std::sync::Arc;

use strand_core::entities::{EntryKey, FragmentSpan, Modification, ModificationKind, TermInstance};
use strand_core::enums::VocabularyKind;
use strand_core::fingerprint::Fingerprint;
use strand_core::graph::{EntityRef, Graph, Term, Variant};

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, parse_enum, parse_json, parse_json_list};
use crate::service::GraphStore;

const TERM_SELECT: &str = "SELECT t.fingerprint, t.function, t.bel, t.blob, t.entry_id,
        t.namespace_pattern, t.is_variant, t.is_fusion,
        (SELECT json_group_array(modification) FROM (
            SELECT modification FROM term_modifications
            WHERE term = t.fingerprint ORDER BY position))
     FROM term_instances t WHERE t.fingerprint = ?1";

fn row_to_term_instance(row: &libsql::Row) -> Result<TermInstance, DatabaseError> {
    Ok(TermInstance {
        fingerprint: Fingerprint::from_hex(row.get::<String>(0)?),
        function: parse_enum(&row.get::<String>(1)?)?,
        bel: row.get::<String>(2)?,
        blob: row.get::<String>(3)?,
        entry_id: row.get::<Option<i64>>(4)?,
        namespace_pattern: get_opt_string(row, 5)?,
        is_variant: get_bool(row, 6)?,
        is_fusion: get_bool(row, 7)?,
        modifications: parse_json_list(get_opt_string(row, 8)?.as_deref())?,
    })
}

fn row_to_modification(row: &libsql::Row) -> Result<Modification, DatabaseError> {
    Ok(Modification {
        fingerprint: Fingerprint::from_hex(row.get::<String>(0)?),
        kind: parse_json(&row.get::<String>(1)?)?,
        partner_5p_entry: row.get::<Option<i64>>(2)?,
        partner_3p_entry: row.get::<Option<i64>>(3)?,
    })
}

/// What a namespace keyword of a graph points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NamespaceRef<'g> {
    /// A stored vocabulary, declared by URL or as an ontology.
    Url(&'g str),
    /// A regular expression; names are not backed by entries.
    Pattern(&'g str),
}

/// Resolve `keyword` against the graph's namespace URLs, then ontologies,
/// then patterns.
pub(crate) fn resolve_namespace<'g>(
    graph: &'g Graph,
    keyword: &str,
) -> Result<NamespaceRef<'g>, DatabaseError> {
    if let Some(url) = graph.namespace_url.get(keyword) {
        return Ok(NamespaceRef::Url(url));
    }
    if let Some(url) = graph.namespace_owl.get(keyword) {
        return Ok(NamespaceRef::Url(url));
    }
    if let Some(pattern) = graph.namespace_pattern.get(keyword) {
        return Ok(NamespaceRef::Pattern(pattern));
    }
    Err(DatabaseError::UnknownReference {
        keyword: keyword.to_string(),
    })
}

impl GraphStore {
    /// Get or create the term instance of `term`, a term of `graph`.
    ///
    /// Named terms resolve to their namespace entry; terms in a pattern
    /// namespace keep the pattern instead. References resolve against
    /// `graph` even when the instance is already cached or stored.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::UnknownReference` if the graph does not declare
    /// a namespace the term uses and `DatabaseError::NotFound` if a name is
    /// not in its vocabulary.
    pub async fn get_or_create_term_instance(
        &mut self,
        graph: &Graph,
        term: &Term,
    ) -> Result<Arc<TermInstance>, DatabaseError> {
        // The fingerprint only carries the namespace keyword.
        let (entry_id, namespace_pattern) = match term.entity() {
            Some((namespace, name)) => match resolve_namespace(graph, namespace)? {
                NamespaceRef::Url(url) => {
                    let entry = self.get_entry(VocabularyKind::Namespace, url, name).await?;
                    (Some(entry.id), None)
                }
                NamespaceRef::Pattern(pattern) => (None, Some(pattern.to_string())),
            },
            None => (None, None),
        };
        if let Some(fusion) = &term.fusion {
            self.resolve_entity(graph, &fusion.partner_5p).await?;
            self.resolve_entity(graph, &fusion.partner_3p).await?;
        }

        let fingerprint = TermInstance::fingerprint_of(term)?;
        if let Some(instance) = self.entities.lookup::<TermInstance>(&fingerprint) {
            return Ok(instance);
        }
        if let Some(instance) = self.find_term_instance(&fingerprint).await? {
            return Ok(self.entities.remember(instance));
        }

        let modifications = self.get_or_create_modifications(graph, term).await?;

        Ok(self.entities.stage(TermInstance {
            fingerprint,
            function: term.function,
            bel: self.canonicalizer.term_to_text(graph, term),
            blob: serde_json::to_string(term)?,
            entry_id,
            namespace_pattern,
            is_variant: term.is_variant(),
            is_fusion: term.fusion.is_some(),
            modifications: modifications
                .iter()
                .map(|m| m.fingerprint.clone())
                .collect(),
        }))
    }

    /// Get or create the modifications of `term`: its fusion first, then
    /// one per variant in order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::UnknownReference` or `DatabaseError::NotFound`
    /// if a fusion partner cannot be resolved.
    pub async fn get_or_create_modifications(
        &mut self,
        graph: &Graph,
        term: &Term,
    ) -> Result<Vec<Arc<Modification>>, DatabaseError> {
        let mut modifications = Vec::with_capacity(term.variants.len() + 1);

        if let Some(fusion) = &term.fusion {
            let (partner_5p, entry_5p) = self.resolve_entity(graph, &fusion.partner_5p).await?;
            let (partner_3p, entry_3p) = self.resolve_entity(graph, &fusion.partner_3p).await?;
            let kind = ModificationKind::Fusion {
                partner_5p,
                partner_3p,
                range_5p: fusion.range_5p.clone(),
                range_3p: fusion.range_3p.clone(),
            };
            modifications.push(self.get_or_create_modification(kind, entry_5p, entry_3p).await?);
        }

        for variant in &term.variants {
            let kind = modification_kind(variant);
            modifications.push(self.get_or_create_modification(kind, None, None).await?);
        }
        Ok(modifications)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no term instance has this fingerprint.
    pub async fn get_term_instance(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<TermInstance, DatabaseError> {
        self.find_term_instance(fingerprint)
            .await?
            .ok_or_else(|| DatabaseError::not_found("term instance", fingerprint.as_str()))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no modification has this fingerprint.
    pub async fn get_modification(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Modification, DatabaseError> {
        self.find_modification(fingerprint)
            .await?
            .ok_or_else(|| DatabaseError::not_found("modification", fingerprint.as_str()))
    }

    /// Entry key of a `namespace:name` reference and, for stored vocabularies,
    /// the entry's row ID.
    pub(crate) async fn resolve_entity(
        &self,
        graph: &Graph,
        entity: &EntityRef,
    ) -> Result<(EntryKey, Option<i64>), DatabaseError> {
        match resolve_namespace(graph, &entity.namespace)? {
            NamespaceRef::Url(url) => {
                let entry = self
                    .get_entry(VocabularyKind::Namespace, url, &entity.name)
                    .await?;
                Ok((EntryKey::new(url, entity.name.as_str()), Some(entry.id)))
            }
            NamespaceRef::Pattern(pattern) => {
                Ok((EntryKey::new(pattern, entity.name.as_str()), None))
            }
        }
    }

    async fn get_or_create_modification(
        &mut self,
        kind: ModificationKind,
        partner_5p_entry: Option<i64>,
        partner_3p_entry: Option<i64>,
    ) -> Result<Arc<Modification>, DatabaseError> {
        let fingerprint = kind.fingerprint()?;
        if let Some(modification) = self.entities.lookup::<Modification>(&fingerprint) {
            return Ok(modification);
        }
        if let Some(modification) = self.find_modification(&fingerprint).await? {
            return Ok(self.entities.remember(modification));
        }
        Ok(self.entities.stage(Modification {
            fingerprint,
            kind,
            partner_5p_entry,
            partner_3p_entry,
        }))
    }

    async fn find_term_instance(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<TermInstance>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(TERM_SELECT, [fingerprint.as_str()])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_term_instance(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_modification(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Modification>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT fingerprint, payload, partner_5p_entry, partner_3p_entry
                 FROM modifications WHERE fingerprint = ?1",
                [fingerprint.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_modification(&row)?)),
            None => Ok(None),
        }
    }

    // ── Flush writers ──────────────────────────────────────────────

    pub(crate) async fn write_modification(
        &self,
        modification: &Modification,
    ) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO modifications (fingerprint, kind, payload, partner_5p_entry, partner_3p_entry)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    modification.fingerprint.as_str(),
                    modification.kind.as_str(),
                    serde_json::to_string(&modification.kind)?,
                    modification.partner_5p_entry,
                    modification.partner_3p_entry
                ],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn write_term_instance(
        &self,
        term: &TermInstance,
    ) -> Result<(), DatabaseError> {
        let conn = self.db().conn();
        conn.execute(
            "INSERT INTO term_instances (fingerprint, function, bel, blob, entry_id,
                 namespace_pattern, is_variant, is_fusion)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            libsql::params![
                term.fingerprint.as_str(),
                term.function.as_str(),
                term.bel.as_str(),
                term.blob.as_str(),
                term.entry_id,
                term.namespace_pattern.as_deref(),
                i64::from(term.is_variant),
                i64::from(term.is_fusion)
            ],
        )
        .await?;

        for (position, modification) in term.modifications.iter().enumerate() {
            conn.execute(
                "INSERT INTO term_modifications (term, modification, position) VALUES (?1, ?2, ?3)",
                libsql::params![
                    term.fingerprint.as_str(),
                    modification.as_str(),
                    i64::try_from(position).unwrap_or(i64::MAX)
                ],
            )
            .await?;
        }
        Ok(())
    }
}

fn modification_kind(variant: &Variant) -> ModificationKind {
    match variant {
        Variant::Hgvs { identifier } => ModificationKind::Hgvs {
            variant: identifier.trim().to_string(),
        },
        Variant::Fragment {
            start,
            stop,
            missing,
        } => {
            let span = match (start, stop) {
                (Some(start), Some(stop)) => FragmentSpan::Range {
                    start: start.clone(),
                    stop: stop.clone(),
                },
                _ => FragmentSpan::Missing {
                    marker: missing.clone().unwrap_or_else(|| "?".to_string()),
                },
            };
            ModificationKind::Fragment { span }
        }
        Variant::Gmod { identifier } => ModificationKind::Gmod {
            namespace: identifier.namespace.trim().to_string(),
            name: identifier.name.trim().to_string(),
        },
        Variant::Pmod {
            identifier,
            code,
            position,
        } => ModificationKind::Pmod {
            namespace: identifier.namespace.trim().to_string(),
            name: identifier.name.trim().to_string(),
            residue: code.as_deref().map(|c| c.trim().to_string()),
            position: *position,
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strand_core::enums::{EntityKind, Function};
    use strand_core::graph::{Fusion, FusionRange};

    use super::*;
    use crate::test_support::helpers::{HGNC_URL, fixture_store, sample_graph};

    fn phospho_akt1() -> Term {
        Term::named(Function::Protein, "HGNC", "AKT1").with_variants(vec![
            Variant::Pmod {
                identifier: EntityRef::new("bel", "Ph"),
                code: Some("Ser".into()),
                position: Some(473),
            },
            Variant::Fragment {
                start: None,
                stop: None,
                missing: None,
            },
        ])
    }

    #[tokio::test]
    async fn named_term_resolves_its_entry() {
        let (mut store, _) = fixture_store().await;
        let graph = sample_graph("1.0");
        store.ensure_namespace(HGNC_URL).await.unwrap();

        let instance = store
            .get_or_create_term_instance(&graph, &graph.terms[0])
            .await
            .unwrap();
        let akt1 = store
            .get_entry(VocabularyKind::Namespace, HGNC_URL, "AKT1")
            .await
            .unwrap();
        assert_eq!(instance.entry_id, Some(akt1.id));
        assert_eq!(instance.bel, "p(HGNC:AKT1)");
        store.commit().await.unwrap();

        let stored = store.get_term_instance(&instance.fingerprint).await.unwrap();
        assert_eq!(stored, *instance);
    }

    #[tokio::test]
    async fn variants_become_ordered_modifications() {
        let (mut store, _) = fixture_store().await;
        let graph = sample_graph("1.0");
        store.ensure_namespace(HGNC_URL).await.unwrap();

        let instance = store
            .get_or_create_term_instance(&graph, &phospho_akt1())
            .await
            .unwrap();
        assert!(instance.is_variant);
        assert_eq!(instance.modifications.len(), 2);
        store.commit().await.unwrap();

        let fragment = store
            .get_modification(&instance.modifications[1])
            .await
            .unwrap();
        assert_eq!(
            fragment.kind,
            ModificationKind::Fragment {
                span: FragmentSpan::Missing { marker: "?".into() }
            }
        );
        let stored = store.get_term_instance(&instance.fingerprint).await.unwrap();
        assert_eq!(stored.modifications, instance.modifications);
    }

    #[tokio::test]
    async fn fusion_partners_are_resolved() {
        let (mut store, _) = fixture_store().await;
        let graph = sample_graph("1.0");
        store.ensure_namespace(HGNC_URL).await.unwrap();

        let fusion = Term::fused(
            Function::Rna,
            Fusion {
                partner_5p: EntityRef::new("HGNC", "TMPRSS2"),
                range_5p: FusionRange::Missing {
                    missing: "?".into(),
                },
                partner_3p: EntityRef::new("HGNC", "ERG"),
                range_3p: FusionRange::Missing {
                    missing: "?".into(),
                },
            },
        );
        let instance = store
            .get_or_create_term_instance(&graph, &fusion)
            .await
            .unwrap();
        assert!(instance.is_fusion);
        assert_eq!(instance.entry_id, None);

        let modification = store
            .get_or_create_modifications(&graph, &fusion)
            .await
            .unwrap()
            .remove(0);
        let erg = store
            .get_entry(VocabularyKind::Namespace, HGNC_URL, "ERG")
            .await
            .unwrap();
        assert_eq!(modification.partner_3p_entry, Some(erg.id));
        assert_eq!(store.cached_entities(EntityKind::Modification), 1);
    }

    #[tokio::test]
    async fn undeclared_namespace_is_an_unknown_reference() {
        let (mut store, _) = fixture_store().await;
        let graph = sample_graph("1.0");
        let term = Term::named(Function::Protein, "MGI", "Akt1");
        let err = store
            .get_or_create_term_instance(&graph, &term)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownReference { ref keyword } if keyword == "MGI"));
        assert_eq!(store.cached_entities(EntityKind::TermInstance), 0);
    }

    #[tokio::test]
    async fn stored_term_still_needs_a_declared_namespace() {
        let (mut store, _) = fixture_store().await;
        let graph = sample_graph("1.0");
        store.ensure_namespace(HGNC_URL).await.unwrap();
        store
            .get_or_create_term_instance(&graph, &graph.terms[0])
            .await
            .unwrap();
        store.commit().await.unwrap();

        let mut undeclared = sample_graph("2.0");
        undeclared.namespace_url.clear();
        let err = store
            .get_or_create_term_instance(&undeclared, &undeclared.terms[0])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::UnknownReference { ref keyword } if keyword == "HGNC"
        ));
    }

    #[test]
    fn modification_identifiers_are_trimmed() {
        let padded = Variant::Pmod {
            identifier: EntityRef::new(" bel", "Ph "),
            code: Some(" Ser".into()),
            position: Some(473),
        };
        let clean = Variant::Pmod {
            identifier: EntityRef::new("bel", "Ph"),
            code: Some("Ser".into()),
            position: Some(473),
        };
        assert_eq!(
            modification_kind(&padded).fingerprint().unwrap(),
            modification_kind(&clean).fingerprint().unwrap()
        );
        assert_eq!(
            modification_kind(&Variant::Hgvs {
                identifier: " p.Ala127Tyr ".into()
            }),
            ModificationKind::Hgvs {
                variant: "p.Ala127Tyr".into()
            }
        );
        assert_eq!(
            modification_kind(&Variant::Gmod {
                identifier: EntityRef::new("bel", " Me ")
            }),
            ModificationKind::Gmod {
                namespace: "bel".into(),
                name: "Me".into()
            }
        );
    }

    #[tokio::test]
    async fn pattern_namespace_keeps_the_pattern() {
        let (mut store, _) = fixture_store().await;
        let mut graph = sample_graph("1.0");
        graph
            .namespace_pattern
            .insert("dbSNP".into(), "rs[0-9]+".into());
        let term = Term::named(Function::Gene, "dbSNP", "rs123");
        let instance = store
            .get_or_create_term_instance(&graph, &term)
            .await
            .unwrap();
        assert_eq!(instance.entry_id, None);
        assert_eq!(instance.namespace_pattern.as_deref(), Some("rs[0-9]+"));
    }
}
