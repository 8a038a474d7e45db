//! Statement edge and property repository.

use std::sync::Arc;

use strand_core::entities::{
    EntryKey, Property, PropertyKind, PropertyValue, StatementEdge, TermInstance,
    TranslocationEffect,
};
use strand_core::enums::{Modifier, Participant, VocabularyKind};
use strand_core::fingerprint::Fingerprint;
use strand_core::graph::{
    EdgeData, Effect, EffectValue, EntityRef, Graph, LOCATION_KEYWORD, ParticipantData,
    Relationship,
};

use super::term::resolve_namespace;
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_enum, parse_json, parse_json_list};
use crate::service::GraphStore;

const EDGE_SELECT: &str = "SELECT e.fingerprint, e.source, e.target, e.relation, e.bel, e.blob, e.evidence,
        (SELECT json_group_array(property) FROM (
            SELECT property FROM edge_properties WHERE edge = e.fingerprint ORDER BY position)),
        (SELECT json_group_array(entry_id) FROM (
            SELECT entry_id FROM edge_annotations WHERE edge = e.fingerprint ORDER BY entry_id))
     FROM statement_edges e WHERE e.fingerprint = ?1";

fn row_to_statement_edge(row: &libsql::Row) -> Result<StatementEdge, DatabaseError> {
    Ok(StatementEdge {
        fingerprint: Fingerprint::from_hex(row.get::<String>(0)?),
        source: Fingerprint::from_hex(row.get::<String>(1)?),
        target: Fingerprint::from_hex(row.get::<String>(2)?),
        relation: row.get::<String>(3)?,
        bel: row.get::<String>(4)?,
        blob: row.get::<String>(5)?,
        evidence: get_opt_string(row, 6)?.map(Fingerprint::from_hex),
        properties: parse_json_list(get_opt_string(row, 7)?.as_deref())?,
        annotations: parse_json_list(get_opt_string(row, 8)?.as_deref())?,
    })
}

fn row_to_property(row: &libsql::Row) -> Result<Property, DatabaseError> {
    Ok(Property {
        fingerprint: Fingerprint::from_hex(row.get::<String>(0)?),
        participant: parse_enum(&row.get::<String>(1)?)?,
        kind: parse_json(&row.get::<String>(2)?)?,
        entry_id: row.get::<Option<i64>>(3)?,
    })
}

/// Rows a qualified statement edge points at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeContext {
    pub evidence: Option<Fingerprint>,
    pub properties: Vec<Fingerprint>,
    /// Annotation entry row IDs.
    pub annotations: Vec<i64>,
}

impl GraphStore {
    /// Get or create the statement edge for `relationship` between two
    /// already created term instances.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidInput` if the relationship has no relation.
    pub async fn get_or_create_statement_edge(
        &mut self,
        graph: &Graph,
        relationship: &Relationship,
        source: &TermInstance,
        target: &TermInstance,
        context: EdgeContext,
    ) -> Result<Arc<StatementEdge>, DatabaseError> {
        let relation = relationship
            .data
            .relation
            .as_deref()
            .ok_or_else(|| DatabaseError::InvalidInput("relationship has no relation".into()))?;
        let fingerprint = StatementEdge::fingerprint_of(
            &source.fingerprint,
            &target.fingerprint,
            relation,
            &relationship.data,
        )?;
        if let Some(edge) = self.entities.lookup::<StatementEdge>(&fingerprint) {
            return Ok(edge);
        }
        if let Some(edge) = self.find_statement_edge(&fingerprint).await? {
            return Ok(self.entities.remember(edge));
        }

        let mut annotations = context.annotations;
        annotations.sort_unstable();
        annotations.dedup();

        Ok(self.entities.stage(StatementEdge {
            fingerprint,
            source: source.fingerprint.clone(),
            target: target.fingerprint.clone(),
            relation: relation.to_string(),
            bel: self.canonicalizer.relationship_to_text(graph, relationship),
            blob: serde_json::to_string(&relationship.data)?,
            evidence: context.evidence,
            properties: context.properties,
            annotations,
        }))
    }

    /// Get or create the subject and object properties described by `data`.
    ///
    /// A participant without a modifier describes a location. Any other
    /// modifier also yields a location property when a location is given.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidInput` for a location modifier without a
    /// location and `DatabaseError::UnknownReference` or
    /// `DatabaseError::NotFound` when an entry cannot be resolved.
    pub async fn get_or_create_properties(
        &mut self,
        graph: &Graph,
        data: &EdgeData,
    ) -> Result<Vec<Arc<Property>>, DatabaseError> {
        let mut properties = Vec::new();
        for (participant, part) in [
            (Participant::Subject, &data.subject),
            (Participant::Object, &data.object),
        ] {
            let Some(part) = part else {
                continue;
            };
            for (kind, entry_id) in self.property_kinds(graph, part).await? {
                properties.push(self.get_or_create_property(participant, kind, entry_id).await?);
            }
        }
        Ok(properties)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no statement edge has this fingerprint.
    pub async fn get_statement_edge(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<StatementEdge, DatabaseError> {
        self.find_statement_edge(fingerprint)
            .await?
            .ok_or_else(|| DatabaseError::not_found("statement edge", fingerprint.as_str()))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no property has this fingerprint.
    pub async fn get_property(&self, fingerprint: &Fingerprint) -> Result<Property, DatabaseError> {
        self.find_property(fingerprint)
            .await?
            .ok_or_else(|| DatabaseError::not_found("property", fingerprint.as_str()))
    }

    async fn property_kinds(
        &self,
        graph: &Graph,
        part: &ParticipantData,
    ) -> Result<Vec<(PropertyKind, Option<i64>)>, DatabaseError> {
        let mut kinds = Vec::new();
        let modifier = part.modifier.unwrap_or(Modifier::Location);

        match &part.location {
            Some(location) => {
                let (location, entry_id) = self.resolve_location(graph, location).await?;
                kinds.push((PropertyKind::Location { location }, entry_id));
            }
            None if modifier == Modifier::Location => {
                return Err(DatabaseError::InvalidInput(
                    "location modifier without a location".into(),
                ));
            }
            None => {}
        }

        match modifier {
            Modifier::Location => {}
            Modifier::Activity => {
                let effect = match &part.effect {
                    Some(Effect::Entity(entity)) => Some(entity.clone()),
                    _ => None,
                };
                kinds.push((PropertyKind::Activity { effect }, None));
            }
            Modifier::Translocation => match &part.effect {
                Some(Effect::Translocation(effects)) if !effects.is_empty() => {
                    for (key, value) in effects {
                        let (value, entry_id) = match value {
                            EffectValue::Entity(entity) => {
                                let (entry, entry_id) =
                                    self.resolve_location(graph, entity).await?;
                                (PropertyValue::Entry(entry), entry_id)
                            }
                            EffectValue::Literal(literal) => {
                                (PropertyValue::Literal(literal.clone()), None)
                            }
                        };
                        let effect = TranslocationEffect {
                            key: key.clone(),
                            value,
                        };
                        kinds.push((
                            PropertyKind::Translocation {
                                effect: Some(effect),
                            },
                            entry_id,
                        ));
                    }
                }
                _ => kinds.push((PropertyKind::Translocation { effect: None }, None)),
            },
            Modifier::Degradation => kinds.push((PropertyKind::Degradation, None)),
            Modifier::CellSecretion => kinds.push((PropertyKind::CellSecretion, None)),
            Modifier::CellSurfaceExpression => {
                kinds.push((PropertyKind::CellSurfaceExpression, None));
            }
        }
        Ok(kinds)
    }

    /// Like [`Self::resolve_entity`], but an undeclared `GOCC` keyword falls
    /// back to the configured location vocabulary.
    async fn resolve_location(
        &self,
        graph: &Graph,
        entity: &EntityRef,
    ) -> Result<(EntryKey, Option<i64>), DatabaseError> {
        match resolve_namespace(graph, &entity.namespace) {
            Ok(_) => self.resolve_entity(graph, entity).await,
            Err(err) => {
                let fallback = self
                    .options
                    .location_fallback_url
                    .as_deref()
                    .filter(|_| entity.namespace == LOCATION_KEYWORD);
                let Some(url) = fallback else {
                    return Err(err);
                };
                let entry = self
                    .get_entry(VocabularyKind::Namespace, url, &entity.name)
                    .await?;
                Ok((EntryKey::new(url, entity.name.as_str()), Some(entry.id)))
            }
        }
    }

    async fn get_or_create_property(
        &mut self,
        participant: Participant,
        kind: PropertyKind,
        entry_id: Option<i64>,
    ) -> Result<Arc<Property>, DatabaseError> {
        let fingerprint = Property::fingerprint_of(participant, &kind)?;
        if let Some(property) = self.entities.lookup::<Property>(&fingerprint) {
            return Ok(property);
        }
        if let Some(property) = self.find_property(&fingerprint).await? {
            return Ok(self.entities.remember(property));
        }
        Ok(self.entities.stage(Property {
            fingerprint,
            participant,
            kind,
            entry_id,
        }))
    }

    async fn find_statement_edge(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<StatementEdge>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(EDGE_SELECT, [fingerprint.as_str()])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_statement_edge(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_property(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Property>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT fingerprint, participant, payload, entry_id
                 FROM properties WHERE fingerprint = ?1",
                [fingerprint.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_property(&row)?)),
            None => Ok(None),
        }
    }

    // ── Flush writers ──────────────────────────────────────────────

    pub(crate) async fn write_property(&self, property: &Property) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO properties (fingerprint, participant, modifier, payload, entry_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    property.fingerprint.as_str(),
                    property.participant.as_str(),
                    property.kind.modifier().as_str(),
                    serde_json::to_string(&property.kind)?,
                    property.entry_id
                ],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn write_statement_edge(
        &self,
        edge: &StatementEdge,
    ) -> Result<(), DatabaseError> {
        let conn = self.db().conn();
        conn.execute(
            "INSERT INTO statement_edges (fingerprint, source, target, relation, bel, blob, evidence)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            libsql::params![
                edge.fingerprint.as_str(),
                edge.source.as_str(),
                edge.target.as_str(),
                edge.relation.as_str(),
                edge.bel.as_str(),
                edge.blob.as_str(),
                edge.evidence.as_ref().map(Fingerprint::as_str)
            ],
        )
        .await?;

        for (position, property) in edge.properties.iter().enumerate() {
            conn.execute(
                "INSERT INTO edge_properties (edge, property, position) VALUES (?1, ?2, ?3)",
                libsql::params![
                    edge.fingerprint.as_str(),
                    property.as_str(),
                    i64::try_from(position).unwrap_or(i64::MAX)
                ],
            )
            .await?;
        }
        for entry_id in &edge.annotations {
            conn.execute(
                "INSERT OR IGNORE INTO edge_annotations (edge, entry_id) VALUES (?1, ?2)",
                libsql::params![edge.fingerprint.as_str(), *entry_id],
            )
            .await?;
        }
        Ok(())
    }
}
