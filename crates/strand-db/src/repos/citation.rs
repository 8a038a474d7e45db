//! Citation, evidence and author repository.

use std::sync::Arc;

use chrono::NaiveDate;

use strand_core::entities::{Author, Citation, Evidence};
use strand_core::fingerprint::Fingerprint;
use strand_core::graph::CitationData;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_json_list, parse_optional_date};
use crate::service::GraphStore;

const CITATION_SELECT: &str = "SELECT c.fingerprint, c.kind, c.reference, c.name, c.title, c.volume, c.issue,
        c.pages, c.date,
        (SELECT name FROM authors WHERE fingerprint = c.first_author),
        (SELECT name FROM authors WHERE fingerprint = c.last_author),
        (SELECT json_group_array(name) FROM (
            SELECT a.name FROM citation_authors ca
            JOIN authors a ON a.fingerprint = ca.author
            WHERE ca.citation = c.fingerprint ORDER BY ca.position))
     FROM citations c WHERE c.fingerprint = ?1";

fn row_to_citation(row: &libsql::Row) -> Result<Citation, DatabaseError> {
    Ok(Citation {
        fingerprint: Fingerprint::from_hex(row.get::<String>(0)?),
        kind: row.get::<String>(1)?,
        reference: row.get::<String>(2)?,
        name: get_opt_string(row, 3)?,
        title: get_opt_string(row, 4)?,
        volume: get_opt_string(row, 5)?,
        issue: get_opt_string(row, 6)?,
        pages: get_opt_string(row, 7)?,
        date: parse_optional_date(get_opt_string(row, 8)?.as_deref())?,
        first_author: get_opt_string(row, 9)?,
        last_author: get_opt_string(row, 10)?,
        authors: parse_json_list(get_opt_string(row, 11)?.as_deref())?,
    })
}

fn row_to_evidence(row: &libsql::Row) -> Result<Evidence, DatabaseError> {
    Ok(Evidence {
        fingerprint: Fingerprint::from_hex(row.get::<String>(0)?),
        text: row.get::<String>(1)?,
        citation: Fingerprint::from_hex(row.get::<String>(2)?),
    })
}

fn row_to_author(row: &libsql::Row) -> Result<Author, DatabaseError> {
    Ok(Author {
        fingerprint: Fingerprint::from_hex(row.get::<String>(0)?),
        name: row.get::<String>(1)?,
    })
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl GraphStore {
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidInput` for a blank name.
    pub async fn get_or_create_author(&mut self, name: &str) -> Result<Arc<Author>, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DatabaseError::InvalidInput("author name is empty".into()));
        }
        let fingerprint = Author::fingerprint_of(name)?;
        if let Some(author) = self.entities.lookup::<Author>(&fingerprint) {
            return Ok(author);
        }
        if let Some(author) = self.find_author(&fingerprint).await? {
            return Ok(self.entities.remember(author));
        }
        Ok(self.entities.stage(Author {
            fingerprint,
            name: name.to_string(),
        }))
    }

    /// Get or create the citation identified by `data`'s type and reference.
    ///
    /// First, last and listed authors are created alongside a new citation.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidInput` if the type or reference is
    /// missing or the date is not `YYYY-MM-DD`.
    pub async fn get_or_create_citation(
        &mut self,
        data: &CitationData,
    ) -> Result<Arc<Citation>, DatabaseError> {
        let (kind, reference) = data.identity().ok_or_else(|| {
            DatabaseError::InvalidInput("citation needs a type and a reference".into())
        })?;
        let fingerprint = Citation::fingerprint_of(kind, reference)?;
        if let Some(citation) = self.entities.lookup::<Citation>(&fingerprint) {
            return Ok(citation);
        }
        if let Some(citation) = self.find_citation(&fingerprint).await? {
            return Ok(self.entities.remember(citation));
        }

        let date = match non_empty(data.date.as_ref()) {
            Some(date) => Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                DatabaseError::InvalidInput(format!("citation date '{date}': {e}"))
            })?),
            None => None,
        };

        let first_author = match non_empty(data.first.as_ref()) {
            Some(name) => Some(self.get_or_create_author(name).await?.name.clone()),
            None => None,
        };
        let last_author = match non_empty(data.last.as_ref()) {
            Some(name) => Some(self.get_or_create_author(name).await?.name.clone()),
            None => None,
        };
        let mut authors = Vec::new();
        if let Some(list) = &data.authors {
            for name in list.names() {
                authors.push(self.get_or_create_author(&name).await?.name.clone());
            }
        }

        Ok(self.entities.stage(Citation {
            fingerprint,
            kind: kind.to_string(),
            reference: reference.to_string(),
            name: non_empty(data.name.as_ref()).map(String::from),
            title: non_empty(data.title.as_ref()).map(String::from),
            volume: non_empty(data.volume.as_ref()).map(String::from),
            issue: non_empty(data.issue.as_ref()).map(String::from),
            pages: non_empty(data.pages.as_ref()).map(String::from),
            date,
            first_author,
            last_author,
            authors,
        }))
    }

    /// Get or create evidence `text` supporting `citation`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the store lookup fails.
    pub async fn get_or_create_evidence(
        &mut self,
        citation: &Citation,
        text: &str,
    ) -> Result<Arc<Evidence>, DatabaseError> {
        let fingerprint = Evidence::fingerprint_of(text, &citation.kind, &citation.reference)?;
        if let Some(evidence) = self.entities.lookup::<Evidence>(&fingerprint) {
            return Ok(evidence);
        }
        if let Some(evidence) = self.find_evidence(&fingerprint).await? {
            return Ok(self.entities.remember(evidence));
        }
        Ok(self.entities.stage(Evidence {
            fingerprint,
            text: text.to_string(),
            citation: citation.fingerprint.clone(),
        }))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no citation has this type and reference.
    pub async fn get_citation(
        &self,
        kind: &str,
        reference: &str,
    ) -> Result<Citation, DatabaseError> {
        let fingerprint = Citation::fingerprint_of(kind, reference)?;
        self.find_citation(&fingerprint)
            .await?
            .ok_or_else(|| DatabaseError::not_found("citation", format!("{kind} {reference}")))
    }

    /// Evidences stored for a citation, ordered by text.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the query fails.
    pub async fn list_evidences(
        &self,
        citation: &Fingerprint,
    ) -> Result<Vec<Evidence>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT fingerprint, text, citation FROM evidences WHERE citation = ?1 ORDER BY text",
                [citation.as_str()],
            )
            .await?;
        let mut evidences = Vec::new();
        while let Some(row) = rows.next().await? {
            evidences.push(row_to_evidence(&row)?);
        }
        Ok(evidences)
    }

    // ── Store lookups ──────────────────────────────────────────────

    async fn find_author(&self, fingerprint: &Fingerprint) -> Result<Option<Author>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT fingerprint, name FROM authors WHERE fingerprint = ?1",
                [fingerprint.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_author(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_citation(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Citation>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(CITATION_SELECT, [fingerprint.as_str()])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_citation(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_evidence(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Evidence>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT fingerprint, text, citation FROM evidences WHERE fingerprint = ?1",
                [fingerprint.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_evidence(&row)?)),
            None => Ok(None),
        }
    }

    // ── Flush writers ──────────────────────────────────────────────

    pub(crate) async fn write_author(&self, author: &Author) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO authors (fingerprint, name) VALUES (?1, ?2)",
                libsql::params![author.fingerprint.as_str(), author.name.as_str()],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn write_citation(&self, citation: &Citation) -> Result<(), DatabaseError> {
        let first_author = citation
            .first_author
            .as_deref()
            .map(Author::fingerprint_of)
            .transpose()?;
        let last_author = citation
            .last_author
            .as_deref()
            .map(Author::fingerprint_of)
            .transpose()?;
        let conn = self.db().conn();
        conn.execute(
            "INSERT INTO citations (fingerprint, kind, reference, name, title, volume, issue, pages,
                 date, first_author, last_author)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            libsql::params![
                citation.fingerprint.as_str(),
                citation.kind.as_str(),
                citation.reference.as_str(),
                citation.name.as_deref(),
                citation.title.as_deref(),
                citation.volume.as_deref(),
                citation.issue.as_deref(),
                citation.pages.as_deref(),
                citation.date.map(|d| d.format("%Y-%m-%d").to_string()),
                first_author.as_ref().map(Fingerprint::as_str),
                last_author.as_ref().map(Fingerprint::as_str)
            ],
        )
        .await?;

        for (position, name) in citation.authors.iter().enumerate() {
            let author = Author::fingerprint_of(name)?;
            conn.execute(
                "INSERT INTO citation_authors (citation, author, position) VALUES (?1, ?2, ?3)",
                libsql::params![
                    citation.fingerprint.as_str(),
                    author.as_str(),
                    i64::try_from(position).unwrap_or(i64::MAX)
                ],
            )
            .await?;
        }
        Ok(())
    }

    pub(crate) async fn write_evidence(&self, evidence: &Evidence) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO evidences (fingerprint, text, citation) VALUES (?1, ?2, ?3)",
                libsql::params![
                    evidence.fingerprint.as_str(),
                    evidence.text.as_str(),
                    evidence.citation.as_str()
                ],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strand_core::enums::EntityKind;
    use strand_core::graph::AuthorList;

    use super::*;
    use crate::test_support::helpers::store_with;

    fn pubmed(reference: &str) -> CitationData {
        CitationData {
            title: Some("Akt signalling".into()),
            date: Some("2009-04-01".into()),
            first: Some("Smith J".into()),
            last: Some("Doe A".into()),
            authors: Some(AuthorList::Delimited("Smith J|Lee K|Doe A|Smith J".into())),
            ..CitationData::new("PubMed", reference)
        }
    }

    #[tokio::test]
    async fn citation_authors_are_shared_and_ordered() {
        let (mut store, _) = store_with(vec![]).await;
        let first = store.get_or_create_citation(&pubmed("1")).await.unwrap();
        let second = store.get_or_create_citation(&pubmed("2")).await.unwrap();
        assert_eq!(first.authors, vec!["Smith J", "Lee K", "Doe A"]);
        assert_ne!(first.fingerprint, second.fingerprint);
        assert_eq!(store.cached_entities(EntityKind::Author), 3);
        store.commit().await.unwrap();

        let loaded = store.get_citation("PubMed", "1").await.unwrap();
        assert_eq!(loaded.authors, vec!["Smith J", "Lee K", "Doe A"]);
        assert_eq!(loaded.first_author.as_deref(), Some("Smith J"));
        assert_eq!(loaded.last_author.as_deref(), Some("Doe A"));
        assert_eq!(loaded.date, NaiveDate::from_ymd_opt(2009, 4, 1));
        assert_eq!(loaded.title.as_deref(), Some("Akt signalling"));
    }

    #[tokio::test]
    async fn repeated_citation_is_a_cache_hit() {
        let (mut store, _) = store_with(vec![]).await;
        let a = store.get_or_create_citation(&pubmed("1")).await.unwrap();
        let before = store.cache_stats();
        let b = store
            .get_or_create_citation(&CitationData::new(" PubMed ", "1"))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.cache_stats().hits, before.hits + 1);
    }

    #[tokio::test]
    async fn citation_without_reference_is_invalid() {
        let (mut store, _) = store_with(vec![]).await;
        let data = CitationData {
            kind: Some("PubMed".into()),
            ..CitationData::default()
        };
        assert!(matches!(
            store.get_or_create_citation(&data).await,
            Err(DatabaseError::InvalidInput(_))
        ));

        let bad_date = CitationData {
            date: Some("April 2009".into()),
            ..CitationData::new("PubMed", "9")
        };
        assert!(matches!(
            store.get_or_create_citation(&bad_date).await,
            Err(DatabaseError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn evidence_is_keyed_by_text_and_citation() {
        let (mut store, _) = store_with(vec![]).await;
        let citation = store.get_or_create_citation(&pubmed("1")).await.unwrap();
        let a = store
            .get_or_create_evidence(&citation, "AKT1 phosphorylates GSK3B")
            .await
            .unwrap();
        let b = store
            .get_or_create_evidence(&citation, "AKT1 phosphorylates GSK3B")
            .await
            .unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        store.commit().await.unwrap();

        let stored = store.list_evidences(&citation.fingerprint).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].citation, citation.fingerprint);
    }
}
