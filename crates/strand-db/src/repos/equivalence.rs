//! Equivalence repository: cross-namespace identity classes.
//!
//! An equivalence resource maps every entry name of one namespace to a class
//! label. Entries of different namespaces sharing a label are the same thing.

use std::collections::HashMap;

use tracing::{debug, info};

use strand_core::entities::{EquivalenceClass, VocabularyEntry};
use strand_core::enums::VocabularyKind;
use strand_core::ids::PREFIX_EQUIVALENCE;

use super::vocabulary::row_to_entry;
use crate::cache::{VocabularyHandle, VocabularyKey};
use crate::error::DatabaseError;
use crate::helpers::fetch_unique;
use crate::service::GraphStore;

fn row_to_class(row: &libsql::Row) -> Result<EquivalenceClass, DatabaseError> {
    Ok(EquivalenceClass {
        id: row.get::<String>(0)?,
        label: row.get::<String>(1)?,
    })
}

impl GraphStore {
    /// Get or create the class with `label`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the lookup or insert fails.
    pub async fn ensure_class(&mut self, label: &str) -> Result<EquivalenceClass, DatabaseError> {
        if let Some(class) = self.find_class(label).await? {
            return Ok(class);
        }
        self.db().begin().await?;
        let result = self.create_class(label).await;
        self.finish_write(result).await
    }

    /// Assign every entry of the namespace at `namespace_url` to the class
    /// named for it by the resource at `url`.
    ///
    /// The namespace is ensured first. All labels are checked before anything
    /// is written, and the assignment commits once.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` for a non-cachable namespace and
    /// `DatabaseError::NotFound` when an entry has no label in the mapping.
    pub async fn load_equivalences(
        &mut self,
        url: &str,
        namespace_url: &str,
    ) -> Result<(), DatabaseError> {
        let VocabularyHandle::Persisted(vocabulary) = self.ensure_namespace(namespace_url).await?
        else {
            return Err(DatabaseError::InvalidState(format!(
                "namespace {namespace_url} is not stored, cannot attach equivalences"
            )));
        };

        let started = std::time::Instant::now();
        let mapping = self.fetcher.fetch(url).await?;
        let entries = self.vocabulary_entries(&vocabulary.id).await?;

        let mut assignments = Vec::with_capacity(entries.len());
        for entry in &entries {
            let label = mapping
                .values
                .get(&entry.name)
                .filter(|label| !label.is_empty())
                .ok_or_else(|| {
                    DatabaseError::not_found("equivalence label", format!("{url} {}", entry.name))
                })?;
            assignments.push((entry.id, label.clone()));
        }

        self.db().begin().await?;
        let result = self.assign_classes(&vocabulary.id, &assignments).await;
        self.finish_write(result).await?;

        let key = VocabularyKey::new(VocabularyKind::Namespace, namespace_url);
        self.resources.remove(&key);
        if let Some(model) = self.find_vocabulary(VocabularyKind::Namespace, namespace_url).await? {
            self.load_vocabulary(key, model).await?;
        }
        info!(
            url,
            namespace_url,
            entries = assignments.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "loaded equivalences"
        );
        Ok(())
    }

    /// [`Self::load_equivalences`] unless the namespace already has them.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_equivalences`].
    pub async fn ensure_equivalences(
        &mut self,
        url: &str,
        namespace_url: &str,
    ) -> Result<(), DatabaseError> {
        let handle = self.ensure_namespace(namespace_url).await?;
        if handle.vocabulary().is_some_and(|v| v.has_equivalences) {
            debug!(namespace_url, "equivalences already loaded");
            return Ok(());
        }
        self.load_equivalences(url, namespace_url).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no class has `label`.
    pub async fn equivalence_by_label(
        &self,
        label: &str,
    ) -> Result<EquivalenceClass, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query("SELECT id, label FROM equivalence_classes WHERE label = ?1", [label])
            .await?;
        let row = fetch_unique(rows, "equivalence class", label).await?;
        row_to_class(&row)
    }

    /// Class of the namespace entry `name` at `url`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the entry does not exist or
    /// belongs to no class.
    pub async fn equivalence_by_entry(
        &self,
        url: &str,
        name: &str,
    ) -> Result<EquivalenceClass, DatabaseError> {
        let entry = self
            .get_entry(VocabularyKind::Namespace, url, name)
            .await?;
        let class_id = entry
            .equivalence_id
            .as_deref()
            .ok_or_else(|| DatabaseError::not_found("equivalence class", format!("{url} {name}")))?;
        let rows = self
            .db()
            .conn()
            .query("SELECT id, label FROM equivalence_classes WHERE id = ?1", [class_id])
            .await?;
        let row = fetch_unique(rows, "equivalence class", class_id).await?;
        row_to_class(&row)
    }

    /// Every entry, across namespaces, in the class with `label`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no class has `label`.
    pub async fn equivalence_members(
        &self,
        label: &str,
    ) -> Result<Vec<VocabularyEntry>, DatabaseError> {
        let class = self.equivalence_by_label(label).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, vocabulary_id, name, value, equivalence_id
                 FROM vocabulary_entries WHERE equivalence_id = ?1
                 ORDER BY vocabulary_id, name",
                [class.id.as_str()],
            )
            .await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            members.push(row_to_entry(&row)?);
        }
        Ok(members)
    }

    /// Remove every class and unlink all entries.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if an update fails.
    pub async fn drop_equivalences(&mut self) -> Result<(), DatabaseError> {
        self.db().begin().await?;
        let result = self.delete_classes().await;
        self.finish_write(result).await?;
        self.resources.clear();
        info!("dropped equivalence classes");
        Ok(())
    }

    async fn find_class(&self, label: &str) -> Result<Option<EquivalenceClass>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id, label FROM equivalence_classes WHERE label = ?1", [label])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_class(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_class(&self, label: &str) -> Result<EquivalenceClass, DatabaseError> {
        let id = self.db().generate_id(PREFIX_EQUIVALENCE).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO equivalence_classes (id, label) VALUES (?1, ?2)",
                libsql::params![id.as_str(), label],
            )
            .await?;
        Ok(EquivalenceClass {
            id,
            label: label.to_string(),
        })
    }

    async fn assign_classes(
        &self,
        vocabulary_id: &str,
        assignments: &[(i64, String)],
    ) -> Result<(), DatabaseError> {
        let mut classes: HashMap<&str, String> = HashMap::new();
        for (entry_id, label) in assignments {
            let class_id = match classes.get(label.as_str()) {
                Some(id) => id.clone(),
                None => {
                    let class = match self.find_class(label).await? {
                        Some(class) => class,
                        None => self.create_class(label).await?,
                    };
                    classes.insert(label.as_str(), class.id.clone());
                    class.id
                }
            };
            self.db()
                .conn()
                .execute(
                    "UPDATE vocabulary_entries SET equivalence_id = ?1 WHERE id = ?2",
                    libsql::params![class_id.as_str(), *entry_id],
                )
                .await?;
        }
        self.db()
            .conn()
            .execute(
                "UPDATE vocabularies SET has_equivalences = 1 WHERE id = ?1",
                [vocabulary_id],
            )
            .await?;
        Ok(())
    }

    async fn delete_classes(&self) -> Result<(), DatabaseError> {
        let conn = self.db().conn();
        conn.execute("UPDATE vocabulary_entries SET equivalence_id = NULL", ())
            .await?;
        conn.execute("UPDATE vocabularies SET has_equivalences = 0", ())
            .await?;
        conn.execute("DELETE FROM equivalence_classes", ()).await?;
        Ok(())
    }
}
