//! Network envelope repository.
//!
//! Dropping a network removes its envelope and link rows only; the
//! deduplicated terms and edges it pointed at stay shared.

use std::collections::BTreeSet;

use tracing::info;

use strand_core::entities::Network;
use strand_core::graph::Graph;

use crate::error::DatabaseError;
use crate::helpers::{fetch_count, fetch_unique, get_opt_string, parse_datetime};
use crate::service::GraphStore;

const NETWORK_COLUMNS: &str =
    "id, name, version, description, authors, contact, licenses, copyright, disclaimer, blob, created";

fn row_to_network(row: &libsql::Row) -> Result<Network, DatabaseError> {
    Ok(Network {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        version: row.get::<String>(2)?,
        description: get_opt_string(row, 3)?,
        authors: get_opt_string(row, 4)?,
        contact: get_opt_string(row, 5)?,
        licenses: get_opt_string(row, 6)?,
        copyright: get_opt_string(row, 7)?,
        disclaimer: get_opt_string(row, 8)?,
        blob: row.get::<String>(9)?,
        created: parse_datetime(&row.get::<String>(10)?)?,
    })
}

async fn collect_networks(mut rows: libsql::Rows) -> Result<Vec<Network>, DatabaseError> {
    let mut networks = Vec::new();
    while let Some(row) = rows.next().await? {
        networks.push(row_to_network(&row)?);
    }
    Ok(networks)
}

impl GraphStore {
    pub async fn count_networks(&self) -> Result<u64, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM networks", ())
            .await?;
        fetch_count(rows).await
    }

    pub async fn list_networks(&self) -> Result<Vec<Network>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {NETWORK_COLUMNS} FROM networks ORDER BY name, created"),
                (),
            )
            .await?;
        collect_networks(rows).await
    }

    /// The most recently created network of every name.
    pub async fn list_recent_networks(&self) -> Result<Vec<Network>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {NETWORK_COLUMNS} FROM networks n
                     WHERE n.rowid = (
                         SELECT m.rowid FROM networks m WHERE m.name = n.name
                         ORDER BY m.created DESC, m.rowid DESC LIMIT 1)
                     ORDER BY n.name"
                ),
                (),
            )
            .await?;
        collect_networks(rows).await
    }

    pub async fn has_name_version(&self, name: &str, version: &str) -> Result<bool, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM networks WHERE name = ?1 AND version = ?2",
                libsql::params![name, version],
            )
            .await?;
        Ok(fetch_count(rows).await? > 0)
    }

    pub async fn get_network_versions(&self, name: &str) -> Result<BTreeSet<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT version FROM networks WHERE name = ?1", [name])
            .await?;
        let mut versions = BTreeSet::new();
        while let Some(row) = rows.next().await? {
            versions.insert(row.get::<String>(0)?);
        }
        Ok(versions)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no network has this ID.
    pub async fn get_network_by_id(&self, id: &str) -> Result<Network, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {NETWORK_COLUMNS} FROM networks WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = fetch_unique(rows, "network", id).await?;
        row_to_network(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no network has this name and version.
    pub async fn get_network_by_name_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Network, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {NETWORK_COLUMNS} FROM networks WHERE name = ?1 AND version = ?2"),
                libsql::params![name, version],
            )
            .await?;
        let row = fetch_unique(rows, "network", &format!("{name} v{version}")).await?;
        row_to_network(&row)
    }

    /// Every version of the network called exactly `name`, oldest first.
    pub async fn get_networks_by_name(&self, name: &str) -> Result<Vec<Network>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {NETWORK_COLUMNS} FROM networks WHERE name = ?1
                     ORDER BY created, rowid"
                ),
                [name],
            )
            .await?;
        collect_networks(rows).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no network is called `name`.
    pub async fn get_most_recent_network_by_name(
        &self,
        name: &str,
    ) -> Result<Network, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {NETWORK_COLUMNS} FROM networks WHERE name = ?1
                     ORDER BY created DESC, rowid DESC LIMIT 1"
                ),
                [name],
            )
            .await?;
        match rows.next().await? {
            Some(row) => row_to_network(&row),
            None => Err(DatabaseError::not_found("network", name)),
        }
    }

    /// Networks with any of `ids`, in no particular order. Unknown IDs are ignored.
    pub async fn get_networks_by_ids(&self, ids: &[&str]) -> Result<Vec<Network>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT {NETWORK_COLUMNS} FROM networks WHERE id IN ({})",
            placeholders.join(", ")
        );
        let params: Vec<libsql::Value> = ids.iter().map(|id| (*id).into()).collect();
        let rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        collect_networks(rows).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown ID and
    /// `DatabaseError::Core` if the stored snapshot does not decode.
    pub async fn get_graph_by_id(&self, id: &str) -> Result<Graph, DatabaseError> {
        Ok(self.get_network_by_id(id).await?.graph()?)
    }

    pub async fn get_graphs_by_ids(&self, ids: &[&str]) -> Result<Vec<Graph>, DatabaseError> {
        let mut graphs = Vec::with_capacity(ids.len());
        for network in self.get_networks_by_ids(ids).await? {
            graphs.push(network.graph()?);
        }
        Ok(graphs)
    }

    /// The union of the graphs of several networks.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidInput` for an empty ID list and
    /// `DatabaseError::NotFound` when none of the IDs is stored. Unknown IDs
    /// next to known ones are ignored.
    pub async fn get_graph_by_ids(&self, ids: &[&str]) -> Result<Graph, DatabaseError> {
        match ids {
            [] => Err(DatabaseError::InvalidInput(
                "at least one network ID is required".into(),
            )),
            [id] => self.get_graph_by_id(id).await,
            _ => {
                let graphs = self.get_graphs_by_ids(ids).await?;
                if graphs.is_empty() {
                    return Err(DatabaseError::not_found("network", ids.join(", ")));
                }
                Ok(Graph::union(&graphs))
            }
        }
    }

    /// Delete one network envelope and its term and edge links.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no network has this ID.
    pub async fn drop_network_by_id(&mut self, id: &str) -> Result<(), DatabaseError> {
        self.db().begin().await?;
        let result = self.delete_networks(Some(id)).await;
        let deleted = self.finish_write(result).await?;
        if deleted == 0 {
            return Err(DatabaseError::not_found("network", id));
        }
        info!(network = id, "dropped network");
        Ok(())
    }

    pub async fn drop_networks(&mut self) -> Result<(), DatabaseError> {
        self.db().begin().await?;
        let result = self.delete_networks(None).await;
        let deleted = self.finish_write(result).await?;
        info!(deleted, "dropped all networks");
        Ok(())
    }

    async fn delete_networks(&self, id: Option<&str>) -> Result<u64, DatabaseError> {
        let conn = self.db().conn();
        match id {
            Some(id) => {
                conn.execute("DELETE FROM network_terms WHERE network_id = ?1", [id])
                    .await?;
                conn.execute("DELETE FROM network_edges WHERE network_id = ?1", [id])
                    .await?;
                Ok(conn.execute("DELETE FROM networks WHERE id = ?1", [id]).await?)
            }
            None => {
                conn.execute("DELETE FROM network_terms", ()).await?;
                conn.execute("DELETE FROM network_edges", ()).await?;
                Ok(conn.execute("DELETE FROM networks", ()).await?)
            }
        }
    }

    /// Fingerprints of the term instances linked to a network.
    pub async fn network_terms(&self, id: &str) -> Result<Vec<String>, DatabaseError> {
        self.network_links("SELECT term FROM network_terms WHERE network_id = ?1 ORDER BY term", id)
            .await
    }

    /// Fingerprints of the statement edges linked to a network.
    pub async fn network_edges(&self, id: &str) -> Result<Vec<String>, DatabaseError> {
        self.network_links("SELECT edge FROM network_edges WHERE network_id = ?1 ORDER BY edge", id)
            .await
    }

    async fn network_links(&self, sql: &str, id: &str) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, [id]).await?;
        let mut links = Vec::new();
        while let Some(row) = rows.next().await? {
            links.push(row.get::<String>(0)?);
        }
        Ok(links)
    }
}
