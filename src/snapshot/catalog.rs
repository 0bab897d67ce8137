//! Catalog queries
//!
//! Read-only, cross-project views over everything the [`SnapshotStore`] holds.

use crate::error::AppResult;
use crate::introspection::{SchemaSnapshot, Table};
use crate::snapshot::SnapshotStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// Metadata about a snapshot (lightweight, used for listing)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotMetadata {
    pub project: String,
    pub snapshot_time: DateTime<Utc>,
    pub source: PathBuf,
    pub checksum: String,
    pub table_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
}

impl From<&SchemaSnapshot> for SnapshotMetadata {
    fn from(snapshot: &SchemaSnapshot) -> Self {
        Self {
            project: snapshot.project.clone(),
            snapshot_time: snapshot.snapshot_time,
            source: snapshot.source.clone(),
            checksum: snapshot.checksum.clone(),
            table_count: snapshot.tables.len(),
            git_commit: snapshot.git_commit.clone(),
        }
    }
}

/// A table found in a project's latest snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMatch {
    pub project: String,
    pub table: Table,
    pub snapshot: SnapshotMetadata,
}

/// One historical version of a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableVersion {
    pub snapshot: SnapshotMetadata,
    pub table: Table,
}

/// Summary line for `list`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub source: PathBuf,
    pub table_count: usize,
    pub last_cataloged: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
}

pub struct CatalogQuery<'a> {
    store: &'a SnapshotStore,
}

impl<'a> CatalogQuery<'a> {
    pub fn new(store: &'a SnapshotStore) -> Self {
        Self { store }
    }

    /// Find a table in every project's latest snapshot
    pub fn find_table(&self, name: &str) -> AppResult<Vec<TableMatch>> {
        let matches = self
            .latest_snapshots()?
            .into_iter()
            .filter_map(|snapshot| {
                let table = snapshot.tables.get(name)?.clone();
                Some(TableMatch {
                    project: snapshot.project.clone(),
                    snapshot: SnapshotMetadata::from(&snapshot),
                    table,
                })
            })
            .collect();

        Ok(matches)
    }

    /// Every stored version of a table across all projects, oldest first
    pub fn table_history(&self, name: &str) -> AppResult<Vec<TableVersion>> {
        let mut versions = Vec::new();

        for project in self.store.list_projects()? {
            let snapshots = match self.store.load_history(&project) {
                Ok(snapshots) => snapshots,
                Err(e) => {
                    warn!("Skipping history of project {}: {}", project, e);
                    continue;
                }
            };

            versions.extend(snapshots.iter().filter_map(|snapshot| {
                snapshot.tables.get(name).map(|table| TableVersion {
                    snapshot: SnapshotMetadata::from(snapshot),
                    table: table.clone(),
                })
            }));
        }

        versions.sort_by(|a, b| a.snapshot.snapshot_time.cmp(&b.snapshot.snapshot_time));
        Ok(versions)
    }

    /// Summary of every cataloged project; an absent catalog is simply empty
    pub fn list_catalog(&self) -> AppResult<Vec<ProjectSummary>> {
        let snapshots = match self.latest_snapshots() {
            Ok(snapshots) => snapshots,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(snapshots
            .into_iter()
            .map(|snapshot| ProjectSummary {
                name: snapshot.project.clone(),
                table_count: snapshot.tables.len(),
                last_cataloged: snapshot.snapshot_time,
                source: snapshot.source,
                git_commit: snapshot.git_commit,
            })
            .collect())
    }

    fn latest_snapshots(&self) -> AppResult<Vec<SchemaSnapshot>> {
        let snapshots = self
            .store
            .list_projects()?
            .into_iter()
            .filter_map(|project| match self.store.load_latest(&project) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!("Skipping project {}: {}", project, e);
                    None
                }
            })
            .collect();

        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::Column;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    /// `tables` pairs a table name with a comma-separated column list
    fn snapshot(project: &str, minutes: i64, tables: &[(&str, &str)]) -> SchemaSnapshot {
        let mut snapshot = SchemaSnapshot::new(
            project,
            format!("/work/{}", project),
            base_time() + Duration::minutes(minutes),
        );
        for (name, columns) in tables {
            let mut table = Table::new(*name);
            for c in columns.split(',') {
                table.push_column(Column::new(c, "TEXT"));
            }
            snapshot.insert_tables(vec![table]);
        }
        snapshot.refresh_checksum();
        snapshot
    }

    fn seeded_store(dir: &std::path::Path) -> SnapshotStore {
        let store = SnapshotStore::new(dir);
        store.save(&snapshot("shop", 0, &[("users", "id")])).unwrap();
        store.save(&snapshot("blog", 5, &[("users", "id,handle"), ("posts", "id")])).unwrap();
        store.save(&snapshot("shop", 10, &[("users", "id,email"), ("orders", "id")])).unwrap();
        store
    }

    #[test]
    fn test_find_table_in_latest_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        let query = CatalogQuery::new(&store);

        let hits = query.find_table("users").unwrap();
        let found: Vec<(&str, usize)> = hits
            .iter()
            .map(|m| (m.project.as_str(), m.table.columns.len()))
            .collect();
        assert_eq!(found, vec![("blog", 2), ("shop", 2)]);

        let orders = query.find_table("orders").unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].snapshot.snapshot_time, base_time() + Duration::minutes(10));
    }

    #[test]
    fn test_find_missing_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        assert!(CatalogQuery::new(&store).find_table("nonexistent").unwrap().is_empty());
    }

    #[test]
    fn test_find_without_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("missing"));

        assert!(CatalogQuery::new(&store).find_table("users").is_err());
    }

    #[test]
    fn test_table_history_across_projects() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let history = CatalogQuery::new(&store).table_history("users").unwrap();
        let versions: Vec<(&str, usize)> = history
            .iter()
            .map(|v| (v.snapshot.project.as_str(), v.table.columns.len()))
            .collect();
        assert_eq!(versions, vec![("shop", 1), ("blog", 2), ("shop", 2)]);
    }

    #[test]
    fn test_list_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let summaries = CatalogQuery::new(&store).list_catalog().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "blog");
        assert_eq!(summaries[1].name, "shop");
        assert_eq!(summaries[1].table_count, 2);
        assert_eq!(summaries[1].source, PathBuf::from("/work/shop"));
        assert_eq!(summaries[1].git_commit, None);
    }

    #[test]
    fn test_list_catalog_without_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("missing"));

        assert!(CatalogQuery::new(&store).list_catalog().unwrap().is_empty());
    }
}
