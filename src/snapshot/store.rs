//! Schema Snapshot Store
//!
//! Persists versioned schema snapshots per project under a catalog root:
//!
//! ```text
//! <root>/<project>/schema-2024-05-01-093000.json   immutable, one per scan
//! <root>/<project>/schema-latest.json              alias, overwritten on save
//! ```

use crate::error::{io_error, not_found_error, snapshot_serialization_error, AppError, AppResult};
use crate::introspection::SchemaSnapshot;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const LATEST_FILE: &str = "schema-latest.json";
const RECORD_PREFIX: &str = "schema-";
const RECORD_SUFFIX: &str = ".json";

/// File-backed store for schema snapshots
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    /// File name of the immutable record for a snapshot taken at `time`
    pub fn record_name(time: &DateTime<Utc>) -> String {
        format!("{}{}{}", RECORD_PREFIX, time.format("%Y-%m-%d-%H%M%S"), RECORD_SUFFIX)
    }

    /// Store a snapshot: write its immutable record, then overwrite the latest alias.
    ///
    /// The alias is only touched once the record is on disk.
    pub fn save(&self, snapshot: &SchemaSnapshot) -> AppResult<PathBuf> {
        validate_project_name(&snapshot.project)?;

        let project_dir = self.project_dir(&snapshot.project);
        fs::create_dir_all(&project_dir).map_err(|e| io_error(&project_dir, e))?;

        let data = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| snapshot_serialization_error(&snapshot.project, "encode", e))?;

        let record = project_dir.join(Self::record_name(&snapshot.snapshot_time));
        if record.exists() {
            warn!("Overwriting snapshot record {} taken in the same second", record.display());
        }
        fs::write(&record, &data).map_err(|e| io_error(&record, e))?;

        let latest = project_dir.join(LATEST_FILE);
        let staging = project_dir.join(format!(".{}.tmp", LATEST_FILE));
        fs::write(&staging, &data).map_err(|e| io_error(&staging, e))?;
        fs::rename(&staging, &latest).map_err(|e| io_error(&latest, e))?;

        info!(
            "Saved snapshot {} for project {}: {} tables",
            record.display(),
            snapshot.project,
            snapshot.tables.len()
        );

        Ok(record)
    }

    /// Get the latest snapshot for a project
    pub fn load_latest(&self, project: &str) -> AppResult<SchemaSnapshot> {
        let path = self.project_dir(project).join(LATEST_FILE);
        match Self::read_snapshot(&path, project) {
            Err(e) if e.is_not_found() => Err(not_found_error(format!(
                "no snapshot stored for project '{}'",
                project
            ))),
            other => other,
        }
    }

    /// Every immutable record of a project, oldest first.
    ///
    /// Records that cannot be read or decoded are skipped.
    pub fn load_history(&self, project: &str) -> AppResult<Vec<SchemaSnapshot>> {
        let records = self.record_paths(project)?;

        let mut snapshots: Vec<SchemaSnapshot> = records
            .iter()
            .filter_map(|path| match Self::read_snapshot(path, project) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!("Skipping snapshot record {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        snapshots.sort_by(|a, b| a.snapshot_time.cmp(&b.snapshot_time));
        Ok(snapshots)
    }

    /// Names of every project with at least one stored record, sorted
    pub fn list_projects(&self) -> AppResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| io_error(&self.root, e))?;

        let mut projects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(&self.root, e))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let has_records = fs::read_dir(entry.path())
                .map(|files| {
                    files
                        .filter_map(Result::ok)
                        .any(|f| is_snapshot_file(&f.file_name().to_string_lossy()))
                })
                .unwrap_or(false);

            if has_records {
                projects.push(name);
            } else {
                debug!("Ignoring catalog directory without records: {}", name);
            }
        }

        projects.sort();
        Ok(projects)
    }

    /// Immutable record files of a project, sorted by name; the latest alias is excluded
    fn record_paths(&self, project: &str) -> AppResult<Vec<PathBuf>> {
        let dir = self.project_dir(project);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                is_snapshot_file(&name) && name != LATEST_FILE
            })
            .map(|entry| entry.path())
            .collect();

        paths.sort();
        Ok(paths)
    }

    fn read_snapshot(path: &Path, project: &str) -> AppResult<SchemaSnapshot> {
        let data = fs::read(path).map_err(|e| io_error(path, e))?;
        serde_json::from_slice(&data).map_err(|e| snapshot_serialization_error(project, "decode", e))
    }
}

fn is_snapshot_file(name: &str) -> bool {
    name.starts_with(RECORD_PREFIX) && name.ends_with(RECORD_SUFFIX)
}

fn validate_project_name(project: &str) -> AppResult<()> {
    if project.is_empty() || project == "." || project == ".." || project.contains(['/', '\\']) {
        return Err(AppError::InvalidPath(format!("invalid project name '{}'", project)));
    }
    Ok(())
}
