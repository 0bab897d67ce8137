//! Schema Introspection Module
//!
//! Turns schema-bearing source files into a point-in-time [`SchemaSnapshot`].
//! Each file is routed through a dispatch table keyed by [`SourceKind`];
//! only the SQL dialect has an extractor today.

mod sql;

use crate::error::{io_error, AppError, AppResult};
use crate::revision::RevisionProvider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use sql::extract_sql_tables;

/// Complete schema snapshot of a project at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub project: String,
    pub snapshot_time: DateTime<Utc>,
    pub source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    pub checksum: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: BTreeMap<String, Table>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_files: Vec<PathBuf>,
}

impl SchemaSnapshot {
    pub fn new(project: impl Into<String>, source: impl Into<PathBuf>, snapshot_time: DateTime<Utc>) -> Self {
        Self {
            project: project.into(),
            snapshot_time,
            source: source.into(),
            git_commit: None,
            checksum: String::new(),
            tables: BTreeMap::new(),
            source_files: Vec::new(),
        }
    }

    /// Merge tables into the snapshot; a later table with the same name replaces the earlier one
    pub fn insert_tables(&mut self, tables: impl IntoIterator<Item = Table>) {
        for table in tables {
            if self.tables.contains_key(&table.name) {
                debug!("Table {} redefined, keeping the later definition", table.name);
            }
            self.tables.insert(table.name.clone(), table);
        }
    }

    /// Recompute and store the checksum for the current table set
    pub fn refresh_checksum(&mut self) {
        self.checksum = Self::compute_checksum(&self.tables);
    }

    /// Compute checksum from schema content.
    ///
    /// Tables are visited in name order and columns are sorted by name, so the
    /// result depends only on content, never on declaration or extraction order.
    pub fn compute_checksum(tables: &BTreeMap<String, Table>) -> String {
        let mut hasher = Sha256::new();

        for (name, table) in tables {
            hasher.update(format!("T|{}\n", name).as_bytes());

            let mut columns: Vec<&Column> = table.columns.iter().collect();
            columns.sort_by(|a, b| a.name.cmp(&b.name));
            for col in columns {
                hasher.update(
                    format!(
                        "C|{}|{}|{}|{}|{}|{}\n",
                        col.name,
                        col.data_type,
                        col.nullable,
                        col.primary_key,
                        col.unique,
                        col.default.as_deref().unwrap_or("")
                    )
                    .as_bytes(),
                );
            }

            let mut indexes: Vec<&Index> = table.indexes.iter().collect();
            indexes.sort_by(|a, b| a.name.cmp(&b.name));
            for idx in indexes {
                hasher.update(format!("I|{}|{}|{}\n", idx.name, idx.columns.join(","), idx.unique).as_bytes());
            }

            let mut fks: Vec<&ForeignKey> = table.foreign_keys.iter().collect();
            fks.sort_by(|a, b| a.column.cmp(&b.column));
            for fk in fks {
                hasher.update(
                    format!("F|{}|{}|{}\n", fk.column, fk.referenced_table, fk.referenced_column).as_bytes(),
                );
            }
        }

        format!("{:x}", hasher.finalize())
    }
}

/// Table representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<Column>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indexes: Vec<Index>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Append a column, replacing an earlier column of the same name in place
    pub fn push_column(&mut self, column: Column) {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }
}

/// Column representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Column {
    /// A nullable column with no constraints
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            primary_key: false,
            unique: false,
            default: None,
        }
    }

    /// Short marker list used by the reports (" PK UNIQUE NOT NULL")
    pub fn markers(&self) -> String {
        let mut markers = String::new();
        if self.primary_key {
            markers.push_str(" PK");
        }
        if self.unique {
            markers.push_str(" UNIQUE");
        }
        if !self.nullable {
            markers.push_str(" NOT NULL");
        }
        markers
    }
}

/// Index representation (no extractor populates these yet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<String>,
    pub unique: bool,
}

/// Foreign key relationship (no extractor populates these yet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Older catalogs wrote empty lists as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Schema description language of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Sql,
    Prisma,
    ActiveRecord,
    Django,
    Other,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".sql") {
            SourceKind::Sql
        } else if name.ends_with(".prisma") {
            SourceKind::Prisma
        } else if name == "schema.rb" {
            SourceKind::ActiveRecord
        } else if name == "models.py" {
            SourceKind::Django
        } else {
            SourceKind::Other
        }
    }
}

/// Extractor function signature: raw text in, tables out, never fails
pub type ExtractFn = fn(&str) -> Vec<Table>;

/// Dispatch table from source kind to extractor
pub struct ExtractorRegistry {
    extractors: HashMap<SourceKind, ExtractFn>,
}

impl ExtractorRegistry {
    /// A registry with no extractors at all
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: SourceKind, extractor: ExtractFn) {
        self.extractors.insert(kind, extractor);
    }

    pub fn supports(&self, kind: SourceKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Extract tables from text; unsupported kinds yield nothing
    pub fn extract(&self, content: &str, kind: SourceKind) -> Vec<Table> {
        match self.extractors.get(&kind) {
            Some(extract) => extract(content),
            None => Vec::new(),
        }
    }

    /// Read a file and extract its tables.
    ///
    /// Files whose kind has no extractor are not read at all.
    pub fn extract_file(&self, path: &Path) -> AppResult<Vec<Table>> {
        let kind = SourceKind::from_path(path);
        if !self.supports(kind) {
            debug!("No extractor for {:?} ({})", kind, path.display());
            return Ok(Vec::new());
        }

        let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
        let content = String::from_utf8_lossy(&bytes);
        let tables = self.extract(&content, kind);

        debug!("Extracted {} tables from {}", tables.len(), path.display());
        Ok(tables)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(SourceKind::Sql, extract_sql_tables);
        registry
    }
}

/// Derive the project name from a scanned directory: its final path component
pub fn project_name(root: &Path) -> AppResult<String> {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::InvalidPath(format!("cannot derive a project name from {}", root.display())))
}

/// Resolve a user-supplied path to an absolute, existing directory path
pub fn resolve_root(path: &Path) -> AppResult<PathBuf> {
    std::fs::canonicalize(path)
        .map_err(|_| AppError::InvalidPath(format!("path does not exist: {}", path.display())))
}

/// Builds snapshots from discovered schema files
pub struct SchemaIntrospector<'a> {
    extractors: &'a ExtractorRegistry,
    revision: &'a dyn RevisionProvider,
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(extractors: &'a ExtractorRegistry, revision: &'a dyn RevisionProvider) -> Self {
        Self { extractors, revision }
    }

    /// Introspect the given files into a snapshot of the project rooted at `root`.
    ///
    /// Files that cannot be read are skipped with a warning.
    pub fn introspect(&self, root: &Path, files: Vec<PathBuf>) -> AppResult<SchemaSnapshot> {
        let project = project_name(root)?;
        let mut snapshot = SchemaSnapshot::new(project, root, Utc::now());

        for file in &files {
            match self.extractors.extract_file(file) {
                Ok(tables) => snapshot.insert_tables(tables),
                Err(e) => warn!("Failed to parse {}: {}", file.display(), e),
            }
        }

        snapshot.source_files = files;
        snapshot.refresh_checksum();
        snapshot.git_commit = self.revision.current_revision(root);

        debug!(
            "Introspected {} with {} tables from {} files",
            snapshot.project,
            snapshot.tables.len(),
            snapshot.source_files.len()
        );

        Ok(snapshot)
    }
}
