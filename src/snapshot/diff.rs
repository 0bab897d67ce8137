//! Schema Diff Engine
//!
//! Compares two snapshots of the same project and classifies every structural
//! change as added, modified or removed, at table and column granularity.

use crate::introspection::{Column, SchemaSnapshot, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Type of schema change detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

/// Categories of schema objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Table,
    Column,
}

/// A single item in the schema diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiffItem {
    pub object_type: ObjectType,
    /// `table` or `table.column`
    pub object_path: String,
    /// Human-readable descriptor, e.g. `users.age (INT -> BIGINT)`
    pub description: String,
}

impl SchemaDiffItem {
    fn table(name: &str) -> Self {
        Self {
            object_type: ObjectType::Table,
            object_path: name.to_string(),
            description: format!("table: {}", name),
        }
    }

    fn column(table: &str, column: &str, detail: Option<String>) -> Self {
        let object_path = format!("{}.{}", table, column);
        let description = match detail {
            Some(detail) => format!("{} ({})", object_path, detail),
            None => object_path.clone(),
        };
        Self {
            object_type: ObjectType::Column,
            object_path,
            description,
        }
    }
}

impl fmt::Display for SchemaDiffItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Complete schema diff result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub added: Vec<SchemaDiffItem>,
    pub modified: Vec<SchemaDiffItem>,
    pub removed: Vec<SchemaDiffItem>,
}

impl SchemaDiff {
    /// No drift at all
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    pub fn items(&self, change_type: ChangeType) -> &[SchemaDiffItem] {
        match change_type {
            ChangeType::Added => &self.added,
            ChangeType::Modified => &self.modified,
            ChangeType::Removed => &self.removed,
        }
    }

    fn sort(&mut self) {
        for items in [&mut self.added, &mut self.modified, &mut self.removed] {
            items.sort_by(|a, b| a.description.cmp(&b.description));
        }
    }
}

/// Which column attributes count as drift
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Also treat primary-key, unique and default changes as modifications
    pub compare_constraints: bool,
}

/// The diff engine that compares schema snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Compare two schema snapshots and return all differences
    pub fn compare(&self, old: &SchemaSnapshot, new: &SchemaSnapshot) -> SchemaDiff {
        let mut diff = SchemaDiff::default();

        for (name, new_table) in &new.tables {
            match old.tables.get(name) {
                None => diff.added.push(SchemaDiffItem::table(name)),
                Some(old_table) => self.diff_columns(old_table, new_table, &mut diff),
            }
        }

        for name in old.tables.keys() {
            if !new.tables.contains_key(name) {
                diff.removed.push(SchemaDiffItem::table(name));
            }
        }

        diff.sort();
        diff
    }

    fn diff_columns(&self, old_table: &Table, new_table: &Table, diff: &mut SchemaDiff) {
        let table = new_table.name.as_str();

        let old_cols: HashMap<&str, &Column> = old_table
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c))
            .collect();

        let new_cols: HashMap<&str, &Column> = new_table
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c))
            .collect();

        for new_col in &new_table.columns {
            match old_cols.get(new_col.name.as_str()) {
                None => diff.added.push(SchemaDiffItem::column(
                    table,
                    &new_col.name,
                    Some(new_col.data_type.clone()),
                )),
                Some(old_col) if self.is_modified(old_col, new_col) => {
                    diff.modified.push(SchemaDiffItem::column(
                        table,
                        &new_col.name,
                        Some(format!("{} -> {}", old_col.data_type, new_col.data_type)),
                    ))
                }
                Some(_) => {}
            }
        }

        for old_col in &old_table.columns {
            if !new_cols.contains_key(old_col.name.as_str()) {
                diff.removed.push(SchemaDiffItem::column(table, &old_col.name, None));
            }
        }
    }

    fn is_modified(&self, old: &Column, new: &Column) -> bool {
        if old.data_type != new.data_type || old.nullable != new.nullable {
            return true;
        }

        self.options.compare_constraints
            && (old.primary_key != new.primary_key
                || old.unique != new.unique
                || old.default != new.default)
    }
}
