//! Schema file discovery
//!
//! Walks a project tree and picks out files that are likely to carry schema
//! definitions. No parsing happens here.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directories that are never descended into
pub const PRUNED_DIRS: &[&str] = &["node_modules", "vendor", ".git", "target", "build", "dist"];

/// Directory names whose files are all treated as migrations
const MIGRATION_DIRS: &[&str] = &["migrations", "migrate"];

/// Find schema-bearing files under `root`, in lexical walk order.
///
/// Unreadable entries are skipped silently.
pub fn discover_schema_files(root: &Path) -> Vec<PathBuf> {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

    WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_pruned(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir() && is_schema_file(entry.path()))
        .map(DirEntry::into_path)
        .collect()
}

/// True if the file name or its parent directory marks it as schema-bearing
pub fn is_schema_file(path: &Path) -> bool {
    let name = lowercase_name(path.file_name());
    let parent = lowercase_name(path.parent().and_then(Path::file_name));

    name.ends_with(".sql")
        || name.ends_with(".prisma")
        || name == "schema.rb"
        || name == "models.py"
        || MIGRATION_DIRS.contains(&parent.as_str())
}

fn is_pruned(entry: &DirEntry) -> bool {
    // The root is always walked, whatever it is called
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| PRUNED_DIRS.contains(&name))
}

fn lowercase_name(name: Option<&OsStr>) -> String {
    name.map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default()
}
