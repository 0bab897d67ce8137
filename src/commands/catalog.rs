//! Catalog command handlers
//!
//! `scan`, `diff`, `history`, `find` and `list`, rendered as terminal reports
//! or as JSON.

use crate::discovery::discover_schema_files;
use crate::error::{AppError, AppResult};
use crate::introspection::{project_name, resolve_root, SchemaSnapshot};
use crate::output::{Output, GREEN, RED, YELLOW};
use crate::snapshot::{ChangeType, DiffEngine, SchemaDiff};
use crate::state::AppState;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Columns shown per table in the scan summary
const SCAN_COLUMN_LIMIT: usize = 5;

/// Drift detection result
#[derive(Debug, Serialize)]
pub struct DriftReport<'a> {
    pub project: &'a str,
    pub previous_snapshot: DateTime<Utc>,
    pub previous_checksum: &'a str,
    pub current_checksum: &'a str,
    pub has_drift: bool,
    pub changes: &'a SchemaDiff,
}

/// Scan a project, print what was found and store the snapshot
pub fn scan<W: Write>(state: &AppState, out: &mut Output<W>, path: &Path) -> AppResult<()> {
    let root = resolve_root(path)?;

    out.success("📚 Schema Catalog - Scan")?;
    out.blank()?;
    out.line(format!("Scanning: {}", root.display()))?;
    out.blank()?;

    let files = discover_schema_files(&root);
    if files.is_empty() {
        out.line("No schema files found.")?;
        out.blank()?;
        out.line("Looking for: *.sql, migrations/, *.prisma, models.py, schema.rb")?;
        return Ok(());
    }

    out.line(format!("Found {} schema files:", files.len()))?;
    for file in &files {
        let relative = file.strip_prefix(&root).unwrap_or(file);
        out.line(format!("  - {}", relative.display()))?;
    }
    out.blank()?;

    let snapshot = state.introspector().introspect(&root, files)?;
    display_snapshot(out, &snapshot)?;

    state.snapshots.save(&snapshot)?;
    info!("Cataloged {} ({} tables)", snapshot.project, snapshot.tables.len());

    out.blank()?;
    out.success("✓ Schema cataloged successfully")?;
    Ok(())
}

/// Compare a fresh, unsaved snapshot of a project against its stored latest
pub fn diff<W: Write>(
    state: &AppState,
    engine: &DiffEngine,
    out: &mut Output<W>,
    path: &Path,
    json: bool,
) -> AppResult<()> {
    let root = resolve_root(path)?;
    let project = project_name(&root)?;

    let previous = match state.snapshots.load_latest(&project) {
        Ok(snapshot) => snapshot,
        Err(e) if e.is_not_found() => return Err(AppError::NoPreviousSnapshot(project)),
        Err(e) => return Err(e),
    };

    let current = state
        .introspector()
        .introspect(&root, discover_schema_files(&root))?;
    let changes = engine.compare(&previous, &current);

    if json {
        return print_json(
            out,
            &DriftReport {
                project: &project,
                previous_snapshot: previous.snapshot_time,
                previous_checksum: &previous.checksum,
                current_checksum: &current.checksum,
                has_drift: !changes.is_empty(),
                changes: &changes,
            },
        );
    }

    out.success("📚 Schema Catalog - Diff")?;
    out.blank()?;
    out.line(format!("Project: {}", project))?;
    out.line(format!("Last snapshot: {}", format_time(&previous.snapshot_time)))?;
    out.blank()?;

    if changes.is_empty() {
        out.success("✓ No drift detected - schemas match")?;
        return Ok(());
    }

    out.header(&format!("DRIFT DETECTED: {} changes", changes.total_changes()))?;
    out.blank()?;

    let sections = [
        (ChangeType::Added, "ADDED:", GREEN, '+'),
        (ChangeType::Modified, "MODIFIED:", YELLOW, '~'),
        (ChangeType::Removed, "REMOVED:", RED, '-'),
    ];
    for (change_type, title, color, sign) in sections {
        let items = changes.items(change_type);
        if items.is_empty() {
            continue;
        }
        let title = out.paint(color, title);
        out.line(title)?;
        for item in items {
            out.line(format!("  {} {}", sign, item))?;
        }
        out.blank()?;
    }

    Ok(())
}

/// Every stored version of a table, across all projects
pub fn history<W: Write>(state: &AppState, out: &mut Output<W>, table: &str, json: bool) -> AppResult<()> {
    let versions = state.catalog().table_history(table)?;
    if json {
        return print_json(out, &versions);
    }

    out.header(&format!("History: {}", table))?;
    out.blank()?;

    if versions.is_empty() {
        out.line(format!("Table '{}' not found in any cataloged project", table))?;
        return Ok(());
    }

    for version in &versions {
        out.line(format!(
            "{} ({})",
            format_time(&version.snapshot.snapshot_time),
            version.snapshot.project
        ))?;
        out.line(format!("  Columns: {}", version.table.columns.len()))?;
        for col in &version.table.columns {
            out.line(format!("    - {}: {}{}", col.name, col.data_type, col.markers()))?;
        }
        out.blank()?;
    }

    Ok(())
}

/// Where a table lives in the latest snapshot of each project
pub fn find<W: Write>(state: &AppState, out: &mut Output<W>, table: &str, json: bool) -> AppResult<()> {
    let matches = state.catalog().find_table(table)?;
    if json {
        return print_json(out, &matches);
    }

    out.header(&format!("Finding: {}", table))?;
    out.blank()?;

    if matches.is_empty() {
        out.line(format!("Table '{}' not found in any cataloged project", table))?;
        return Ok(());
    }

    for hit in &matches {
        out.item("Project", &hit.project)?;
        out.item("Source", hit.snapshot.source.display())?;
        out.item("Last Updated", format_time(&hit.snapshot.snapshot_time))?;
        out.item("Columns", hit.table.columns.len())?;
        out.blank()?;

        for col in &hit.table.columns {
            let pk = if col.primary_key { " (PK)" } else { "" };
            out.line(format!("  - {}: {}{}", col.name, col.data_type, pk))?;
        }
        out.blank()?;
    }

    Ok(())
}

/// One summary block per cataloged project
pub fn list<W: Write>(state: &AppState, out: &mut Output<W>, json: bool) -> AppResult<()> {
    let summaries = state.catalog().list_catalog()?;
    if json {
        return print_json(out, &summaries);
    }

    out.success("📚 Cataloged Projects")?;
    out.blank()?;

    if summaries.is_empty() {
        out.line("No projects cataloged yet.")?;
        out.blank()?;
        out.line("Run 'schema-catalog scan <path>' to catalog a project.")?;
        return Ok(());
    }

    for summary in &summaries {
        let name = out.paint(YELLOW, &summary.name);
        out.line(name)?;
        out.line(format!("  Source: {}", summary.source.display()))?;
        out.line(format!("  Tables: {}", summary.table_count))?;
        out.line(format!("  Last Cataloged: {}", format_time(&summary.last_cataloged)))?;
        if let Some(commit) = &summary.git_commit {
            out.line(format!("  Git Commit: {}", commit.get(..8).unwrap_or(commit)))?;
        }
        out.blank()?;
    }

    Ok(())
}

fn display_snapshot<W: Write>(out: &mut Output<W>, snapshot: &SchemaSnapshot) -> AppResult<()> {
    out.header("SCHEMA")?;
    out.blank()?;
    out.item("Project", &snapshot.project)?;
    out.item("Source", snapshot.source.display())?;
    out.item("Tables", snapshot.tables.len())?;
    out.blank()?;

    if snapshot.tables.is_empty() {
        return Ok(());
    }

    out.header("TABLES:")?;
    out.blank()?;

    for (name, table) in &snapshot.tables {
        let painted = out.paint(YELLOW, name);
        out.line(format!("  {} ({} columns)", painted, table.columns.len()))?;

        for col in table.columns.iter().take(SCAN_COLUMN_LIMIT) {
            let pk = if col.primary_key { " (PK)" } else { "" };
            let nullable = if col.nullable { ", nullable" } else { "" };
            out.line(format!("    - {}: {}{}{}", col.name, col.data_type, pk, nullable))?;
        }

        if table.columns.len() > SCAN_COLUMN_LIMIT {
            out.line(format!(
                "    ... and {} more columns",
                table.columns.len() - SCAN_COLUMN_LIMIT
            ))?;
        }
        out.blank()?;
    }

    Ok(())
}

fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut Output<W>, value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| AppError::Serialization {
        context: "report".to_string(),
        operation: "encode",
        source: e,
    })?;
    out.line(json)?;
    Ok(())
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::ExtractorRegistry;
    use crate::revision::NoRevision;
    use crate::snapshot::{DiffOptions, SnapshotStore};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        state: AppState,
        project: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("shop");
        fs::create_dir_all(project.join("db")).unwrap();

        let state = AppState {
            snapshots: SnapshotStore::new(dir.path().join("catalog")),
            extractors: ExtractorRegistry::default(),
            revision: Box::new(NoRevision),
            diff_options: DiffOptions::default(),
        };

        Fixture {
            _dir: dir,
            state,
            project,
        }
    }

    fn write_schema(fx: &Fixture, sql: &str) {
        fs::write(fx.project.join("db/schema.sql"), sql).unwrap();
    }

    fn capture(f: impl FnOnce(&mut Output<Vec<u8>>) -> AppResult<()>) -> String {
        let mut out = Output::new(Vec::new(), true);
        f(&mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_scan_stores_snapshot() {
        let fx = fixture();
        write_schema(&fx, "CREATE TABLE users (id INT PRIMARY KEY, email TEXT NOT NULL);");

        let text = capture(|out| scan(&fx.state, out, &fx.project));
        assert!(text.contains("Found 1 schema files:"));
        assert!(text.contains("  - db/schema.sql") || text.contains("  - db\\schema.sql"));
        assert!(text.contains("  users (2 columns)"));
        assert!(text.contains("    - id: INT (PK)"));
        assert!(text.contains("    - email: TEXT\n"));
        assert!(text.contains("Schema cataloged successfully"));

        let stored = fx.state.snapshots.load_latest("shop").unwrap();
        assert_eq!(stored.tables.len(), 1);
        assert_eq!(stored.source_files.len(), 1);
    }

    #[test]
    fn test_scan_without_schema_files() {
        let fx = fixture();

        let text = capture(|out| scan(&fx.state, out, &fx.project));
        assert!(text.contains("No schema files found."));
        assert!(fx.state.snapshots.load_latest("shop").is_err());
    }

    #[test]
    fn test_scan_truncates_long_tables() {
        let fx = fixture();
        write_schema(&fx, "CREATE TABLE wide (a INT, b INT, c INT, d INT, e INT, f INT, g INT);");

        let text = capture(|out| scan(&fx.state, out, &fx.project));
        assert!(text.contains("    ... and 2 more columns"));
    }

    #[test]
    fn test_diff_without_previous_snapshot() {
        let fx = fixture();
        write_schema(&fx, "CREATE TABLE users (id INT);");

        let mut out = Output::new(Vec::new(), true);
        let err = diff(&fx.state, &DiffEngine::default(), &mut out, &fx.project, false).unwrap_err();
        assert_eq!(err.to_string(), "no previous snapshot found for project 'shop'");
    }

    #[test]
    fn test_diff_reports_drift() {
        let fx = fixture();
        write_schema(&fx, "CREATE TABLE users (id INT, age INT, fax TEXT);");
        capture(|out| scan(&fx.state, out, &fx.project));

        let text = capture(|out| diff(&fx.state, &DiffEngine::default(), out, &fx.project, false));
        assert!(text.contains("No drift detected"));

        write_schema(
            &fx,
            "CREATE TABLE users (id INT, age BIGINT, email TEXT);\nCREATE TABLE orders (id INT);",
        );
        let text = capture(|out| diff(&fx.state, &DiffEngine::default(), out, &fx.project, false));
        assert!(text.contains("DRIFT DETECTED:"));
        assert!(text.contains("  + table: orders"));
        assert!(text.contains("  + users.email (TEXT)"));
        assert!(text.contains("  ~ users.age (INT -> BIGINT)"));
        assert!(text.contains("  - users.fax"));

        // diff never persists the fresh snapshot
        let stored = fx.state.snapshots.load_latest("shop").unwrap();
        assert!(!stored.tables.contains_key("orders"));
    }

    #[test]
    fn test_diff_json() {
        let fx = fixture();
        write_schema(&fx, "CREATE TABLE users (id INT);");
        capture(|out| scan(&fx.state, out, &fx.project));
        write_schema(&fx, "CREATE TABLE users (id INT, name TEXT);");

        let text = capture(|out| diff(&fx.state, &DiffEngine::default(), out, &fx.project, true));
        let report: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(report["project"], "shop");
        assert_eq!(report["has_drift"], true);
        assert_eq!(report["changes"]["added"][0]["description"], "users.name (TEXT)");
    }

    #[test]
    fn test_find_history_and_list() {
        let fx = fixture();
        write_schema(&fx, "CREATE TABLE users (id INT PRIMARY KEY, email TEXT UNIQUE);");
        capture(|out| scan(&fx.state, out, &fx.project));

        let text = capture(|out| find(&fx.state, out, "users", false));
        assert!(text.contains("Project: shop"));
        assert!(text.contains("  - id: INT (PK)"));

        let text = capture(|out| find(&fx.state, out, "ghosts", false));
        assert!(text.contains("Table 'ghosts' not found in any cataloged project"));

        let text = capture(|out| history(&fx.state, out, "users", false));
        assert!(text.contains("History: users"));
        assert!(text.contains("    - id: INT PK NOT NULL"));
        assert!(text.contains("    - email: TEXT UNIQUE"));

        let text = capture(|out| list(&fx.state, out, false));
        assert!(text.contains("shop\n"));
        assert!(text.contains("  Tables: 1"));

        let text = capture(|out| list(&fx.state, out, true));
        let summaries: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(summaries[0]["name"], "shop");
    }

    #[test]
    fn test_list_empty_catalog() {
        let fx = fixture();

        let text = capture(|out| list(&fx.state, out, false));
        assert!(text.contains("No projects cataloged yet."));
    }
}
