//! Schema Snapshot Module
//!
//! Versioned schema history for every cataloged project:
//! - Snapshot store (immutable per-scan records plus a "latest" alias)
//! - Schema diff engine (drift between two snapshots)
//! - Catalog queries (cross-project search and table history)

pub mod catalog;
pub mod diff;
pub mod store;

pub use catalog::CatalogQuery;
pub use diff::{ChangeType, DiffEngine, DiffOptions, SchemaDiff};
pub use store::SnapshotStore;
