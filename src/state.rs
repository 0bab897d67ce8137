//! Application state management
//!
//! Everything a command needs, built once from [`Settings`].

use crate::config::Settings;
use crate::introspection::{ExtractorRegistry, SchemaIntrospector};
use crate::revision::{GitRevision, NoRevision, RevisionProvider};
use crate::snapshot::{CatalogQuery, DiffEngine, DiffOptions, SnapshotStore};

/// Application state shared by all command handlers
pub struct AppState {
    /// Catalog storage, rooted at the configured catalog directory
    pub snapshots: SnapshotStore,

    /// Source kind -> extractor dispatch table
    pub extractors: ExtractorRegistry,

    /// Supplies the revision marker recorded with each scan
    pub revision: Box<dyn RevisionProvider>,

    /// Which column attributes count as drift
    pub diff_options: DiffOptions,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let revision: Box<dyn RevisionProvider> = if settings.catalog.record_revision {
            Box::new(GitRevision)
        } else {
            Box::new(NoRevision)
        };

        Self {
            snapshots: SnapshotStore::new(settings.catalog.root.clone()),
            extractors: ExtractorRegistry::default(),
            revision,
            diff_options: DiffOptions {
                compare_constraints: settings.diff.strict,
            },
        }
    }

    pub fn introspector(&self) -> SchemaIntrospector<'_> {
        SchemaIntrospector::new(&self.extractors, self.revision.as_ref())
    }

    pub fn catalog(&self) -> CatalogQuery<'_> {
        CatalogQuery::new(&self.snapshots)
    }

    pub fn diff_engine(&self) -> DiffEngine {
        DiffEngine::new(self.diff_options)
    }
}
