//! Version-control revision lookup
//!
//! The revision marker stored with a snapshot comes from a [`RevisionProvider`].
//! [`GitRevision`] asks libgit2 for the commit `HEAD` points at.

use git2::Repository;
use std::path::Path;
use tracing::debug;

/// Supplies the current revision of a scanned directory, if it has one
pub trait RevisionProvider {
    fn current_revision(&self, path: &Path) -> Option<String>;
}

/// Never reports a revision
pub struct NoRevision;

impl RevisionProvider for NoRevision {
    fn current_revision(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Resolves `HEAD` of the nearest enclosing git repository
pub struct GitRevision;

impl RevisionProvider for GitRevision {
    fn current_revision(&self, path: &Path) -> Option<String> {
        match Self::head_commit(path) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!("No revision for {}: {}", path.display(), e.message());
                None
            }
        }
    }
}

impl GitRevision {
    fn head_commit(path: &Path) -> Result<String, git2::Error> {
        let repo = Repository::discover(path)?;
        let commit = repo.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }
}
