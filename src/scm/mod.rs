//! Version-control collaborator for the backup snapshot.
//!
//! The pipeline only needs four operations (ensure a repository exists,
//! untrack a file, track a file, commit with a date); they are behind a
//! trait so tests can drive the pipeline with a recording fake.

mod git;

use anyhow::{anyhow, Result};
use std::path::Path;

pub use git::GitScm;

/// Trait for the version-control operations the backup pipeline relies on.
pub trait Scm {
    /// Directory holding the tracked snapshot files.
    fn workdir(&self) -> &Path;

    /// Stop tracking a file. The working-tree copy is left in place, so
    /// files from earlier runs survive on disk even after they drop out
    /// of the tracked set.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Start tracking a file's current content.
    fn add(&self, path: &Path) -> Result<()>;

    /// Record the tracked state as one revision with the given message and
    /// author/committer date.
    fn commit(&self, message: &str, date: &str) -> Result<()>;

    /// Whether anything is staged relative to the last revision.
    fn has_staged_changes(&self) -> Result<bool>;
}

/// Check if a directory is a Git repository.
pub fn is_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Open an existing Git repository.
pub fn open(path: &Path) -> Result<Box<dyn Scm>> {
    if is_repo(path) {
        Ok(Box::new(GitScm::open(path)?))
    } else {
        Err(anyhow!(
            "No Git repository found at '{}'. Expected .git directory.",
            path.display()
        ))
    }
}

/// Idempotently ensure a Git repository exists at `path` and open it.
pub fn init(path: &Path) -> Result<Box<dyn Scm>> {
    Ok(Box::new(GitScm::init(path)?))
}
