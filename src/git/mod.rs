//! Git integration layer
//!
//! Discovery prefers the files git tracks over a plain directory walk, so
//! build artifacts and other untracked files are never checked.

use anyhow::{Context, Result};
use git2::Repository;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Git operations handler
pub struct GitOperations {
    repo: Repository,
}

impl GitOperations {
    /// Open the repository containing `path`
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path.as_ref()).context("No Git repository found")?;

        Ok(Self { repo })
    }

    /// Get working directory path (None for bare repositories)
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Paths recorded in the index, relative to the work tree, sorted
    pub fn tracked_files(&self) -> Result<Vec<PathBuf>> {
        let index = self.repo.index().context("Failed to read Git index")?;

        // Conflicted paths appear once per stage
        let tracked: BTreeSet<PathBuf> = index
            .iter()
            .map(|entry| PathBuf::from(String::from_utf8_lossy(&entry.path).into_owned()))
            .collect();

        Ok(tracked.into_iter().collect())
    }
}
