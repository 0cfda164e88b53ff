//! Store handle for trailhead's on-disk state.
//!
//! A store is a directory holding the SQLite databases (catalog, progress, quiz), the
//! broker audit log, and an optional `trailhead.toml`.

use crate::core::error::TrailheadError;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute or working-directory-relative path to the store root
    pub root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the store directory if it does not exist yet.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, TrailheadError> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    pub fn db_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
