//! Last committed snapshot per root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pollwatch_core::Snapshot;

/// Per-root store of the most recently committed snapshot.
///
/// Entries are only ever replaced whole, so a reader never sees a mix of two
/// scans.
#[derive(Debug, Default)]
pub struct FileIndex {
    snapshots: HashMap<PathBuf, Snapshot>,
}

impl FileIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed snapshot for a root.
    pub fn get(&self, root: &Path) -> Option<&Snapshot> {
        self.snapshots.get(root)
    }

    /// Replace the entry for the snapshot's root, returning the old one.
    pub fn commit(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        self.snapshots
            .insert(snapshot.root().to_path_buf(), snapshot)
    }

    /// Forget a root.
    pub fn remove(&mut self, root: &Path) -> Option<Snapshot> {
        self.snapshots.remove(root)
    }

    /// Number of roots with a committed snapshot.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
