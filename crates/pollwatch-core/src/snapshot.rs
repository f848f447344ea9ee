//! Point-in-time file metadata and per-root snapshots.

use std::collections::HashMap;
use std::collections::hash_map;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Observed metadata of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Full path of the file (root joined with the relative path).
    pub full_path: PathBuf,
    /// File name (last path component).
    pub name: CompactString,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

impl FileInfo {
    /// Create a new file info record.
    pub fn new(
        full_path: impl Into<PathBuf>,
        name: impl Into<CompactString>,
        size: u64,
        modified: SystemTime,
    ) -> Self {
        Self {
            full_path: full_path.into(),
            name: name.into(),
            size,
            modified,
        }
    }

    /// Whether `other` describes a changed version of this file.
    ///
    /// Only size and modification time are compared; content is never read.
    pub fn differs_from(&self, other: &FileInfo) -> bool {
        self.size != other.size || self.modified != other.modified
    }
}

/// Complete set of eligible files under one root, as of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    root: PathBuf,
    files: HashMap<PathBuf, FileInfo>,
}

impl Snapshot {
    /// Create an empty snapshot for a root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: HashMap::new(),
        }
    }

    /// Root this snapshot was taken of.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record a file, keyed by its full path. Replaces any previous entry.
    pub fn insert(&mut self, info: FileInfo) {
        self.files.insert(info.full_path.clone(), info);
    }

    /// Look up a file by full path.
    pub fn get(&self, path: &Path) -> Option<&FileInfo> {
        self.files.get(path)
    }

    /// Check if a path is present.
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no files were recorded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files in no particular order.
    pub fn iter(&self) -> hash_map::Values<'_, PathBuf, FileInfo> {
        self.files.values()
    }

    /// Iterate over all recorded paths in no particular order.
    pub fn paths(&self) -> hash_map::Keys<'_, PathBuf, FileInfo> {
        self.files.keys()
    }
}

impl Extend<FileInfo> for Snapshot {
    fn extend<T: IntoIterator<Item = FileInfo>>(&mut self, iter: T) {
        for info in iter {
            self.insert(info);
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a FileInfo;
    type IntoIter = hash_map::Values<'a, PathBuf, FileInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
