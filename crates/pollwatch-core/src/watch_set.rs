//! Watched roots and the filters applied while scanning them.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Leading character marking a hidden file or directory.
pub const HIDDEN_MARKER: char = '.';

/// Separator between a file stem and its extension.
const EXTENSION_SEPARATOR: char = '.';

/// Roots to watch plus the exclusion and extension filters.
///
/// Exclusions are plain string prefixes of a directory's full path, so
/// `/data/tmp` also excludes `/data/tmp2`. An empty extension set allows
/// every file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSet {
    /// Root directories, in insertion order.
    #[serde(default)]
    pub roots: IndexSet<PathBuf>,

    /// Directory path prefixes to skip along with their subtrees.
    #[serde(default)]
    pub excluded: IndexSet<String>,

    /// Allowed file extensions, stored without a leading dot.
    #[serde(default)]
    pub extensions: IndexSet<String>,
}

impl WatchSet {
    /// Create an empty watch set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add root directories. Duplicates are ignored.
    pub fn add_watch<I, P>(&mut self, roots: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Add excluded directory prefixes.
    pub fn add_excluded<I, S>(&mut self, prefixes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Add allowed extensions. `".txt"` and `"txt"` are equivalent.
    pub fn add_extensions<I, S>(&mut self, extensions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(extensions.into_iter().map(|ext| {
            let ext = ext.into();
            match ext.strip_prefix(EXTENSION_SEPARATOR) {
                Some(stripped) => stripped.to_string(),
                None => ext,
            }
        }));
        self
    }

    /// Check if a file or directory name is hidden.
    pub fn is_hidden(name: &str) -> bool {
        name.starts_with(HIDDEN_MARKER)
    }

    /// Check if a directory path falls under any excluded prefix.
    pub fn is_excluded(&self, dir: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let dir = dir.to_string_lossy();
        self.excluded
            .iter()
            .any(|prefix| dir.starts_with(prefix.as_str()))
    }

    /// Check if a file name passes the extension allow-list.
    ///
    /// The extension is whatever follows the last `.` in the name; a name
    /// without a `.` is rejected whenever the allow-list is non-empty.
    pub fn allows_file(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        match name.rsplit_once(EXTENSION_SEPARATOR) {
            Some((_, ext)) => self.extensions.contains(ext),
            None => false,
        }
    }
}
