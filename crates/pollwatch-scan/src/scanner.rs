//! JWalk-based snapshot scanner.

use std::io;
use std::path::Path;
use std::sync::Arc;

use compact_str::CompactString;
use jwalk::{DirEntry, Parallelism, WalkDir};
use tracing::{debug, trace};

use pollwatch_core::{FileInfo, ScanError, Snapshot, WatchSet};

/// Builds a [`Snapshot`] of every eligible file beneath a root.
///
/// Traversal is serial and depth-first. Filtering happens while each
/// directory is read, so hidden and excluded directories are never
/// descended into.
#[derive(Debug, Clone, Default)]
pub struct SnapshotScanner {
    follow_symlinks: bool,
}

impl SnapshotScanner {
    /// Create a new scanner that does not follow symbolic links.
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow symbolic links to files and directories.
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Scan `root` against the filters in `watch`.
    ///
    /// The root itself is always scanned, whatever its name. An error reading
    /// the root or any directory below it aborts the whole scan.
    pub fn scan(&self, root: &Path, watch: &WatchSet) -> Result<Snapshot, ScanError> {
        let root_metadata = std::fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
        if !root_metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let mut snapshot = Snapshot::new(root);

        if watch.is_excluded(root) {
            debug!(root = %root.display(), "root is excluded, nothing to scan");
            return Ok(snapshot);
        }

        let filter = Arc::new(watch.clone());
        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(self.follow_symlinks)
            .min_depth(0)
            .process_read_dir(move |depth, _path, _state, children| {
                // The root arrives as a child of its parent with no depth.
                if depth.is_none() {
                    return;
                }
                children.retain(|entry_result| match entry_result {
                    Ok(entry) => is_eligible(&filter, entry),
                    // Keep errors so they reach the caller.
                    Err(_) => true,
                });
            });

        for entry_result in walker {
            let mut entry = entry_result.map_err(|e| walk_error(e, root))?;

            if let Some(err) = entry.read_children_error.take() {
                return Err(walk_error(err, &entry.path()));
            }

            if entry.depth() == 0 || !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) if is_not_found(&err) => {
                    // Removed between listing and stat; the next tick sees it gone.
                    trace!(path = %path.display(), "file vanished during scan");
                    continue;
                }
                Err(err) => return Err(walk_error(err, &path)),
            };

            let name = CompactString::new(entry.file_name().to_string_lossy());
            let modified = metadata.modified().map_err(|e| ScanError::io(&path, e))?;

            snapshot.insert(FileInfo::new(path, name, metadata.len(), modified));
        }

        debug!(root = %root.display(), files = snapshot.len(), "scan complete");

        Ok(snapshot)
    }
}

/// Decide whether a directory child survives the watch set filters.
fn is_eligible(watch: &WatchSet, entry: &DirEntry<((), ())>) -> bool {
    let name = entry.file_name().to_string_lossy();
    if WatchSet::is_hidden(&name) {
        return false;
    }

    let file_type = entry.file_type();
    if file_type.is_dir() {
        !watch.is_excluded(&entry.path())
    } else if file_type.is_file() {
        watch.allows_file(&name)
    } else {
        // Unfollowed symlinks, sockets, devices.
        false
    }
}

fn is_not_found(err: &jwalk::Error) -> bool {
    err.io_error()
        .is_some_and(|io| io.kind() == io::ErrorKind::NotFound)
}

/// Convert a jwalk error into a [`ScanError`] with the best path available.
fn walk_error(err: jwalk::Error, fallback: &Path) -> ScanError {
    let path = err.path().unwrap_or(fallback).to_path_buf();
    match err.io_error() {
        Some(io) => ScanError::io(path, io::Error::new(io.kind(), io.to_string())),
        None => ScanError::Other {
            message: format!("{}: {err}", path.display()),
        },
    }
}
