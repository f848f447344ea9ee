//! Directory scanning and snapshot diffing for pollwatch.
//!
//! # Overview
//!
//! `pollwatch-scan` turns a watched root into a [`Snapshot`] and compares two
//! snapshots of the same root:
//!
//! - **Scanning** walks the root depth-first via jwalk, skipping hidden
//!   entries, excluded directory prefixes, and files outside the extension
//!   allow-list.
//! - **Diffing** classifies every differing path as created, updated or
//!   deleted, and appends one root-changed event when anything differs.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use pollwatch_scan::{SnapshotScanner, WatchSet, diff};
//!
//! let mut watch = WatchSet::new();
//! watch.add_extensions(["txt"]);
//!
//! let scanner = SnapshotScanner::new();
//! let before = scanner.scan(Path::new("/srv/data"), &watch).unwrap();
//! // ... time passes ...
//! let after = scanner.scan(Path::new("/srv/data"), &watch).unwrap();
//!
//! for event in diff(&before, &after).events {
//!     println!("{event}");
//! }
//! ```

mod diff;
mod scanner;

pub use diff::{DiffOutcome, diff};
pub use scanner::SnapshotScanner;

// Re-export core types for convenience
pub use pollwatch_core::{Event, FileInfo, Operation, ScanError, Snapshot, WatchSet};
