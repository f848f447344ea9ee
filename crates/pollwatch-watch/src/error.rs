//! Watcher error types.

use pollwatch_core::ScanError;
use thiserror::Error;

/// Errors returned by watcher operations.
#[derive(Debug, Error)]
pub enum WatchError {
    /// A watched root is missing or unreadable.
    #[error("Watched root unavailable: {0}")]
    Path(#[source] ScanError),

    /// The baseline scan performed at start failed.
    #[error("Initial scan failed: {0}")]
    Scan(#[source] ScanError),

    /// The watch set cannot change while polling.
    #[error("Watcher is running, stop it before changing what it watches")]
    AlreadyRunning,

    /// A polling task panicked.
    #[error("Polling task failed: {0}")]
    Task(String),
}
