//! Per-root polling task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pollwatch_core::{ScanError, Snapshot, WatchSet};
use pollwatch_scan::{SnapshotScanner, diff};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::index::FileIndex;
use crate::sink::{DeliveryError, EventSink};

/// Reasons a tick ends early.
#[derive(Debug, Error)]
enum TickError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Everything one root's polling loop needs.
pub(crate) struct PollTask {
    pub root: PathBuf,
    pub interval: Duration,
    pub watch: Arc<WatchSet>,
    pub scanner: SnapshotScanner,
    pub index: Arc<Mutex<FileIndex>>,
    pub sink: EventSink,
    pub shutdown: CancellationToken,
}

impl PollTask {
    /// Poll until shutdown fires or a tick fails.
    ///
    /// A failed tick cancels the shared shutdown token, which stops the
    /// tasks of every other root as well.
    pub async fn run(self) {
        debug!(root = %self.root.display(), interval = ?self.interval, "polling started");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!(root = %self.root.display(), "received shutdown signal");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            match self.tick().await {
                Ok(()) => {}
                Err(TickError::Delivery(DeliveryError::Cancelled)) => {
                    info!(root = %self.root.display(), "shutdown during event delivery");
                    return;
                }
                Err(err) => {
                    error!(
                        root = %self.root.display(),
                        error = %err,
                        "tick failed, shutting down watcher"
                    );
                    self.shutdown.cancel();
                    return;
                }
            }
        }
    }

    /// Scan, diff, commit, then deliver, all under the index lock.
    async fn tick(&self) -> Result<(), TickError> {
        let mut index = self.index.lock().await;

        let snapshot = scan_blocking(&self.scanner, &self.root, &self.watch).await?;
        let outcome = match index.get(&self.root) {
            Some(previous) => diff(previous, &snapshot),
            None => diff(&Snapshot::new(&self.root), &snapshot),
        };
        index.commit(snapshot);

        if outcome.is_empty() {
            return Ok(());
        }

        debug!(root = %self.root.display(), events = outcome.events.len(), "changes detected");
        for event in outcome.events {
            self.sink.deliver(event, &self.shutdown).await?;
        }

        Ok(())
    }
}

/// Run a scan on the blocking pool.
pub(crate) async fn scan_blocking(
    scanner: &SnapshotScanner,
    root: &Path,
    watch: &Arc<WatchSet>,
) -> Result<Snapshot, ScanError> {
    let scanner = scanner.clone();
    let root = root.to_path_buf();
    let watch = Arc::clone(watch);

    tokio::task::spawn_blocking(move || scanner.scan(&root, &watch))
        .await
        .unwrap_or_else(|e| {
            Err(ScanError::Other {
                message: e.to_string(),
            })
        })
}
