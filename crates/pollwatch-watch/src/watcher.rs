//! Watcher lifecycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pollwatch_core::{Event, RunState, ScanError, Snapshot, WatchSet, WatcherConfig};
use pollwatch_scan::SnapshotScanner;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::WatchError;
use crate::index::FileIndex;
use crate::poller::{PollTask, scan_blocking};
use crate::sink::EventSink;

/// Polling file system watcher.
///
/// The watcher is `Stopped` until [`start`](Self::start) spawns one polling
/// task per root, and `Running` until [`stop`](Self::stop) or a failed tick
/// shuts every task down. The file index survives a stop, so restarting
/// the same watcher only reports what changed in between.
///
/// The watch set can only be changed while stopped; the mutators return
/// [`WatchError::AlreadyRunning`] otherwise.
#[derive(Debug)]
pub struct Watcher {
    config: WatcherConfig,
    scanner: SnapshotScanner,
    index: Arc<Mutex<FileIndex>>,
    events: mpsc::Sender<Event>,
    dropped: Arc<AtomicU64>,
    state: RunState,
    shutdown: CancellationToken,
    tasks: JoinSet<()>,
}

impl Watcher {
    /// Create a watcher delivering events on a consumer-supplied channel.
    pub fn new(config: WatcherConfig, events: mpsc::Sender<Event>) -> Self {
        let scanner = SnapshotScanner::new().with_follow_symlinks(config.follow_symlinks);
        Self {
            config,
            scanner,
            index: Arc::new(Mutex::new(FileIndex::new())),
            events,
            dropped: Arc::new(AtomicU64::new(0)),
            state: RunState::Stopped,
            shutdown: CancellationToken::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Create a watcher together with the receiving end of its event channel.
    ///
    /// The channel holds `config.event_buffer` events.
    pub fn channel(config: WatcherConfig) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(config.event_buffer.max(1));
        (Self::new(config, tx), rx)
    }

    /// Add root directories to watch.
    pub fn add_watch<I, P>(&mut self, roots: I) -> Result<&mut Self, WatchError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ensure_stopped()?;
        self.config.watch.add_watch(roots);
        Ok(self)
    }

    /// Add allowed file extensions.
    pub fn add_extension<I, S>(&mut self, extensions: I) -> Result<&mut Self, WatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_stopped()?;
        self.config.watch.add_extensions(extensions);
        Ok(self)
    }

    /// Add excluded directory prefixes.
    pub fn add_excluded<I, S>(&mut self, prefixes: I) -> Result<&mut Self, WatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_stopped()?;
        self.config.watch.add_excluded(prefixes);
        Ok(self)
    }

    /// Start polling every root.
    ///
    /// Each root must exist and be a readable directory; otherwise nothing is
    /// spawned and the first failure is returned. Calling this while already
    /// running does nothing.
    pub async fn start(&mut self) -> Result<(), WatchError> {
        if self.started() {
            return Ok(());
        }
        if self.state == RunState::Running {
            // Shut down by a failed tick; reap the finished tasks first.
            self.stop().await?;
        }

        let roots: Vec<PathBuf> = self.config.watch.roots.iter().cloned().collect();
        for root in &roots {
            check_root(root).map_err(WatchError::Path)?;
        }

        let watch = Arc::new(self.config.watch.clone());

        if self.config.baseline_on_start {
            let mut baselines = Vec::with_capacity(roots.len());
            for root in &roots {
                let snapshot = scan_blocking(&self.scanner, root, &watch)
                    .await
                    .map_err(WatchError::Scan)?;
                baselines.push(snapshot);
            }
            let mut index = self.index.lock().await;
            for snapshot in baselines {
                debug!(
                    root = %snapshot.root().display(),
                    files = snapshot.len(),
                    "baseline recorded"
                );
                index.commit(snapshot);
            }
        }

        let shutdown = CancellationToken::new();
        let sink = EventSink::new(
            self.events.clone(),
            self.config.overflow,
            Arc::clone(&self.dropped),
        );

        for root in roots {
            let task = PollTask {
                root,
                interval: self.config.poll_interval,
                watch: Arc::clone(&watch),
                scanner: self.scanner.clone(),
                index: Arc::clone(&self.index),
                sink: sink.clone(),
                shutdown: shutdown.clone(),
            };
            self.tasks.spawn(task.run());
        }

        self.shutdown = shutdown;
        self.state = RunState::Running;
        info!(
            roots = watch.roots.len(),
            interval = ?self.config.poll_interval,
            "watcher started"
        );

        Ok(())
    }

    /// Stop polling.
    ///
    /// Signals every task and waits for all of them to finish, so no event
    /// is delivered after this returns. Calling this while stopped does
    /// nothing.
    pub async fn stop(&mut self) -> Result<(), WatchError> {
        if self.state == RunState::Stopped {
            return Ok(());
        }

        self.shutdown.cancel();

        let mut result = Ok(());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Err(err) if err.is_panic() => result = Err(WatchError::Task(err.to_string())),
                _ => {}
            }
        }

        self.state = RunState::Stopped;
        info!("watcher stopped");

        result
    }

    /// Whether the watcher is polling.
    ///
    /// Turns false as soon as the shutdown signal fires, including when a
    /// failed tick triggered it.
    pub fn started(&self) -> bool {
        self.state == RunState::Running && !self.shutdown.is_cancelled()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        if self.started() {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }

    /// Token that fires when the current run shuts down.
    ///
    /// Cancelling it has the same effect on the tasks as [`stop`](Self::stop),
    /// but the tasks are only reaped by the next `stop` or `start`.
    pub fn shutdown_signal(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Number of events discarded under [`OverflowPolicy::Drop`](pollwatch_core::OverflowPolicy::Drop).
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Current configuration.
    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Roots and filters in effect.
    pub fn watch_set(&self) -> &WatchSet {
        &self.config.watch
    }

    /// Copy of the last committed snapshot for a root.
    pub async fn snapshot(&self, root: &Path) -> Option<Snapshot> {
        self.index.lock().await.get(root).cloned()
    }

    fn ensure_stopped(&self) -> Result<(), WatchError> {
        if self.started() {
            Err(WatchError::AlreadyRunning)
        } else {
            Ok(())
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Verify a root exists, is a directory and can be listed.
fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = std::fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    std::fs::read_dir(root).map_err(|e| ScanError::io(root, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_root() {
        let temp = TempDir::new().unwrap();
        assert!(check_root(temp.path()).is_ok());

        let missing = temp.path().join("missing");
        assert!(matches!(
            check_root(&missing),
            Err(ScanError::NotFound { .. })
        ));

        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            check_root(&file),
            Err(ScanError::NotADirectory { .. })
        ));
    }

    #[tokio::test]
    async fn test_mutators_rejected_while_running() {
        let temp = TempDir::new().unwrap();
        let (mut watcher, _rx) = Watcher::channel(WatcherConfig::default());
        watcher.add_watch([temp.path()]).unwrap();
        watcher.start().await.unwrap();

        assert!(matches!(
            watcher.add_extension(["txt"]),
            Err(WatchError::AlreadyRunning)
        ));
        assert!(matches!(
            watcher.add_excluded(["/tmp"]),
            Err(WatchError::AlreadyRunning)
        ));

        watcher.stop().await.unwrap();
        watcher.add_extension(["txt"]).unwrap();
        assert!(watcher.watch_set().extensions.contains("txt"));
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let temp = TempDir::new().unwrap();
        let (mut watcher, _rx) = Watcher::channel(WatcherConfig::default());
        watcher.add_watch([temp.path()]).unwrap();

        watcher.stop().await.unwrap();
        assert_eq!(watcher.state(), RunState::Stopped);

        watcher.start().await.unwrap();
        watcher.start().await.unwrap();
        assert!(watcher.started());
        assert_eq!(watcher.tasks.len(), 1);

        watcher.stop().await.unwrap();
        watcher.stop().await.unwrap();
        assert!(!watcher.started());
        assert!(watcher.tasks.is_empty());
    }
}
