//! Polling scheduler and watcher lifecycle for pollwatch.
//!
//! A [`Watcher`] runs one tokio task per watched root. Every poll interval
//! the task rescans its root, diffs the result against the root's entry in
//! the shared [`FileIndex`], commits the new snapshot and delivers the
//! resulting [`Event`]s on the consumer's channel.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use pollwatch_watch::{Watcher, WatcherConfig};
//!
//! # async fn run() -> Result<(), pollwatch_watch::WatchError> {
//! let config = WatcherConfig::builder()
//!     .poll_interval(Duration::from_millis(500))
//!     .build()
//!     .unwrap();
//! let (mut watcher, mut events) = Watcher::channel(config);
//! watcher.add_watch(["/srv/data"])?.add_extension(["txt"])?;
//! watcher.start().await?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{event}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A failed scan of any root shuts the whole watcher down. Callers observe
//! this through [`Watcher::shutdown_signal`] and through the event stream
//! going quiet.

mod error;
mod index;
mod poller;
mod sink;
mod watcher;

pub use error::WatchError;
pub use index::FileIndex;
pub use watcher::Watcher;

// Re-export core types for convenience
pub use pollwatch_core::{
    Event, Operation, OverflowPolicy, RunState, ScanError, Snapshot, WatchSet, WatcherConfig,
    WatcherConfigBuilder,
};
