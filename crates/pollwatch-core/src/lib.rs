//! Core types and configuration for pollwatch.
//!
//! This crate provides the value types shared by the scan engine and the
//! watcher: per-file metadata, per-root snapshots, change events, the watch
//! set filters, and the configuration records (including the JSON
//! configuration file loader used by the binary).

mod app_config;
mod config;
mod error;
mod event;
mod snapshot;
mod watch_set;

pub use app_config::{AppConfig, DirsSection, LogSection, WatcherSection, parse_duration};
pub use config::{OverflowPolicy, WatcherConfig, WatcherConfigBuilder};
pub use error::{ConfigError, ScanError};
pub use event::{Event, Operation, RunState};
pub use snapshot::{FileInfo, Snapshot};
pub use watch_set::{HIDDEN_MARKER, WatchSet};
