//! Watcher configuration types.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::watch_set::WatchSet;

/// What to do with an event when the consumer's queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait until the consumer makes room. A slow consumer stalls polling.
    #[default]
    Block,
    /// Discard the event and keep polling.
    Drop,
}

/// Configuration for a watcher instance.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WatcherConfig {
    /// Time between two scans of the same root.
    #[builder(default = "Duration::from_secs(1)")]
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Roots and filters.
    #[builder(default)]
    #[serde(default)]
    pub watch: WatchSet,

    /// Behavior when the event queue is full.
    #[builder(default)]
    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// Capacity of the event queue created by `Watcher::channel`.
    #[builder(default = "1")]
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Follow symbolic links while scanning.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Record the current contents of every root at start instead of
    /// reporting them as created on the first tick.
    #[builder(default = "false")]
    #[serde(default)]
    pub baseline_on_start: bool,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_event_buffer() -> usize {
    1
}

impl WatcherConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.poll_interval.is_some_and(|interval| interval.is_zero()) {
            return Err("Poll interval must be greater than zero".to_string());
        }
        if let Some(0) = self.event_buffer {
            return Err("Event buffer must hold at least one event".to_string());
        }
        Ok(())
    }
}

impl WatcherConfig {
    /// Create a new watcher config builder.
    pub fn builder() -> WatcherConfigBuilder {
        WatcherConfigBuilder::default()
    }

    /// Create a config with default settings watching nothing.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            watch: WatchSet::new(),
            overflow: OverflowPolicy::Block,
            event_buffer: 1,
            follow_symlinks: false,
            baseline_on_start: false,
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self::new(default_poll_interval())
    }
}
