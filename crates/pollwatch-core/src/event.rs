//! Change events and watcher run state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of change reported for a path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// A file appeared.
    Created,
    /// A file's size or modification time changed.
    Updated,
    /// A file disappeared.
    Deleted,
    /// At least one file under the root changed during the tick.
    RootChanged,
}

impl Operation {
    /// Check if this is a file-level operation (not [`Operation::RootChanged`]).
    pub fn is_file_level(&self) -> bool {
        !matches!(self, Operation::RootChanged)
    }
}

/// A single detected change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// File path, or the root path for [`Operation::RootChanged`].
    pub path: PathBuf,
    /// What happened.
    pub operation: Operation,
}

impl Event {
    /// Create a new event.
    pub fn new(path: impl Into<PathBuf>, operation: Operation) -> Self {
        Self {
            path: path.into(),
            operation,
        }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Operation::Created)
    }

    pub fn updated(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Operation::Updated)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Operation::Deleted)
    }

    pub fn root_changed(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Operation::RootChanged)
    }

    /// Path the event refers to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.operation, self.path.display())
    }
}

/// Lifecycle state of a watcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}
