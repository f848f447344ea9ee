//! Application configuration file.
//!
//! The file is a JSON document of the form
//!
//! ```json
//! {
//!   "watcher": {
//!     "reload": "2s",
//!     "dirs": { "watch": ["/srv"], "excluded": ["/srv/tmp"], "extensions": ["txt"] },
//!     "log": { "level": "info" }
//!   }
//! }
//! ```
//!
//! `reload_time` (whole seconds) is accepted in place of `reload`. Every
//! section is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::WatcherConfig;
use crate::error::ConfigError;
use crate::watch_set::WatchSet;

/// Environment variable selecting the configuration file.
const ENV_VAR: &str = "ENV";
const DEFAULT_ENV: &str = "local";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub watcher: WatcherSection,
}

/// The `watcher` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatcherSection {
    /// Poll interval as a duration string (`"500ms"`, `"2s"`, `"1m"`).
    #[serde(default)]
    pub reload: Option<String>,

    /// Poll interval in whole seconds. Ignored when `reload` is set.
    #[serde(default)]
    pub reload_time: Option<u64>,

    #[serde(default)]
    pub dirs: DirsSection,

    #[serde(default)]
    pub log: LogSection,
}

/// The `watcher.dirs` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirsSection {
    #[serde(default)]
    pub watch: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// The `watcher.log` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl AppConfig {
    /// Name of the current environment (`$ENV`, defaulting to `local`).
    pub fn environment() -> String {
        std::env::var(ENV_VAR)
            .ok()
            .filter(|env| !env.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENV.to_string())
    }

    /// Configuration path for an environment: `config/app.<env>.json`.
    pub fn path_for(env: &str) -> PathBuf {
        PathBuf::from("config").join(format!("app.{env}.json"))
    }

    /// Configuration path for the current environment.
    pub fn default_path() -> PathBuf {
        Self::path_for(&Self::environment())
    }

    /// Load and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a configuration document.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl WatcherSection {
    /// Effective poll interval, defaulting to one second.
    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        match (&self.reload, self.reload_time) {
            (Some(reload), _) => parse_duration(reload),
            (None, Some(secs)) => Ok(Duration::from_secs(secs)),
            (None, None) => Ok(Duration::from_secs(1)),
        }
    }

    /// Build the watch set described by the `dirs` section.
    pub fn watch_set(&self) -> WatchSet {
        let mut watch = WatchSet::new();
        watch
            .add_watch(self.dirs.watch.iter().map(PathBuf::from))
            .add_excluded(self.dirs.excluded.iter().cloned())
            .add_extensions(self.dirs.extensions.iter().cloned());
        watch
    }

    /// Convert into a validated watcher configuration.
    pub fn to_watcher_config(&self) -> Result<WatcherConfig, ConfigError> {
        WatcherConfig::builder()
            .poll_interval(self.poll_interval()?)
            .watch(self.watch_set())
            .build()
            .map_err(|e| ConfigError::Invalid {
                message: e.to_string(),
            })
    }
}

/// Parse a duration string (e.g., "250ms", "2s", "5m", "1h").
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim().to_lowercase();
    let invalid = || ConfigError::InvalidDuration { value: s.clone() };

    let (num, multiplier) = if let Some(num) = s.strip_suffix("ms") {
        (num, 0.001)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, 1.0)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60.0)
    } else if let Some(num) = s.strip_suffix('h') {
        (num, 60.0 * 60.0)
    } else {
        (s.as_str(), 1.0)
    };

    let num: f64 = num.trim().parse().map_err(|_| invalid())?;
    if !num.is_finite() || num < 0.0 {
        return Err(invalid());
    }

    Duration::try_from_secs_f64(num * multiplier).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("1e300h").is_err());
        assert!(parse_duration("1e20").is_err());
    }

    #[test]
    fn test_path_for() {
        assert_eq!(
            AppConfig::path_for("prod"),
            PathBuf::from("config").join("app.prod.json")
        );
    }

    #[test]
    fn test_parse_empty_document() {
        let config = AppConfig::parse("{}").unwrap();
        assert_eq!(config.watcher.log.level, "info");
        assert!(config.watcher.dirs.watch.is_empty());
        assert_eq!(
            config.watcher.poll_interval().unwrap(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_reload_takes_precedence() {
        let config = AppConfig::parse(
            r#"{"watcher": {"reload": "500ms", "reload_time": 10}}"#,
        )
        .unwrap();
        assert_eq!(
            config.watcher.poll_interval().unwrap(),
            Duration::from_millis(500)
        );
    }
}
