//! Runner configuration
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! {
//!   "inline_completion": true,
//!   "dedupe_in_flight": false,
//!   "trace": true,
//!   "log": { "enabled": true, "capacity": 200, "exclude": "Refresh*" }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::action_log::{ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware};
use crate::error::ConfigError;

/// Behavior switches for an [`ActionRunner`](crate::ActionRunner).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Run completions inline when signaled from the UI thread.
    ///
    /// When false every completion is queued and observed on the next drain.
    pub inline_completion: bool,
    /// Drop a `perform` whose action name is already in flight.
    pub dedupe_in_flight: bool,
    /// Install a `LoggingMiddleware` that traces every outcome.
    pub trace: bool,
    /// In-memory action log.
    pub log: ActionLogSettings,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            inline_completion: true,
            dedupe_in_flight: false,
            trace: true,
            log: ActionLogSettings::default(),
        }
    }
}

impl RunnerConfig {
    /// Parse from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Enable in-flight de-duplication.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe_in_flight = dedupe;
        self
    }

    /// Toggle inline completion on the UI thread.
    pub fn with_inline_completion(mut self, inline: bool) -> Self {
        self.inline_completion = inline;
        self
    }
}

/// Settings for the in-memory action log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionLogSettings {
    pub enabled: bool,
    /// Ring buffer size.
    pub capacity: usize,
    /// Comma-separated glob patterns to include.
    pub include: Option<String>,
    /// Comma-separated glob patterns to exclude.
    pub exclude: Option<String>,
}

impl Default for ActionLogSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: ActionLogConfig::default().capacity,
            include: None,
            exclude: None,
        }
    }
}

impl ActionLogSettings {
    /// Build the logger middleware, or `None` when disabled.
    pub fn build(&self) -> Option<ActionLoggerMiddleware> {
        if !self.enabled {
            return None;
        }
        let filter = ActionLoggerConfig::new(self.include.as_deref(), self.exclude.as_deref());
        Some(ActionLoggerMiddleware::with_log(ActionLogConfig::new(
            self.capacity,
            filter,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = RunnerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert!(config.inline_completion);
        assert!(!config.dedupe_in_flight);
        assert!(config.log.build().is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = RunnerConfig::from_json_str(
            r#"{ "dedupe_in_flight": true, "log": { "enabled": true, "capacity": 5, "exclude": "Refresh*" } }"#,
        )
        .unwrap();

        assert!(config.dedupe_in_flight);
        assert!(config.inline_completion);

        let logger = config.log.build().unwrap();
        assert!(logger.config().should_log("DeleteThread"));
        assert!(!logger.config().should_log("RefreshCatalog"));
        assert_eq!(logger.read_log(|log| log.config().capacity), Some(5));
    }

    #[test]
    fn test_invalid_json() {
        let err = RunnerConfig::from_json_str("{ \"trace\": 3 }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RunnerConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
