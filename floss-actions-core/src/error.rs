//! Error taxonomy for action execution
//!
//! Three kinds of problems exist:
//!
//! - **Cancellation**: the user backed out (declined a confirmation, closed a
//!   picker). Reported through [`ActionError::Canceled`], logged, never alerted.
//! - **Action failure**: anything else a body reports, plus commit failures.
//!   Always surfaced through the presenter; never retried.
//! - **Configuration errors**: programmer mistakes such as a destructive action
//!   with an empty confirmation title. See [`ConfigError`].

use std::error::Error;
use std::fmt;

/// Boxed error type accepted from action bodies.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Outcome of a failed or withdrawn action invocation.
#[derive(Debug)]
pub enum ActionError {
    /// The user deliberately withdrew. Not an error from the user's point of view.
    Canceled,
    /// The action body reported a failure.
    Failed(BoxError),
    /// The body succeeded but committing the persistence store failed.
    Commit(StoreError),
    /// A reactive body's stream finished without producing a value.
    StreamEnded,
    /// A reactive body was dispatched on a runner with no async runtime attached.
    NoRuntime,
}

impl ActionError {
    /// Wrap any error as an action failure.
    pub fn failed(error: impl Into<BoxError>) -> Self {
        ActionError::Failed(error.into())
    }

    /// Create an action failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        ActionError::Failed(message.into().into())
    }

    /// Whether this is the distinguished cancellation outcome.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ActionError::Canceled)
    }

    /// Short machine-friendly kind, used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::Canceled => "canceled",
            ActionError::Failed(_) => "failed",
            ActionError::Commit(_) => "commit",
            ActionError::StreamEnded => "stream_ended",
            ActionError::NoRuntime => "no_runtime",
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Canceled => write!(f, "Canceled"),
            ActionError::Failed(e) => write!(f, "{}", e),
            ActionError::Commit(e) => write!(f, "Could not save changes: {}", e),
            ActionError::StreamEnded => write!(f, "The action finished without a result"),
            ActionError::NoRuntime => write!(f, "No async runtime is available for this action"),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ActionError::Failed(e) => Some(e.as_ref()),
            ActionError::Commit(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for ActionError {
    fn from(error: StoreError) -> Self {
        ActionError::Commit(error)
    }
}

/// Failure reported by a [`PersistentStore`](crate::store::PersistentStore).
#[derive(Debug)]
pub struct StoreError {
    message: String,
    source: Option<BoxError>,
}

impl StoreError {
    /// Create a store error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Programmer mistakes detected while configuring actions or runners.
#[derive(Debug)]
pub enum ConfigError {
    /// A destructive action is missing one of its confirmation strings.
    MissingConfirmationText(&'static str),
    /// A configuration document could not be parsed.
    Parse(serde_json::Error),
    /// A configuration file could not be read.
    Io(std::io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingConfirmationText(field) => {
                write!(f, "Destructive action is missing confirmation {}", field)
            }
            ConfigError::Parse(e) => write!(f, "Invalid runner configuration: {}", e),
            ConfigError::Io(e) => write!(f, "Could not read runner configuration: {}", e),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::MissingConfirmationText(_) => None,
            ConfigError::Parse(e) => Some(e),
            ConfigError::Io(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse(error)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct OutOfSkeins;

    impl fmt::Display for OutOfSkeins {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "No skeins left")
        }
    }

    impl Error for OutOfSkeins {}

    #[test]
    fn test_failed_keeps_description() {
        let err = ActionError::failed(OutOfSkeins);
        assert_eq!(err.to_string(), "No skeins left");
        assert!(err.source().is_some());
        assert!(!err.is_canceled());
        assert_eq!(err.kind(), "failed");
    }

    #[test]
    fn test_canceled_is_distinct() {
        assert!(ActionError::Canceled.is_canceled());
        assert!(!ActionError::msg("Canceled").is_canceled());
    }

    #[test]
    fn test_commit_error_wraps_store_error() {
        let err: ActionError = StoreError::new("disk full").into();
        assert!(matches!(err, ActionError::Commit(_)));
        assert_eq!(err.to_string(), "Could not save changes: disk full");
    }

    #[test]
    fn test_store_error_with_source() {
        let err = StoreError::with_source("write failed", OutOfSkeins);
        assert_eq!(err.message(), "write failed");
        assert_eq!(err.to_string(), "write failed: No skeins left");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingConfirmationText("title");
        assert_eq!(
            err.to_string(),
            "Destructive action is missing confirmation title"
        );
    }
}
