//! Middleware hooks around each action invocation
//!
//! Middleware sees every invocation twice: once when the runner accepts it and
//! once when its outcome is known. Cancellation telemetry, logging and the
//! in-memory [`ActionLog`](crate::action_log::ActionLog) are all middleware.

use std::fmt;
use std::sync::Arc;

use crate::action::Capabilities;

/// Identity of one invocation as seen by middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    /// Invocation id, unique per runner.
    pub id: u64,
    /// Action name (from `ActionMeta::name()`).
    pub name: &'static str,
    /// Known capabilities. The shape flag is present once the body was built.
    pub capabilities: Capabilities,
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The body succeeded (and the store was committed if eligible).
    Succeeded,
    /// The user withdrew. Never alerted.
    Canceled,
    /// The body or the commit failed; carries the error description.
    Failed(String),
    /// `can_perform` was false; nothing ran.
    Skipped,
    /// Dropped because the same action was already in flight.
    Deduplicated,
}

impl Outcome {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Canceled => "canceled",
            Outcome::Failed(_) => "failed",
            Outcome::Skipped => "skipped",
            Outcome::Deduplicated => "deduplicated",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed(reason) => write!(f, "failed: {}", reason),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Middleware trait for observing invocations
///
/// Implement this trait to add logging, telemetry, or other cross-cutting
/// concerns to a runner. Hooks run on the UI thread.
pub trait Middleware: Send + Sync + 'static {
    /// Called when the runner accepts an invocation, before any confirmation
    fn before(&self, record: &ActionRecord);

    /// Called once the invocation's outcome is known
    fn after(&self, record: &ActionRecord, outcome: &Outcome);
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn before(&self, record: &ActionRecord) {
        (**self).before(record)
    }

    fn after(&self, record: &ActionRecord, outcome: &Outcome) {
        (**self).after(record, outcome)
    }
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl Middleware for NoopMiddleware {
    fn before(&self, _record: &ActionRecord) {}
    fn after(&self, _record: &ActionRecord, _outcome: &Outcome) {}
}

/// Middleware that logs invocations through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    /// Whether to log when an invocation starts
    pub log_before: bool,
    /// Whether to log outcomes
    pub log_after: bool,
}

impl LoggingMiddleware {
    /// Create a new logging middleware with default settings (log outcomes only)
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Create a logging middleware that logs both start and outcome
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl Middleware for LoggingMiddleware {
    fn before(&self, record: &ActionRecord) {
        if self.log_before {
            tracing::debug!(
                action = %record.name,
                id = record.id,
                capabilities = %record.capabilities,
                "Performing action"
            );
        }
    }

    fn after(&self, record: &ActionRecord, outcome: &Outcome) {
        if !self.log_after {
            return;
        }
        match outcome {
            Outcome::Failed(reason) => tracing::warn!(
                action = %record.name,
                id = record.id,
                reason = %reason,
                "Action failed"
            ),
            other => tracing::debug!(
                action = %record.name,
                id = record.id,
                outcome = other.label(),
                "Action finished"
            ),
        }
    }
}

/// Compose multiple middleware into a single middleware
#[derive(Default)]
pub struct ComposedMiddleware {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl fmt::Debug for ComposedMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl ComposedMiddleware {
    /// Create a new composed middleware
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the composition
    pub fn add<M: Middleware>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Number of composed middleware
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Whether nothing is composed
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl Middleware for ComposedMiddleware {
    fn before(&self, record: &ActionRecord) {
        for middleware in &self.middlewares {
            middleware.before(record);
        }
    }

    fn after(&self, record: &ActionRecord, outcome: &Outcome) {
        // Call in reverse order for proper nesting
        for middleware in self.middlewares.iter().rev() {
            middleware.after(record, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn record() -> ActionRecord {
        ActionRecord {
            id: 7,
            name: "MarkInStock",
            capabilities: Capabilities::SYNC | Capabilities::COMMITS,
        }
    }

    struct Tagging {
        tag: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Tagging {
        fn before(&self, record: &ActionRecord) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:before:{}", self.tag, record.name));
        }

        fn after(&self, _record: &ActionRecord, outcome: &Outcome) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:after:{}", self.tag, outcome.label()));
        }
    }

    #[test]
    fn test_composed_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut composed = ComposedMiddleware::new();
        composed.add(Tagging {
            tag: "a",
            calls: calls.clone(),
        });
        composed.add(Tagging {
            tag: "b",
            calls: calls.clone(),
        });
        assert_eq!(composed.len(), 2);

        composed.before(&record());
        composed.after(&record(), &Outcome::Canceled);

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "a:before:MarkInStock",
                "b:before:MarkInStock",
                "b:after:canceled",
                "a:after:canceled",
            ]
        );
    }

    #[test]
    fn test_arc_middleware_delegates() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::new(Tagging {
            tag: "shared",
            calls: calls.clone(),
        });

        let mut composed = ComposedMiddleware::new();
        composed.add(shared.clone());
        composed.after(&record(), &Outcome::Succeeded);

        assert_eq!(*calls.lock().unwrap(), vec!["shared:after:succeeded"]);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Succeeded.to_string(), "succeeded");
        assert_eq!(
            Outcome::Failed("disk full".into()).to_string(),
            "failed: disk full"
        );
    }
}
