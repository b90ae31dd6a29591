//! Action logging with pattern-based filtering and in-memory storage
//!
//! Provides configurable action logging using glob patterns to include/exclude
//! specific actions from logs. Supports both tracing output and an in-memory
//! ring buffer of recent invocations with their outcomes.
//!
//! # Example
//!
//! ```ignore
//! use floss_actions_core::action_log::{ActionLogConfig, ActionLoggerMiddleware};
//!
//! let logger = Arc::new(ActionLoggerMiddleware::with_log(ActionLogConfig::default()));
//! let runner = ActionRunner::builder(store, ui.handle())
//!     .middleware(logger.clone())
//!     .build();
//!
//! for entry in logger.recent(10) {
//!     println!("{} {} {:?}", entry.elapsed_display(), entry.name, entry.outcome);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

use crate::action::Capabilities;
use crate::middleware::{ActionRecord, Middleware, Outcome};

/// Configuration for action logging with glob pattern filtering.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `Delete*` matches DeleteThread, DeleteProject, etc.
/// - `*ShoppingList*` matches AddToShoppingList, RemoveFromShoppingList
/// - `Publish` matches only Publish
#[derive(Debug, Clone, Default)]
pub struct ActionLoggerConfig {
    /// If non-empty, only log actions matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude actions matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl ActionLoggerConfig {
    /// Create a new config from comma-separated pattern strings
    ///
    /// # Example
    /// ```
    /// use floss_actions_core::action_log::ActionLoggerConfig;
    ///
    /// let config = ActionLoggerConfig::new(Some("Delete*,Publish"), Some("DeleteDraft"));
    /// assert!(config.should_log("DeleteThread"));
    /// assert!(config.should_log("Publish"));
    /// assert!(!config.should_log("DeleteDraft"));
    /// assert!(!config.should_log("MarkInStock"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: split_patterns(include),
            exclude_patterns: split_patterns(exclude),
        }
    }

    /// Create a config with specific pattern vectors
    pub fn with_patterns(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include_patterns: include,
            exclude_patterns: exclude,
        }
    }

    /// Check if an action name should be logged based on include/exclude patterns
    pub fn should_log(&self, action_name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| glob_match(p, action_name))
        {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| glob_match(p, action_name))
    }
}

fn split_patterns(list: Option<&str>) -> Vec<String> {
    list.map(|s| {
        s.split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

// ============================================================================
// In-Memory Action Log
// ============================================================================

/// An entry in the action log
#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    /// Invocation id (from the runner)
    pub id: u64,
    /// Action name
    pub name: &'static str,
    /// Capabilities at the time the outcome was recorded
    pub capabilities: Capabilities,
    /// Timestamp when the invocation started
    pub timestamp: Instant,
    /// Sequence number for ordering
    pub sequence: u64,
    /// Outcome, once known
    pub outcome: Option<Outcome>,
}

impl ActionLogEntry {
    /// Create a new log entry
    pub fn new(record: &ActionRecord, sequence: u64) -> Self {
        Self {
            id: record.id,
            name: record.name,
            capabilities: record.capabilities,
            timestamp: Instant::now(),
            sequence,
            outcome: None,
        }
    }

    /// Time since this invocation started
    pub fn elapsed(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }

    /// Format the elapsed time for display (e.g., "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }

    /// Whether the invocation is still waiting for an outcome
    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Configuration for the action log ring buffer
#[derive(Debug, Clone)]
pub struct ActionLogConfig {
    /// Maximum number of entries to keep
    pub capacity: usize,
    /// Filter config
    pub filter: ActionLoggerConfig,
}

impl Default for ActionLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: ActionLoggerConfig::default(),
        }
    }
}

impl ActionLogConfig {
    /// Create with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Create with custom capacity and filter
    pub fn new(capacity: usize, filter: ActionLoggerConfig) -> Self {
        Self { capacity, filter }
    }
}

/// In-memory ring buffer of recent invocations
///
/// Older entries are discarded when capacity is reached. Outcomes arrive out
/// of order for async actions, so they are matched by invocation id.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
    config: ActionLogConfig,
    next_sequence: u64,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(ActionLogConfig::default())
    }
}

impl ActionLog {
    /// Create a new action log with configuration
    pub fn new(config: ActionLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Log an invocation (if it passes the filter)
    ///
    /// Returns the entry if it was logged, None if filtered out.
    pub fn log(&mut self, record: &ActionRecord) -> Option<&ActionLogEntry> {
        if self.config.capacity == 0 || !self.config.filter.should_log(record.name) {
            return None;
        }

        let entry = ActionLogEntry::new(record, self.next_sequence);
        self.next_sequence += 1;

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }

        self.entries.push_back(entry);
        self.entries.back()
    }

    /// Record the outcome of a logged invocation
    ///
    /// Returns false if the invocation was filtered out or already evicted.
    pub fn record_outcome(&mut self, record: &ActionRecord, outcome: &Outcome) -> bool {
        match self.entries.iter_mut().rev().find(|e| e.id == record.id) {
            Some(entry) => {
                entry.capabilities = record.capabilities;
                entry.outcome = Some(outcome.clone());
                true
            }
            None => false,
        }
    }

    /// Get all entries (oldest first)
    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    /// Get the most recent N entries (newest first)
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter().rev().take(count)
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get configuration
    pub fn config(&self) -> &ActionLogConfig {
        &self.config
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Middleware that logs invocations with configurable pattern filtering.
///
/// Supports two modes:
/// - **Tracing only** (default): logs via `tracing::debug!()`
/// - **With storage**: also keeps an [`ActionLog`] ring buffer
///
/// Share it with `Arc` to read the log while the runner owns the middleware.
#[derive(Debug)]
pub struct ActionLoggerMiddleware {
    config: ActionLoggerConfig,
    log: Option<Mutex<ActionLog>>,
    active: bool,
}

impl ActionLoggerMiddleware {
    /// Create a new action logger middleware with tracing only
    pub fn new(config: ActionLoggerConfig) -> Self {
        Self {
            config,
            log: None,
            active: true,
        }
    }

    /// Create middleware with in-memory storage
    pub fn with_log(config: ActionLogConfig) -> Self {
        Self {
            config: config.filter.clone(),
            log: Some(Mutex::new(ActionLog::new(config))),
            active: true,
        }
    }

    /// Create with default config and in-memory storage
    pub fn with_default_log() -> Self {
        Self::with_log(ActionLogConfig::default())
    }

    /// Set whether the middleware is active.
    ///
    /// When inactive, both hooks return immediately.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Check if the middleware is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Get a reference to the filter config
    pub fn config(&self) -> &ActionLoggerConfig {
        &self.config
    }

    /// Copy of the most recent N entries (newest first)
    pub fn recent(&self, count: usize) -> Vec<ActionLogEntry> {
        self.read_log(|log| log.recent(count).cloned().collect())
            .unwrap_or_default()
    }

    /// Run a closure against the stored log (if storage is enabled)
    pub fn read_log<R>(&self, f: impl FnOnce(&ActionLog) -> R) -> Option<R> {
        let log = self.log.as_ref()?;
        let guard = match log.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Some(f(&guard))
    }

    fn with_log_mut(&self, f: impl FnOnce(&mut ActionLog)) {
        if let Some(log) = self.log.as_ref() {
            let mut guard = match log.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            f(&mut guard);
        }
    }
}

impl Middleware for ActionLoggerMiddleware {
    fn before(&self, record: &ActionRecord) {
        if !self.active {
            return;
        }

        if self.config.should_log(record.name) {
            tracing::debug!(action = %record.name, id = record.id, "action");
        }

        self.with_log_mut(|log| {
            log.log(record);
        });
    }

    fn after(&self, record: &ActionRecord, outcome: &Outcome) {
        if !self.active {
            return;
        }

        if self.config.should_log(record.name) {
            tracing::debug!(
                action = %record.name,
                id = record.id,
                outcome = outcome.label(),
                "action outcome"
            );
        }

        self.with_log_mut(|log| {
            log.record_outcome(record, outcome);
        });
    }
}

/// Simple glob pattern matching supporting `*` and `?`.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('*') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                // Backtrack: let the last star swallow one more character
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    star = Some((star_pi, star_ti + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}
