//! Test utilities for floss-actions applications
//!
//! - [`MemoryStore`]: in-memory store counting commits, with scripted failures
//! - [`ScriptedPresenter`]: answers confirmations from a script and records
//!   everything it was asked to show
//! - [`RecordingUndo`] and [`RecordingMiddleware`]: capture undo labels and outcomes
//! - [`CompletionProbe`]: completion callback that stores what it receives
//! - [`TestHarness`]: all of the above wired into a runner on the current thread
//! - Assertion macros for completions
//!
//! # Example
//!
//! ```ignore
//! use floss_actions::testing::{Answer, TestHarness};
//!
//! let mut harness = TestHarness::new(Answer::Decline);
//! let probe = harness.perform(DeleteThread::new(harness.store.clone(), 3));
//!
//! assert_outcome!(probe, Err(ActionError::Canceled));
//! assert_eq!(harness.store.commit_count(), 0);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::action::{Action, Confirmation};
use crate::config::RunnerConfig;
use crate::error::{ActionError, StoreError};
use crate::middleware::{ActionRecord, Middleware, Outcome};
use crate::presenter::{ConfirmationRequest, Presenter, SourceHint, Surface};
use crate::runner::ActionRunner;
use crate::store::{PersistentStore, UndoHistory};
use crate::ui::UiQueue;

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ============================================================================
// Store
// ============================================================================

/// In-memory store recording writes and counting commits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<String>>,
    dirty: AtomicBool,
    commits: AtomicUsize,
    fail_next_commit: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an in-memory mutation.
    pub fn write(&self, entry: impl Into<String>) {
        lock(&self.entries).push(entry.into());
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Remove the first entry equal to `entry`. Returns whether one was found.
    pub fn remove(&self, entry: &str) -> bool {
        let mut entries = lock(&self.entries);
        match entries.iter().position(|e| e == entry) {
            Some(index) => {
                entries.remove(index);
                self.dirty.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Snapshot of every entry written so far.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        lock(&self.entries).iter().any(|e| e == entry)
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Make the next commit fail with `message`.
    pub fn fail_next_commit(&self, message: impl Into<String>) {
        *lock(&self.fail_next_commit) = Some(message.into());
    }
}

impl PersistentStore for MemoryStore {
    fn commit(&self) -> Result<(), StoreError> {
        if let Some(message) = lock(&self.fail_next_commit).take() {
            return Err(StoreError::new(message));
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn has_changes(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Presenter
// ============================================================================

/// How a [`ScriptedPresenter`] answers confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Confirm,
    Decline,
    /// Keep the request until [`ScriptedPresenter::resolve_pending`].
    Hold,
}

/// Presenter that follows a script instead of asking a user.
pub struct ScriptedPresenter {
    answer: Mutex<Answer>,
    confirmations: Mutex<Vec<Confirmation>>,
    pending: Mutex<Vec<ConfirmationRequest>>,
    surfaces: Mutex<Vec<(String, Option<SourceHint>)>>,
    errors: Mutex<Vec<String>>,
    dismissals: AtomicUsize,
}

impl ScriptedPresenter {
    pub fn new(answer: Answer) -> Self {
        Self {
            answer: Mutex::new(answer),
            confirmations: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            surfaces: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            dismissals: AtomicUsize::new(0),
        }
    }

    /// Change how future confirmations are answered.
    pub fn set_answer(&self, answer: Answer) {
        *lock(&self.answer) = answer;
    }

    /// Confirmation strings shown so far.
    pub fn confirmations(&self) -> Vec<Confirmation> {
        lock(&self.confirmations).clone()
    }

    /// Number of held confirmation requests.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Answer every held request. Returns how many were answered.
    pub fn resolve_pending(&self, confirmed: bool) -> usize {
        let pending: Vec<_> = lock(&self.pending).drain(..).collect();
        let count = pending.len();
        for request in pending {
            request.respond(confirmed);
        }
        count
    }

    /// Titles of presented surfaces.
    pub fn surfaces(&self) -> Vec<String> {
        lock(&self.surfaces)
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }

    /// Source hints that came with presented surfaces.
    pub fn surface_sources(&self) -> Vec<Option<SourceHint>> {
        lock(&self.surfaces)
            .iter()
            .map(|(_, source)| source.clone())
            .collect()
    }

    /// Descriptions of alerted errors.
    pub fn errors(&self) -> Vec<String> {
        lock(&self.errors).clone()
    }

    pub fn dismiss_count(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }
}

impl Presenter for ScriptedPresenter {
    fn confirm(&self, request: ConfirmationRequest) {
        lock(&self.confirmations).push(request.confirmation().clone());
        let answer = *lock(&self.answer);
        match answer {
            Answer::Confirm => request.confirm(),
            Answer::Decline => request.decline(),
            Answer::Hold => lock(&self.pending).push(request),
        }
    }

    fn present(&self, surface: Surface, source: Option<&SourceHint>) {
        lock(&self.surfaces).push((surface.title().to_string(), source.cloned()));
    }

    fn dismiss(&self) {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
    }

    fn present_error(&self, error: &ActionError) {
        lock(&self.errors).push(error.to_string());
    }
}

impl fmt::Debug for ScriptedPresenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedPresenter")
            .field("answer", &*lock(&self.answer))
            .field("pending", &self.pending_count())
            .field("errors", &self.errors())
            .finish()
    }
}

// ============================================================================
// Undo and middleware
// ============================================================================

/// Undo history that records every group label.
#[derive(Debug, Default)]
pub struct RecordingUndo {
    names: Mutex<Vec<String>>,
}

impl RecordingUndo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.names).clone()
    }
}

impl UndoHistory for RecordingUndo {
    fn set_action_name(&self, name: &str) {
        lock(&self.names).push(name.to_string());
    }
}

/// Middleware that records `(name, outcome)` pairs.
#[derive(Debug, Default)]
pub struct RecordingMiddleware {
    started: Mutex<Vec<&'static str>>,
    outcomes: Mutex<Vec<(&'static str, Outcome)>>,
}

impl RecordingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names seen by `before`, in order.
    pub fn started(&self) -> Vec<&'static str> {
        lock(&self.started).clone()
    }

    /// Outcomes seen by `after`, in order.
    pub fn outcomes(&self) -> Vec<(&'static str, Outcome)> {
        lock(&self.outcomes).clone()
    }

    /// Outcomes for one action name.
    pub fn outcomes_for(&self, name: &str) -> Vec<Outcome> {
        lock(&self.outcomes)
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, outcome)| outcome.clone())
            .collect()
    }
}

impl Middleware for RecordingMiddleware {
    fn before(&self, record: &ActionRecord) {
        lock(&self.started).push(record.name);
    }

    fn after(&self, record: &ActionRecord, outcome: &Outcome) {
        lock(&self.outcomes).push((record.name, outcome.clone()));
    }
}

// ============================================================================
// Completion probe
// ============================================================================

/// Completion callback that stores every result it receives.
pub struct CompletionProbe<T> {
    results: Arc<Mutex<Vec<Result<T, ActionError>>>>,
}

impl<T> Clone for CompletionProbe<T> {
    fn clone(&self) -> Self {
        Self {
            results: self.results.clone(),
        }
    }
}

impl<T: Send + 'static> CompletionProbe<T> {
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback to pass to `on_complete`.
    pub fn callback(&self) -> impl FnOnce(Result<T, ActionError>) + Send + 'static {
        let results = self.results.clone();
        move |result| lock(&results).push(result)
    }

    /// How many times the callback fired.
    pub fn calls(&self) -> usize {
        lock(&self.results).len()
    }

    /// Whether nothing was reported yet.
    pub fn is_pending(&self) -> bool {
        self.calls() == 0
    }

    /// Take the first reported result.
    pub fn take(&self) -> Option<Result<T, ActionError>> {
        let mut results = lock(&self.results);
        if results.is_empty() {
            None
        } else {
            Some(results.remove(0))
        }
    }
}

impl<T: Send + 'static> Default for CompletionProbe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CompletionProbe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionProbe")
            .field("calls", &lock(&self.results).len())
            .finish()
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A runner wired to test doubles, with the calling thread as UI thread.
///
/// Reactive actions need a tokio runtime; construct the harness inside
/// `#[tokio::test]` for those.
pub struct TestHarness {
    pub ui: UiQueue,
    pub store: Arc<MemoryStore>,
    pub presenter: Arc<ScriptedPresenter>,
    pub undo: Arc<RecordingUndo>,
    pub middleware: Arc<RecordingMiddleware>,
    pub runner: ActionRunner,
}

impl TestHarness {
    /// Harness whose presenter answers confirmations with `answer`.
    pub fn new(answer: Answer) -> Self {
        Self::with_config(answer, RunnerConfig::default())
    }

    pub fn with_config(answer: Answer, config: RunnerConfig) -> Self {
        let ui = UiQueue::new();
        let store = Arc::new(MemoryStore::new());
        let presenter = Arc::new(ScriptedPresenter::new(answer));
        let undo = Arc::new(RecordingUndo::new());
        let middleware = Arc::new(RecordingMiddleware::new());

        let runner = ActionRunner::builder(store.clone(), ui.handle())
            .presenter(presenter.clone())
            .undo_history(undo.clone())
            .middleware(middleware.clone())
            .config(config)
            .build();

        Self {
            ui,
            store,
            presenter,
            undo,
            middleware,
            runner,
        }
    }

    /// Perform `action` and return a probe for its completion.
    pub fn perform<A: Action>(&self, action: A) -> CompletionProbe<A::Output> {
        let probe = CompletionProbe::new();
        self.runner
            .request(action)
            .on_complete(probe.callback())
            .perform();
        probe
    }

    /// Run every queued UI job.
    pub fn drain(&mut self) -> usize {
        self.ui.drain()
    }
}

impl fmt::Debug for TestHarness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestHarness")
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}

/// Assert that a probe received a completion matching a pattern.
///
/// Consumes the first recorded result.
///
/// # Example
///
/// ```ignore
/// assert_outcome!(probe, Ok(()));
/// assert_outcome!(probe, Err(ActionError::Canceled));
/// assert_outcome!(probe, Err(e) if e.to_string().contains("out of skeins"));
/// ```
#[macro_export]
macro_rules! assert_outcome {
    ($probe:expr, $pattern:pat $(if $guard:expr)?) => {
        match $probe.take() {
            Some(result) => assert!(
                matches!(&result, $pattern $(if $guard)?),
                "Expected completion matching `{}`, but got: {:?}",
                stringify!($pattern),
                result
            ),
            None => panic!(
                "Expected completion matching `{}`, but none was reported",
                stringify!($pattern)
            ),
        }
    };
}

/// Assert that a probe has not received any completion.
#[macro_export]
macro_rules! assert_pending {
    ($probe:expr) => {
        assert!(
            $probe.is_pending(),
            "Expected no completion yet, but {} were reported",
            $probe.calls()
        );
    };
}

// ============================================================================
// Time control (requires testing-time feature)
// ============================================================================

/// Pause tokio time so delayed async bodies can be stepped deterministically.
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

/// Resume real time.
#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Advance paused time by `duration`, letting timers fire.
#[cfg(feature = "testing-time")]
pub async fn advance_time(duration: std::time::Duration) {
    tokio::time::advance(duration).await;
}
