//! Per-invocation execution context
//!
//! A [`Context`] is created for every `perform` call. It carries the source
//! hint, the will-perform callback and the completion callback, and it is the
//! only way an asynchronous body reports its result.
//!
//! Completion fires exactly once. The first `complete`/`fail`/`cancel` wins and
//! later calls are ignored (UI timing races make double completion common, so
//! this is tolerated rather than treated as a crash). Completion always runs on
//! the UI thread: inline when signaled from it, queued otherwise.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::action::{Action, ExecutionShape};
use crate::error::ActionError;
use crate::middleware::{ActionRecord, Outcome};
use crate::presenter::{SourceHint, Surface};
use crate::runner::{ActionRunner, PerformRequest};
use crate::store::StoreHandle;

/// Callback receiving an invocation's result.
pub type Completion<T> = Box<dyn FnOnce(Result<T, ActionError>) + Send>;

/// Callback fired right before the body runs, for optimistic UI updates.
pub type WillPerform = Box<dyn FnOnce() + Send>;

/// Handle to one in-progress invocation.
///
/// Cheap to clone; clones share the same completion state.
pub struct Context<T> {
    inner: Arc<ContextInner<T>>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub(crate) struct ContextParts<T> {
    pub(crate) runner: ActionRunner,
    pub(crate) record: ActionRecord,
    pub(crate) source: Option<SourceHint>,
    pub(crate) commit_on_complete: bool,
    pub(crate) tracks_in_flight: bool,
    pub(crate) will_perform: Option<WillPerform>,
    pub(crate) completion: Option<Completion<T>>,
}

struct ContextInner<T> {
    runner: ActionRunner,
    record: ActionRecord,
    shape: OnceLock<ExecutionShape>,
    source: Option<SourceHint>,
    commit_on_complete: bool,
    tracks_in_flight: bool,
    completed: AtomicBool,
    will_perform: Mutex<Option<WillPerform>>,
    completion: Mutex<Option<Completion<T>>>,
}

impl<T: Send + 'static> Context<T> {
    pub(crate) fn new(parts: ContextParts<T>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                runner: parts.runner,
                record: parts.record,
                shape: OnceLock::new(),
                source: parts.source,
                commit_on_complete: parts.commit_on_complete,
                tracks_in_flight: parts.tracks_in_flight,
                completed: AtomicBool::new(false),
                will_perform: Mutex::new(parts.will_perform),
                completion: Mutex::new(parts.completion),
            }),
        }
    }

    /// Report success.
    pub fn complete(&self, value: T) {
        self.finish(Ok(value));
    }

    /// Report failure.
    pub fn fail(&self, error: ActionError) {
        self.finish(Err(error));
    }

    /// Report that the user backed out.
    pub fn cancel(&self) {
        self.finish(Err(ActionError::Canceled));
    }

    /// Report a result. Only the first call has an effect.
    pub fn finish(&self, result: Result<T, ActionError>) {
        self.finish_with(false, result);
    }

    /// Dismiss the presented surface, then report a result.
    pub fn complete_and_dismiss(&self, result: Result<T, ActionError>) {
        self.finish_with(true, result);
    }

    fn finish_with(&self, dismiss: bool, result: Result<T, ActionError>) {
        if self.inner.completed.swap(true, Ordering::SeqCst) {
            tracing::debug!(
                action = %self.inner.record.name,
                id = self.inner.record.id,
                "context already completed, ignoring"
            );
            return;
        }

        let inner = self.inner.clone();
        let runner = &self.inner.runner;
        runner
            .ui()
            .run_or_enqueue(runner.config().inline_completion, move || {
                if dismiss {
                    inner.dismiss();
                }
                inner.conclude(result);
            });
    }

    /// Ask the presenter to show a transient surface near the source hint.
    pub fn present(&self, surface: Surface) {
        let inner = self.inner.clone();
        let runner = &self.inner.runner;
        runner
            .ui()
            .run_or_enqueue(runner.config().inline_completion, move || {
                match inner.runner.presenter() {
                    Some(presenter) => presenter.present(surface, inner.source.as_ref()),
                    None => tracing::warn!(
                        action = %inner.record.name,
                        surface = surface.title(),
                        "no presenter attached, surface not shown"
                    ),
                }
            });
    }

    /// Start a chained action on the same runner, inheriting the source hint.
    pub fn request<B: Action>(&self, action: B) -> PerformRequest<B> {
        let request = self.inner.runner.request(action);
        match &self.inner.source {
            Some(source) => request.source(source.clone()),
            None => request,
        }
    }

    /// Perform a chained action on the same runner.
    pub fn perform<B: Action>(&self, action: B) {
        self.request(action).perform();
    }

    pub(crate) fn mark_started(&self, shape: ExecutionShape) {
        let _ = self.inner.shape.set(shape);
    }

    pub(crate) fn fire_will_perform(&self) {
        let will_perform = lock(&self.inner.will_perform).take();
        if let Some(will_perform) = will_perform {
            will_perform();
        }
    }
}

impl<T> Context<T> {
    /// The runner's store.
    pub fn store(&self) -> &StoreHandle {
        self.inner.runner.store()
    }

    /// The runner executing this invocation.
    pub fn runner(&self) -> &ActionRunner {
        &self.inner.runner
    }

    /// Positioning hint from the trigger.
    pub fn source(&self) -> Option<&SourceHint> {
        self.inner.source.as_ref()
    }

    /// Name of the action being performed.
    pub fn action_name(&self) -> &'static str {
        self.inner.record.name
    }

    /// Invocation id.
    pub fn id(&self) -> u64 {
        self.inner.record.id
    }

    /// Whether a result has already been reported.
    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::SeqCst)
    }

    /// Record of this invocation, including the shape once the body started.
    pub fn record(&self) -> ActionRecord {
        self.inner.record()
    }
}

impl<T> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("action", &self.inner.record.name)
            .field("id", &self.inner.record.id)
            .field("source", &self.inner.source)
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl<T> ContextInner<T> {
    fn record(&self) -> ActionRecord {
        let mut record = self.record.clone();
        if let Some(shape) = self.shape.get() {
            record.capabilities |= shape.capability();
        }
        record
    }

    fn dismiss(&self) {
        if let Some(presenter) = self.runner.presenter() {
            presenter.dismiss();
        }
    }

    /// Runs on the UI thread, exactly once per invocation.
    fn conclude(&self, result: Result<T, ActionError>) {
        let record = self.record();
        if self.tracks_in_flight {
            self.runner.release_in_flight(record.name);
        }

        let result = match result {
            Ok(value) if self.commit_on_complete => {
                self.runner.commit(&record).map(|()| value)
            }
            other => other,
        };

        match &result {
            Ok(_) => self.runner.notify_after(&record, &Outcome::Succeeded),
            Err(ActionError::Canceled) => {
                tracing::debug!(action = %record.name, id = record.id, "action canceled");
                self.runner.notify_after(&record, &Outcome::Canceled);
            }
            Err(error) => {
                match self.runner.presenter() {
                    Some(presenter) => presenter.present_error(error),
                    None => tracing::warn!(
                        action = %record.name,
                        error = %error,
                        "no presenter attached, error not shown"
                    ),
                }
                self.runner
                    .notify_after(&record, &Outcome::Failed(error.to_string()));
            }
        }

        let completion = lock(&self.completion).take();
        if let Some(completion) = completion {
            completion(result);
        }
    }
}

impl<T> Drop for ContextInner<T> {
    fn drop(&mut self) {
        if *self.completed.get_mut() {
            return;
        }
        if self.tracks_in_flight {
            self.runner.release_in_flight(self.record.name);
        }
        if self.shape.get().is_some() {
            tracing::warn!(
                action = %self.record.name,
                id = self.record.id,
                "context dropped without completing"
            );
        }
    }
}

fn lock<V>(mutex: &Mutex<V>) -> std::sync::MutexGuard<'_, V> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
