//! The action runner
//!
//! [`ActionRunner`] is the single entry point for performing actions. For each
//! invocation it:
//!
//! 1. moves to the UI thread if called from elsewhere;
//! 2. builds a [`Context`] and notifies middleware;
//! 3. silently drops the invocation if `can_perform` is false;
//! 4. asks the presenter for confirmation if the action is destructive, then
//!    re-checks `can_perform`;
//! 5. labels the undo group, fires `will_perform` and runs the body;
//! 6. on success commits the store (when eligible), then reports the result.
//!
//! Failures other than cancellation are shown through the presenter.
//! Cancellation is only logged.
//!
//! # Example
//!
//! ```ignore
//! let mut ui = UiQueue::new();
//! let runner = ActionRunner::builder(catalog.clone(), ui.handle())
//!     .presenter(presenter)
//!     .undo_history(undo)
//!     .build();
//!
//! runner
//!     .request(DeleteThread::new(catalog.clone(), id))
//!     .source(SourceHint::named("thread-list"))
//!     .on_complete(|result| tracing::info!(?result, "delete finished"))
//!     .perform();
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;

use crate::action::{Action, ActionBody, Capabilities};
use crate::action_log::ActionLoggerMiddleware;
use crate::config::RunnerConfig;
use crate::context::{Completion, Context, ContextParts, WillPerform};
use crate::error::ActionError;
use crate::middleware::{ActionRecord, ComposedMiddleware, LoggingMiddleware, Middleware, Outcome};
use crate::presenter::{ConfirmationRequest, Presenter, SourceHint};
use crate::store::{StoreHandle, UndoHistory};
use crate::subscriptions::Subscriptions;
use crate::ui::UiHandle;

/// Executes actions against one store, presenter and undo history.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct ActionRunner {
    inner: Arc<RunnerInner>,
}

struct RunnerInner {
    store: StoreHandle,
    ui: UiHandle,
    presenter: Option<Arc<dyn Presenter>>,
    undo: Option<Arc<dyn UndoHistory>>,
    middleware: ComposedMiddleware,
    action_log: Option<Arc<ActionLoggerMiddleware>>,
    runtime: Option<Handle>,
    config: RunnerConfig,
    next_id: AtomicU64,
    in_flight: Mutex<HashSet<&'static str>>,
    subscriptions: Subscriptions,
}

impl ActionRunner {
    /// Start building a runner for `store` whose UI thread is `ui`'s.
    pub fn builder(store: impl Into<StoreHandle>, ui: UiHandle) -> RunnerBuilder {
        RunnerBuilder {
            store: store.into(),
            ui,
            presenter: None,
            undo: None,
            middleware: ComposedMiddleware::new(),
            runtime: None,
            config: RunnerConfig::default(),
        }
    }

    /// Perform an action with no source hint and no callbacks.
    pub fn perform<A: Action>(&self, action: A) {
        self.request(action).perform();
    }

    /// Prepare an invocation with optional source hint and callbacks.
    pub fn request<A: Action>(&self, action: A) -> PerformRequest<A> {
        PerformRequest {
            runner: self.clone(),
            action,
            source: None,
            will_perform: None,
            completion: None,
        }
    }

    /// The store every action mutates.
    pub fn store(&self) -> &StoreHandle {
        &self.inner.store
    }

    /// Handle to the UI thread.
    pub fn ui(&self) -> &UiHandle {
        &self.inner.ui
    }

    /// The injected presenter, if any.
    pub fn presenter(&self) -> Option<&Arc<dyn Presenter>> {
        self.inner.presenter.as_ref()
    }

    /// The injected undo history, if any.
    pub fn undo_history(&self) -> Option<&Arc<dyn UndoHistory>> {
        self.inner.undo.as_ref()
    }

    /// Active configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.inner.config
    }

    /// The in-memory action log, when enabled in the config.
    pub fn action_log(&self) -> Option<&Arc<ActionLoggerMiddleware>> {
        self.inner.action_log.as_ref()
    }

    /// Whether an action with this name is in flight.
    ///
    /// Only tracked when `dedupe_in_flight` is enabled.
    pub fn is_in_flight(&self, name: &str) -> bool {
        lock(&self.inner.in_flight).contains(name)
    }

    /// Reactive subscriptions still waiting for a value.
    pub fn subscriptions(&self) -> &Subscriptions {
        &self.inner.subscriptions
    }

    /// Cancel every live reactive subscription.
    pub fn shutdown(&self) {
        tracing::debug!(
            live = self.inner.subscriptions.len(),
            "shutting down action runner"
        );
        self.inner.subscriptions.cancel_all();
    }

    fn dispatch<A: Action>(&self, request: PerformRequest<A>) {
        if !self.inner.ui.is_current() {
            let runner = self.clone();
            self.inner.ui.enqueue(move || runner.dispatch(request));
            return;
        }

        let PerformRequest {
            action,
            source,
            will_perform,
            completion,
            ..
        } = request;

        let record = ActionRecord {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            name: action.name(),
            capabilities: Capabilities::from_meta(&action),
        };

        let dedupe = self.inner.config.dedupe_in_flight;
        if dedupe && !lock(&self.inner.in_flight).insert(record.name) {
            tracing::debug!(action = %record.name, "already in flight, dropping");
            self.inner.middleware.before(&record);
            self.notify_after(&record, &Outcome::Deduplicated);
            return;
        }

        self.inner.middleware.before(&record);

        let ctx = Context::new(ContextParts {
            runner: self.clone(),
            record,
            source,
            commit_on_complete: action.commit_on_complete(),
            tracks_in_flight: dedupe,
            will_perform,
            completion,
        });

        if !action.can_perform() {
            self.skip(&ctx);
            return;
        }

        let Some(confirmation) = action.confirmation() else {
            self.execute(action, ctx);
            return;
        };

        let Some(presenter) = self.inner.presenter.clone() else {
            tracing::warn!(
                action = %ctx.action_name(),
                "destructive action without a presenter, canceling"
            );
            ctx.cancel();
            return;
        };

        let runner = self.clone();
        let name = ctx.action_name();
        let source = ctx.source().cloned();
        let request = ConfirmationRequest::new(name, confirmation, source, move |confirmed| {
            let inline = runner.inner.config.inline_completion;
            let ui = runner.inner.ui.clone();
            ui.run_or_enqueue(inline, move || {
                if confirmed {
                    runner.execute(action, ctx);
                } else {
                    tracing::debug!(action = %ctx.action_name(), "confirmation declined");
                    ctx.cancel();
                }
            });
        });
        presenter.confirm(request);
    }

    fn execute<A: Action>(&self, action: A, ctx: Context<A::Output>) {
        // State may have changed while the confirmation was open.
        if !action.can_perform() {
            self.skip(&ctx);
            return;
        }

        if let (Some(label), Some(undo)) = (action.undo_name(), self.inner.undo.as_ref()) {
            undo.set_action_name(&label);
        }

        let body = action.into_body();
        ctx.mark_started(body.shape());
        ctx.fire_will_perform();

        match body {
            ActionBody::Sync(body) => {
                let result = body(&self.inner.store);
                ctx.finish(result);
            }
            ActionBody::Async(body) => body(ctx),
            ActionBody::Reactive(body) => {
                let stream = body(&self.inner.store);
                match &self.inner.runtime {
                    Some(runtime) => self.inner.subscriptions.subscribe(runtime, ctx, stream),
                    None => {
                        tracing::error!(
                            action = %ctx.action_name(),
                            "reactive action needs a tokio runtime"
                        );
                        ctx.fail(ActionError::NoRuntime);
                    }
                }
            }
        }
    }

    fn skip<T>(&self, ctx: &Context<T>) {
        tracing::debug!(action = %ctx.action_name(), "can_perform is false, skipping");
        self.notify_after(&ctx.record(), &Outcome::Skipped);
    }

    pub(crate) fn commit(&self, record: &ActionRecord) -> Result<(), ActionError> {
        tracing::trace!(
            action = %record.name,
            pending = self.inner.store.has_changes(),
            "committing store"
        );
        self.inner.store.commit().map_err(|e| {
            tracing::error!(action = %record.name, error = %e, "store commit failed");
            ActionError::Commit(e)
        })
    }

    pub(crate) fn notify_after(&self, record: &ActionRecord, outcome: &Outcome) {
        self.inner.middleware.after(record, outcome);
    }

    pub(crate) fn release_in_flight(&self, name: &'static str) {
        lock(&self.inner.in_flight).remove(name);
    }
}

impl fmt::Debug for ActionRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRunner")
            .field("store", &self.inner.store)
            .field("has_presenter", &self.inner.presenter.is_some())
            .field("has_undo", &self.inner.undo.is_some())
            .field("middleware", &self.inner.middleware)
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Builder for [`ActionRunner`].
pub struct RunnerBuilder {
    store: StoreHandle,
    ui: UiHandle,
    presenter: Option<Arc<dyn Presenter>>,
    undo: Option<Arc<dyn UndoHistory>>,
    middleware: ComposedMiddleware,
    runtime: Option<Handle>,
    config: RunnerConfig,
}

impl RunnerBuilder {
    /// UI layer for confirmations, surfaces and error alerts.
    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Undo history that receives group labels.
    pub fn undo_history(mut self, undo: Arc<dyn UndoHistory>) -> Self {
        self.undo = Some(undo);
        self
    }

    /// Add a middleware. Hooks run in insertion order (after-hooks reversed).
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.add(middleware);
        self
    }

    /// Runtime for reactive subscriptions. Defaults to the current runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Behavior switches, usually loaded with [`RunnerConfig::from_path`].
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Install the configured middleware and create the runner.
    pub fn build(self) -> ActionRunner {
        let RunnerBuilder {
            store,
            ui,
            presenter,
            undo,
            mut middleware,
            runtime,
            config,
        } = self;

        let action_log = config.log.build().map(Arc::new);
        if let Some(log) = &action_log {
            middleware.add(log.clone());
        }
        if config.trace {
            middleware.add(LoggingMiddleware::new());
        }

        let runtime = runtime.or_else(|| Handle::try_current().ok());
        if runtime.is_none() {
            tracing::debug!("no tokio runtime, reactive actions will fail");
        }

        ActionRunner {
            inner: Arc::new(RunnerInner {
                store,
                ui,
                presenter,
                undo,
                middleware,
                action_log,
                runtime,
                config,
                next_id: AtomicU64::new(1),
                in_flight: Mutex::new(HashSet::new()),
                subscriptions: Subscriptions::new(),
            }),
        }
    }
}

/// One invocation being prepared. Call [`perform`](Self::perform) to run it.
#[must_use = "a request does nothing until `perform` is called"]
pub struct PerformRequest<A: Action> {
    runner: ActionRunner,
    action: A,
    source: Option<SourceHint>,
    will_perform: Option<WillPerform>,
    completion: Option<Completion<A::Output>>,
}

impl<A: Action> PerformRequest<A> {
    /// Where the trigger lives on screen.
    pub fn source(mut self, source: SourceHint) -> Self {
        self.source = Some(source);
        self
    }

    /// Runs right before the body, after confirmation and `can_perform`.
    pub fn will_perform(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.will_perform = Some(Box::new(f));
        self
    }

    /// Receives the result on the UI thread, exactly once.
    pub fn on_complete(
        mut self,
        f: impl FnOnce(Result<A::Output, ActionError>) + Send + 'static,
    ) -> Self {
        self.completion = Some(Box::new(f));
        self
    }

    /// Hand the invocation to the runner.
    pub fn perform(self) {
        let runner = self.runner.clone();
        runner.dispatch(self);
    }
}

impl<A: Action> fmt::Debug for PerformRequest<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformRequest")
            .field("action", &self.action.name())
            .field("source", &self.source)
            .field("will_perform", &self.will_perform.is_some())
            .field("on_complete", &self.completion.is_some())
            .finish()
    }
}

fn lock<'a, V>(mutex: &'a Mutex<V>) -> MutexGuard<'a, V> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionMeta, Confirmation};
    use crate::presenter::Surface;
    use crate::testing::{Answer, CompletionProbe, MemoryStore, TestHarness};
    use crate::ui::UiQueue;
    use crate::{assert_outcome, assert_pending};
    use std::borrow::Cow;
    use std::sync::atomic::AtomicBool;

    #[derive(Clone)]
    struct Record {
        store: Arc<MemoryStore>,
        entry: &'static str,
        allowed: Arc<AtomicBool>,
    }

    impl Record {
        fn new(store: &Arc<MemoryStore>, entry: &'static str) -> Self {
            Self {
                store: store.clone(),
                entry,
                allowed: Arc::new(AtomicBool::new(true)),
            }
        }
    }

    impl ActionMeta for Record {
        fn name(&self) -> &'static str {
            "Record"
        }

        fn undo_name(&self) -> Option<Cow<'static, str>> {
            Some("Record Entry".into())
        }
    }

    impl Action for Record {
        type Output = usize;

        fn can_perform(&self) -> bool {
            self.allowed.load(Ordering::SeqCst)
        }

        fn into_body(self) -> ActionBody<usize> {
            ActionBody::sync(move |_| {
                self.store.write(self.entry);
                Ok(self.store.entries().len())
            })
        }
    }

    type Slot = Arc<Mutex<Option<Context<u32>>>>;

    /// Async action that parks its context for the test to complete.
    struct Park {
        slot: Slot,
        commit: bool,
    }

    impl Park {
        fn new(slot: &Slot) -> Self {
            Self {
                slot: slot.clone(),
                commit: true,
            }
        }
    }

    impl ActionMeta for Park {
        fn name(&self) -> &'static str {
            "Park"
        }

        fn commit_on_complete(&self) -> bool {
            self.commit
        }
    }

    impl Action for Park {
        type Output = u32;

        fn into_body(self) -> ActionBody<u32> {
            ActionBody::asynchronous(move |ctx| {
                *self.slot.lock().unwrap() = Some(ctx);
            })
        }
    }

    fn parked(slot: &Slot) -> Context<u32> {
        slot.lock().unwrap().take().expect("body did not run")
    }

    struct Feed<S> {
        stream: S,
    }

    impl<S> ActionMeta for Feed<S> {
        fn name(&self) -> &'static str {
            "Feed"
        }
    }

    impl<S> Action for Feed<S>
    where
        S: tokio_stream::Stream<Item = Result<u32, ActionError>> + Send + 'static,
    {
        type Output = u32;

        fn into_body(self) -> ActionBody<u32> {
            ActionBody::reactive(move |_| self.stream)
        }
    }

    async fn settle(harness: &mut TestHarness) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
            harness.drain();
        }
    }

    #[test]
    fn test_sync_completes_before_perform_returns() {
        let harness = TestHarness::new(Answer::Confirm);
        let probe = harness.perform(Record::new(&harness.store, "DMC 310"));

        assert_outcome!(probe, Ok(1));
        assert_eq!(harness.store.commit_count(), 1);
        assert_eq!(harness.undo.names(), vec!["Record Entry"]);
        assert_eq!(
            harness.middleware.outcomes(),
            vec![("Record", Outcome::Succeeded)]
        );
    }

    #[test]
    fn test_will_perform_runs_right_before_body() {
        let harness = TestHarness::new(Answer::Confirm);
        let store = harness.store.clone();
        let seen = Arc::new(Mutex::new(None));

        let s = seen.clone();
        harness
            .runner
            .request(Record::new(&harness.store, "DMC 321"))
            .will_perform(move || *s.lock().unwrap() = Some(store.entries().len()))
            .perform();

        assert_eq!(*seen.lock().unwrap(), Some(0));
        assert!(harness.store.contains("DMC 321"));
    }

    #[test]
    fn test_perform_off_ui_thread_is_marshalled() {
        let mut harness = TestHarness::new(Answer::Confirm);
        let probe = CompletionProbe::new();

        let runner = harness.runner.clone();
        let action = Record::new(&harness.store, "DMC 700");
        let callback = probe.callback();
        std::thread::spawn(move || runner.request(action).on_complete(callback).perform())
            .join()
            .unwrap();

        assert_pending!(probe);
        assert!(harness.store.entries().is_empty());

        assert_eq!(harness.drain(), 1);
        assert_outcome!(probe, Ok(1));
    }

    #[test]
    fn test_async_completion_from_worker_thread() {
        let mut harness = TestHarness::new(Answer::Confirm);
        let slot = Slot::default();
        let probe = harness.perform(Park::new(&slot));

        let ctx = parked(&slot);
        assert_pending!(probe);
        std::thread::spawn(move || ctx.complete(9)).join().unwrap();

        assert_pending!(probe);
        harness.drain();
        assert_outcome!(probe, Ok(9));
        assert_eq!(harness.store.commit_count(), 1);
    }

    #[test]
    fn test_second_completion_is_ignored() {
        let harness = TestHarness::new(Answer::Confirm);
        let slot = Slot::default();
        let probe = harness.perform(Park::new(&slot));

        let ctx = parked(&slot);
        ctx.complete(1);
        assert!(ctx.is_completed());
        ctx.complete(2);
        ctx.fail(ActionError::msg("late"));
        ctx.cancel();

        assert_eq!(probe.calls(), 1);
        assert_outcome!(probe, Ok(1));
        assert_eq!(harness.store.commit_count(), 1);
        assert!(harness.presenter.errors().is_empty());
    }

    #[test]
    fn test_no_commit_when_not_eligible() {
        let harness = TestHarness::new(Answer::Confirm);
        let slot = Slot::default();
        let mut action = Park::new(&slot);
        action.commit = false;
        let probe = harness.perform(action);

        parked(&slot).complete(4);
        assert_outcome!(probe, Ok(4));
        assert_eq!(harness.store.commit_count(), 0);
    }

    #[test]
    fn test_inline_completion_disabled_queues_result() {
        let config = RunnerConfig::default().with_inline_completion(false);
        let mut harness = TestHarness::with_config(Answer::Confirm, config);
        let probe = harness.perform(Record::new(&harness.store, "DMC 310"));

        assert_pending!(probe);
        assert!(harness.store.contains("DMC 310"));
        assert_eq!(harness.store.commit_count(), 0);

        harness.drain();
        assert_outcome!(probe, Ok(1));
        assert_eq!(harness.store.commit_count(), 1);
    }

    #[test]
    fn test_commit_failure_is_reported() {
        let harness = TestHarness::new(Answer::Confirm);
        harness.store.fail_next_commit("disk full");
        let probe = harness.perform(Record::new(&harness.store, "DMC 310"));

        assert_outcome!(probe, Err(ActionError::Commit(_)));
        assert_eq!(harness.presenter.errors(), vec!["Could not save changes: disk full"]);
        assert!(matches!(
            harness.middleware.outcomes_for("Record").as_slice(),
            [Outcome::Failed(_)]
        ));
    }

    #[test]
    fn test_skipped_when_not_allowed() {
        let harness = TestHarness::new(Answer::Confirm);
        let action = Record::new(&harness.store, "DMC 310");
        action.allowed.store(false, Ordering::SeqCst);
        let probe = harness.perform(action);

        assert_pending!(probe);
        assert!(harness.store.entries().is_empty());
        assert!(harness.undo.names().is_empty());
        assert_eq!(
            harness.middleware.outcomes_for("Record"),
            vec![Outcome::Skipped]
        );
    }

    /// Destructive wrapper around [`Record`].
    #[derive(Clone)]
    struct Guarded(Record);

    impl ActionMeta for Guarded {
        fn name(&self) -> &'static str {
            "Guarded"
        }

        fn confirmation(&self) -> Option<Confirmation> {
            Some(Confirmation::new("Delete Thread", "Are you sure?", "Delete"))
        }
    }

    impl Action for Guarded {
        type Output = usize;

        fn can_perform(&self) -> bool {
            self.0.can_perform()
        }

        fn into_body(self) -> ActionBody<usize> {
            self.0.into_body()
        }
    }

    #[test]
    fn test_not_allowed_before_confirmation_skips_prompt() {
        let harness = TestHarness::new(Answer::Confirm);
        let action = Record::new(&harness.store, "DMC 310");
        action.allowed.store(false, Ordering::SeqCst);
        let completion = harness.perform(Guarded(action));

        assert_pending!(completion);
        assert!(harness.presenter.confirmations().is_empty());
        assert_eq!(
            harness.middleware.outcomes_for("Guarded"),
            vec![Outcome::Skipped]
        );
    }

    #[test]
    fn test_rechecked_after_confirmation() {
        let harness = TestHarness::new(Answer::Hold);
        let action = Record::new(&harness.store, "DMC 310");
        let allowed = action.allowed.clone();
        let completion = harness.perform(Guarded(action));
        assert_eq!(harness.presenter.pending_count(), 1);

        allowed.store(false, Ordering::SeqCst);
        harness.presenter.resolve_pending(true);

        assert_pending!(completion);
        assert!(harness.store.entries().is_empty());
        assert!(harness.undo.names().is_empty());
        assert_eq!(harness.store.commit_count(), 0);
        assert_eq!(
            harness.middleware.outcomes_for("Guarded"),
            vec![Outcome::Skipped]
        );
    }

    #[test]
    fn test_dedupe_drops_second_invocation() {
        let config = RunnerConfig::default().with_dedupe(true);
        let harness = TestHarness::with_config(Answer::Confirm, config);
        let slot = Slot::default();

        let first = harness.perform(Park::new(&slot));
        let ctx = parked(&slot);
        assert!(harness.runner.is_in_flight("Park"));

        let second = harness.perform(Park::new(&slot));
        assert!(slot.lock().unwrap().is_none());
        assert_pending!(second);

        ctx.complete(1);
        assert_outcome!(first, Ok(1));
        assert!(!harness.runner.is_in_flight("Park"));
        assert_eq!(
            harness.middleware.outcomes_for("Park"),
            vec![Outcome::Deduplicated, Outcome::Succeeded]
        );

        let third = harness.perform(Park::new(&slot));
        parked(&slot).complete(3);
        assert_outcome!(third, Ok(3));
    }

    #[test]
    fn test_dropped_context_releases_in_flight() {
        let config = RunnerConfig::default().with_dedupe(true);
        let harness = TestHarness::with_config(Answer::Confirm, config);
        let slot = Slot::default();

        let probe = harness.perform(Park::new(&slot));
        drop(parked(&slot));

        assert_pending!(probe);
        assert!(!harness.runner.is_in_flight("Park"));
    }

    #[test]
    fn test_present_and_dismiss_use_source_hint() {
        let harness = TestHarness::new(Answer::Confirm);
        let slot = Slot::default();
        let probe = CompletionProbe::new();

        harness
            .runner
            .request(Park::new(&slot))
            .source(SourceHint::named("thread-row:4"))
            .on_complete(probe.callback())
            .perform();

        let ctx = parked(&slot);
        ctx.present(Surface::new("Pick a project", ()));
        assert_eq!(harness.presenter.surfaces(), vec!["Pick a project"]);
        assert_eq!(
            harness.presenter.surface_sources(),
            vec![Some(SourceHint::named("thread-row:4"))]
        );

        ctx.complete_and_dismiss(Err(ActionError::Canceled));
        assert_eq!(harness.presenter.dismiss_count(), 1);
        assert_outcome!(probe, Err(ActionError::Canceled));
        assert!(harness.presenter.errors().is_empty());
    }

    #[derive(Clone)]
    struct Purge;

    impl ActionMeta for Purge {
        fn name(&self) -> &'static str {
            "Purge"
        }

        fn confirmation(&self) -> Option<Confirmation> {
            Some(Confirmation::new("Purge", "Remove all threads?", "Purge"))
        }
    }

    impl Action for Purge {
        type Output = ();

        fn into_body(self) -> ActionBody<()> {
            ActionBody::sync(|_| Err(ActionError::msg("body must not run")))
        }
    }

    #[test]
    fn test_destructive_without_presenter_cancels() {
        let ui = UiQueue::new();
        let store = Arc::new(MemoryStore::new());
        let runner = ActionRunner::builder(store.clone(), ui.handle()).build();
        let probe = CompletionProbe::new();

        runner.request(Purge).on_complete(probe.callback()).perform();

        assert_outcome!(probe, Err(ActionError::Canceled));
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn test_reactive_without_runtime_fails() {
        let harness = TestHarness::new(Answer::Confirm);
        let probe = harness.perform(Feed {
            stream: tokio_stream::iter(vec![Ok(1)]),
        });

        assert_outcome!(probe, Err(ActionError::NoRuntime));
        assert_eq!(harness.presenter.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_reactive_uses_first_value_only() {
        let mut harness = TestHarness::new(Answer::Confirm);
        let probe = harness.perform(Feed {
            stream: tokio_stream::iter(vec![Ok(5), Ok(6), Err(ActionError::msg("never seen"))]),
        });

        settle(&mut harness).await;

        assert_outcome!(probe, Ok(5));
        assert!(probe.take().is_none());
        assert_eq!(harness.store.commit_count(), 1);
        assert!(harness.runner.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_reactive_empty_stream_fails() {
        let mut harness = TestHarness::new(Answer::Confirm);
        let probe = harness.perform(Feed {
            stream: tokio_stream::empty::<Result<u32, ActionError>>(),
        });

        settle(&mut harness).await;

        assert_outcome!(probe, Err(ActionError::StreamEnded));
        assert_eq!(harness.store.commit_count(), 0);
        assert_eq!(harness.presenter.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_live_subscriptions() {
        let mut harness = TestHarness::new(Answer::Confirm);
        let probe = harness.perform(Feed {
            stream: tokio_stream::pending::<Result<u32, ActionError>>(),
        });

        settle(&mut harness).await;
        assert_pending!(probe);
        assert_eq!(harness.runner.subscriptions().len(), 1);

        harness.runner.shutdown();
        settle(&mut harness).await;

        assert_outcome!(probe, Err(ActionError::Canceled));
        assert!(harness.runner.subscriptions().is_empty());
        assert!(harness.presenter.errors().is_empty());
    }

    #[test]
    fn test_action_log_from_config() {
        let config = RunnerConfig::from_json_str(r#"{ "log": { "enabled": true } }"#).unwrap();
        let harness = TestHarness::with_config(Answer::Confirm, config);
        let _ = harness.perform(Record::new(&harness.store, "DMC 310"));

        let log = harness.runner.action_log().expect("log enabled");
        let entries = log.recent(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Record");
        assert_eq!(entries[0].outcome, Some(Outcome::Succeeded));
        assert!(entries[0].capabilities.contains(Capabilities::SYNC));
    }
}
