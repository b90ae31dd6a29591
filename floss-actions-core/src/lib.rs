//! Core traits and types for floss-actions
//!
//! This crate provides an action-execution engine for catalogue-style
//! applications: every user-triggered mutation is described as an action value
//! and handed to a runner that decides how to invoke it.
//!
//! # Core Concepts
//!
//! - **Action**: an immutable value with metadata and a body of one shape
//!   (sync, async or reactive), optionally destructive
//! - **Context**: per-invocation handle carrying the source hint and the
//!   completion callback; completion fires exactly once
//! - **ActionRunner**: capability dispatch, confirmation, undo labeling and
//!   commit-on-complete
//! - **BoundAction**: an action paired with a runner, materialized as menu
//!   entries, swipe actions and alert buttons
//!
//! # Basic Example
//!
//! ```ignore
//! use floss_actions_core::prelude::*;
//!
//! struct MarkInStock {
//!     catalog: Arc<Catalog>,
//!     thread: u32,
//! }
//!
//! impl ActionMeta for MarkInStock {
//!     fn name(&self) -> &'static str {
//!         "MarkInStock"
//!     }
//!
//!     fn undo_name(&self) -> Option<Cow<'static, str>> {
//!         Some("Mark In Stock".into())
//!     }
//! }
//!
//! impl Action for MarkInStock {
//!     type Output = ();
//!
//!     fn into_body(self) -> ActionBody<()> {
//!         ActionBody::sync(move |_store| {
//!             self.catalog.set_in_stock(self.thread, true);
//!             Ok(())
//!         })
//!     }
//! }
//!
//! let mut ui = UiQueue::new();
//! let runner = ActionRunner::builder(catalog.clone(), ui.handle()).build();
//! runner.perform(MarkInStock { catalog, thread: 310 });
//! ```
//!
//! # Async Bodies
//!
//! An async body receives the [`Context`] and completes it whenever its work
//! is done, from any thread. Completion is marshalled back to the UI thread
//! through the [`UiQueue`], which the main loop drains:
//!
//! ```ignore
//! fn into_body(self) -> ActionBody<u32> {
//!     ActionBody::asynchronous(move |ctx| {
//!         tokio::spawn(async move {
//!             match self.list.add(self.thread).await {
//!                 Ok(quantity) => ctx.complete(quantity),
//!                 Err(e) => ctx.fail(ActionError::failed(e)),
//!             }
//!         });
//!     })
//! }
//!
//! loop {
//!     tokio::select! {
//!         Some(event) = event_rx.recv() => { /* map keys to triggers */ }
//!         Some(job) = ui.recv() => job.run(),
//!     }
//! }
//! ```

pub mod action;
pub mod action_log;
pub mod bound;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod presenter;
pub mod runner;
pub mod store;
pub mod subscriptions;
pub mod testing;
pub mod ui;

// Core trait exports
pub use action::{
    Action, ActionBody, ActionMeta, AsyncBody, Capabilities, Confirmation, ExecutionShape,
    ReactiveBody, SyncBody, ValueStream,
};
pub use context::{Completion, Context, WillPerform};
pub use error::{ActionError, BoxError, ConfigError, StoreError};

// Runner exports
pub use config::{ActionLogSettings, RunnerConfig};
pub use runner::{ActionRunner, PerformRequest, RunnerBuilder};
pub use subscriptions::Subscriptions;
pub use ui::{UiHandle, UiJob, UiQueue};

// Boundary exports
pub use presenter::{Area, ConfirmationRequest, Presenter, SourceHint, Surface};
pub use store::{PersistentStore, StoreHandle, UndoHistory};

// UI trigger exports
pub use bound::{AlertButton, BoundAction, MenuEntry, SwipeAction, SwipeEdge, Trigger, TriggerRole};

// Middleware exports
pub use action_log::{
    glob_match, ActionLog, ActionLogConfig, ActionLogEntry, ActionLoggerConfig,
    ActionLoggerMiddleware,
};
pub use middleware::{
    ActionRecord, ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware, Outcome,
};

// Testing exports
pub use testing::{
    Answer, CompletionProbe, MemoryStore, RecordingMiddleware, RecordingUndo, ScriptedPresenter,
    TestHarness,
};

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{Action, ActionBody, ActionMeta, Confirmation};
    pub use crate::bound::{AlertButton, BoundAction, MenuEntry, SwipeAction, TriggerRole};
    pub use crate::config::RunnerConfig;
    pub use crate::context::Context;
    pub use crate::error::{ActionError, StoreError};
    pub use crate::middleware::{LoggingMiddleware, Middleware, Outcome};
    pub use crate::presenter::{Presenter, SourceHint, Surface};
    pub use crate::runner::ActionRunner;
    pub use crate::store::{PersistentStore, StoreHandle, UndoHistory};
    pub use crate::ui::{UiHandle, UiQueue};
}
