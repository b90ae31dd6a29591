//! floss-actions: confirmable, undoable actions for catalogue UIs
//!
//! Every user-triggered mutation is an action value handed to an
//! [`ActionRunner`]. The runner asks for confirmation when the action is
//! destructive, labels the undo group, runs the body in its shape (sync, async
//! or reactive), commits the store after success and reports the result on the
//! UI thread exactly once.
//!
//! # Example
//! ```ignore
//! use floss_actions::prelude::*;
//!
//! #[derive(Clone, ActionMeta)]
//! #[action(undo, destructive(title = "Delete Thread", message = "Are you sure?", confirm = "Delete"))]
//! struct DeleteThread {
//!     catalog: Arc<Catalog>,
//!     id: u32,
//! }
//!
//! impl Action for DeleteThread {
//!     type Output = ();
//!
//!     fn into_body(self) -> ActionBody<()> {
//!         ActionBody::sync(move |_store| self.catalog.delete(self.id).map_err(ActionError::failed))
//!     }
//! }
//!
//! let bound = BoundAction::new(&runner, DeleteThread { catalog, id: 3 }, "Delete");
//! let entry = bound.menu_entry();
//! entry.activate(Some(SourceHint::named("thread-row:3")));
//! ```

// Re-export everything from core
pub use floss_actions_core::*;

// Re-export derive macros
pub use floss_actions_macros::ActionMeta;

/// Prelude for convenient imports
pub mod prelude {
    // Traits
    pub use floss_actions_core::{Action, ActionMeta, Middleware, PersistentStore, Presenter, UndoHistory};

    // Bodies and results
    pub use floss_actions_core::{ActionBody, ActionError, Confirmation, Context, StoreError, StoreHandle};

    // Runner
    pub use floss_actions_core::{ActionRunner, RunnerConfig, SourceHint, Surface, UiHandle, UiQueue};

    // Triggers
    pub use floss_actions_core::{AlertButton, BoundAction, MenuEntry, SwipeAction, TriggerRole};

    // Middleware
    pub use floss_actions_core::{ActionLoggerMiddleware, LoggingMiddleware, Outcome};

    // Derive macros
    pub use floss_actions_macros::ActionMeta;
}
