//! Action traits: metadata, execution shapes and the destructive capability
//!
//! An action is a value describing one user-triggerable mutation. It is built
//! at the trigger call site, handed to an [`ActionRunner`](crate::ActionRunner)
//! once, and discarded.
//!
//! Capabilities are plain data rather than extra trait impls:
//!
//! - the execution shape comes from [`Action::into_body`], which returns an
//!   [`ActionBody`] variant (sync, async or reactive);
//! - the destructive capability is [`ActionMeta::confirmation`] returning
//!   `Some`, independent of the shape.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Clone, Debug, ActionMeta)]
//! #[action(undo = "Mark In Stock")]
//! struct MarkInStock {
//!     catalog: Arc<Catalog>,
//!     thread: ThreadId,
//! }
//!
//! impl Action for MarkInStock {
//!     type Output = ();
//!
//!     fn can_perform(&self) -> bool {
//!         !self.catalog.is_in_stock(self.thread)
//!     }
//!
//!     fn into_body(self) -> ActionBody<()> {
//!         ActionBody::sync(move |_store| {
//!             self.catalog.set_in_stock(self.thread, true);
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::pin::Pin;

use bitflags::bitflags;
use tokio_stream::Stream;

use crate::context::Context;
use crate::error::{ActionError, ConfigError};
use crate::store::StoreHandle;

/// Descriptive metadata shared by every action.
///
/// Use `#[derive(ActionMeta)]` from `floss-actions-macros` to implement this
/// from attributes.
pub trait ActionMeta {
    /// Stable action name for logging, filtering and de-duplication.
    fn name(&self) -> &'static str;

    /// Label for the undo group, if this action is undoable.
    fn undo_name(&self) -> Option<Cow<'static, str>> {
        None
    }

    /// Whether the runner commits the store after this action succeeds.
    fn commit_on_complete(&self) -> bool {
        true
    }

    /// Confirmation strings; `Some` marks the action as destructive.
    fn confirmation(&self) -> Option<Confirmation> {
        None
    }
}

/// A user-triggerable unit of work.
pub trait Action: ActionMeta + Send + Sized + 'static {
    /// Value produced on success. Use `()` when there is nothing to report.
    type Output: Send + 'static;

    /// Whether the action is currently allowed.
    ///
    /// Must be a pure function of current state. The runner checks it after
    /// any confirmation and silently drops the invocation when it is false.
    fn can_perform(&self) -> bool {
        true
    }

    /// Hand the body to the runner.
    fn into_body(self) -> ActionBody<Self::Output>;
}

/// Body of a synchronous action.
pub type SyncBody<T> = Box<dyn FnOnce(&StoreHandle) -> Result<T, ActionError> + Send>;
/// Body of an asynchronous action.
pub type AsyncBody<T> = Box<dyn FnOnce(Context<T>) + Send>;
/// Stream returned by a reactive action. Only the first item is used.
pub type ValueStream<T> = Pin<Box<dyn Stream<Item = Result<T, ActionError>> + Send>>;
/// Body of a reactive action.
pub type ReactiveBody<T> = Box<dyn FnOnce(&StoreHandle) -> ValueStream<T> + Send>;

/// The execution shape of an action, with its body.
///
/// The framework does not roll back partial mutations. A body that fails after
/// mutating the store must undo its own changes before reporting the error if
/// it wants the in-memory state restored.
pub enum ActionBody<T> {
    /// Runs to completion inside `perform`.
    Sync(SyncBody<T>),
    /// Receives the context and completes it later, possibly from another thread.
    Async(AsyncBody<T>),
    /// Returns a single-value stream the runner subscribes to.
    Reactive(ReactiveBody<T>),
}

impl<T: Send + 'static> ActionBody<T> {
    /// Build a synchronous body.
    pub fn sync<F>(body: F) -> Self
    where
        F: FnOnce(&StoreHandle) -> Result<T, ActionError> + Send + 'static,
    {
        ActionBody::Sync(Box::new(body))
    }

    /// Build an asynchronous body.
    pub fn asynchronous<F>(body: F) -> Self
    where
        F: FnOnce(Context<T>) + Send + 'static,
    {
        ActionBody::Async(Box::new(body))
    }

    /// Build a reactive body from any stream of results.
    pub fn reactive<F, S>(body: F) -> Self
    where
        F: FnOnce(&StoreHandle) -> S + Send + 'static,
        S: Stream<Item = Result<T, ActionError>> + Send + 'static,
    {
        ActionBody::Reactive(Box::new(move |store: &StoreHandle| {
            Box::pin(body(store)) as ValueStream<T>
        }))
    }

    /// Which shape this body has.
    pub fn shape(&self) -> ExecutionShape {
        match self {
            ActionBody::Sync(_) => ExecutionShape::Sync,
            ActionBody::Async(_) => ExecutionShape::Async,
            ActionBody::Reactive(_) => ExecutionShape::Reactive,
        }
    }
}

impl<T> fmt::Debug for ActionBody<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            ActionBody::Sync(_) => "Sync",
            ActionBody::Async(_) => "Async",
            ActionBody::Reactive(_) => "Reactive",
        };
        f.debug_tuple("ActionBody").field(&shape).finish()
    }
}

/// How an action body executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionShape {
    Sync,
    Async,
    Reactive,
}

impl ExecutionShape {
    /// The capability flag for this shape.
    pub fn capability(self) -> Capabilities {
        match self {
            ExecutionShape::Sync => Capabilities::SYNC,
            ExecutionShape::Async => Capabilities::ASYNC,
            ExecutionShape::Reactive => Capabilities::REACTIVE,
        }
    }
}

bitflags! {
    /// Capability summary of an action, used in log records and triggers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const SYNC = 1;
        const ASYNC = 1 << 1;
        const REACTIVE = 1 << 2;
        const DESTRUCTIVE = 1 << 3;
        const UNDOABLE = 1 << 4;
        const COMMITS = 1 << 5;
    }
}

impl Capabilities {
    /// Capabilities known from metadata alone (shape excluded).
    pub fn from_meta<A: ActionMeta + ?Sized>(action: &A) -> Self {
        let mut caps = Capabilities::empty();
        if action.confirmation().is_some() {
            caps |= Capabilities::DESTRUCTIVE;
        }
        if action.undo_name().is_some() {
            caps |= Capabilities::UNDOABLE;
        }
        if action.commit_on_complete() {
            caps |= Capabilities::COMMITS;
        }
        caps
    }

    /// Short labels for the set flags, e.g. `["sync", "destructive"]`.
    pub fn labels(self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        for (flag, label) in [
            (Capabilities::SYNC, "sync"),
            (Capabilities::ASYNC, "async"),
            (Capabilities::REACTIVE, "reactive"),
            (Capabilities::DESTRUCTIVE, "destructive"),
            (Capabilities::UNDOABLE, "undoable"),
            (Capabilities::COMMITS, "commits"),
        ] {
            if self.contains(flag) {
                labels.push(label);
            }
        }
        labels
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.labels().join("|"))
    }
}

/// The three strings a destructive action shows before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    title: Cow<'static, str>,
    message: Cow<'static, str>,
    confirm_label: Cow<'static, str>,
}

impl Confirmation {
    /// Create confirmation strings.
    ///
    /// # Panics
    ///
    /// Panics if any string is empty. A destructive action without text is a
    /// programming error; use [`Confirmation::try_new`] for text that comes
    /// from outside the program.
    pub fn new(
        title: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
        confirm_label: impl Into<Cow<'static, str>>,
    ) -> Self {
        match Self::try_new(title, message, confirm_label) {
            Ok(confirmation) => confirmation,
            Err(e) => panic!("{}", e),
        }
    }

    /// Create confirmation strings, rejecting empty text.
    pub fn try_new(
        title: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
        confirm_label: impl Into<Cow<'static, str>>,
    ) -> Result<Self, ConfigError> {
        let title = title.into();
        let message = message.into();
        let confirm_label = confirm_label.into();

        if title.trim().is_empty() {
            return Err(ConfigError::MissingConfirmationText("title"));
        }
        if message.trim().is_empty() {
            return Err(ConfigError::MissingConfirmationText("message"));
        }
        if confirm_label.trim().is_empty() {
            return Err(ConfigError::MissingConfirmationText("confirm label"));
        }

        Ok(Self {
            title,
            message,
            confirm_label,
        })
    }

    /// Dialog title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Dialog body text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Label of the confirming button.
    pub fn confirm_label(&self) -> &str {
        &self.confirm_label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeleteThread;

    impl ActionMeta for DeleteThread {
        fn name(&self) -> &'static str {
            "DeleteThread"
        }

        fn undo_name(&self) -> Option<Cow<'static, str>> {
            Some("Delete Thread".into())
        }

        fn confirmation(&self) -> Option<Confirmation> {
            Some(Confirmation::new("Delete Thread", "Are you sure?", "Delete"))
        }
    }

    impl Action for DeleteThread {
        type Output = ();

        fn into_body(self) -> ActionBody<()> {
            ActionBody::sync(|_| Ok(()))
        }
    }

    struct Refresh;

    impl ActionMeta for Refresh {
        fn name(&self) -> &'static str {
            "Refresh"
        }

        fn commit_on_complete(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_capabilities_from_meta() {
        let caps = Capabilities::from_meta(&DeleteThread);
        assert!(caps.contains(Capabilities::DESTRUCTIVE));
        assert!(caps.contains(Capabilities::UNDOABLE));
        assert!(caps.contains(Capabilities::COMMITS));

        let caps = Capabilities::from_meta(&Refresh);
        assert!(caps.is_empty());
    }

    #[test]
    fn test_body_shape() {
        let body = DeleteThread.into_body();
        assert_eq!(body.shape(), ExecutionShape::Sync);

        let caps = Capabilities::from_meta(&DeleteThread) | body.shape().capability();
        assert_eq!(caps.to_string(), "sync|destructive|undoable|commits");
    }

    #[test]
    fn test_reactive_body_shape() {
        let body: ActionBody<u32> = ActionBody::reactive(|_| tokio_stream::once(Ok(3)));
        assert_eq!(body.shape(), ExecutionShape::Reactive);

        let body: ActionBody<u32> = ActionBody::asynchronous(|ctx| ctx.complete(1));
        assert_eq!(body.shape(), ExecutionShape::Async);
    }

    #[test]
    fn test_confirmation_accessors() {
        let c = Confirmation::new("Delete Thread", "Are you sure?", "Delete");
        assert_eq!(c.title(), "Delete Thread");
        assert_eq!(c.message(), "Are you sure?");
        assert_eq!(c.confirm_label(), "Delete");
    }

    #[test]
    fn test_confirmation_rejects_empty_text() {
        assert!(matches!(
            Confirmation::try_new("", "Are you sure?", "Delete"),
            Err(ConfigError::MissingConfirmationText("title"))
        ));
        assert!(matches!(
            Confirmation::try_new("Delete", "  ", "Delete"),
            Err(ConfigError::MissingConfirmationText("message"))
        ));
        assert!(matches!(
            Confirmation::try_new("Delete", "Sure?", ""),
            Err(ConfigError::MissingConfirmationText("confirm label"))
        ));
    }

    #[test]
    #[should_panic(expected = "missing confirmation title")]
    fn test_confirmation_new_panics_on_missing_title() {
        let _ = Confirmation::new("", "Are you sure?", "Delete");
    }
}
