//! Presenter boundary: confirmations, transient surfaces and error alerts
//!
//! The runner never builds UI. It is handed a [`Presenter`] that knows how to
//! show a confirmation dialog, a picker or sheet ([`Surface`]), and an error
//! alert. `floss-actions-components` ships a terminal implementation.

use std::any::Any;
use std::fmt;

use crate::action::Confirmation;
use crate::error::ActionError;

/// UI layer injected into an [`ActionRunner`](crate::ActionRunner).
///
/// All methods are called on the UI thread.
pub trait Presenter: Send + Sync + 'static {
    /// Ask the user to confirm a destructive action.
    ///
    /// Answer through [`ConfirmationRequest::confirm`] or
    /// [`ConfirmationRequest::decline`], now or later. Dropping the request
    /// unanswered counts as declining.
    fn confirm(&self, request: ConfirmationRequest);

    /// Show a transient surface, positioned near `source` when given.
    fn present(&self, surface: Surface, source: Option<&SourceHint>);

    /// Dismiss whatever surface is currently presented.
    fn dismiss(&self);

    /// Show a human-readable alert for a failed action.
    fn present_error(&self, error: &ActionError);
}

/// Where a trigger lives on screen, used to position popovers and dialogs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceHint {
    /// Identifier of the triggering element (e.g. `"thread-list:3"`).
    pub anchor: Option<String>,
    /// Screen rectangle of the triggering element.
    pub area: Option<Area>,
}

impl SourceHint {
    /// Hint naming the triggering element.
    pub fn named(anchor: impl Into<String>) -> Self {
        Self {
            anchor: Some(anchor.into()),
            area: None,
        }
    }

    /// Hint with only a screen rectangle.
    pub fn at(area: Area) -> Self {
        Self {
            anchor: None,
            area: Some(area),
        }
    }

    /// Attach a screen rectangle.
    pub fn with_area(mut self, area: Area) -> Self {
        self.area = Some(area);
        self
    }
}

/// A screen rectangle in cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A transient UI surface (sheet, picker) presented on behalf of an action.
///
/// The payload is type-erased; presenters downcast to the surface types they
/// know how to draw.
pub struct Surface {
    title: String,
    content: Box<dyn Any + Send>,
}

impl Surface {
    /// Wrap a payload under a title.
    pub fn new<T: Any + Send>(title: impl Into<String>, content: T) -> Self {
        Self {
            title: title.into(),
            content: Box::new(content),
        }
    }

    /// Surface title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.content.is::<T>()
    }

    /// Borrow the payload as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.content.downcast_ref::<T>()
    }

    /// Take the payload as a `T`, or get the surface back.
    pub fn into_content<T: Any>(self) -> Result<T, Self> {
        let Surface { title, content } = self;
        match content.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(content) => Err(Surface { title, content }),
        }
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// A pending confirmation for a destructive action.
pub struct ConfirmationRequest {
    action: &'static str,
    confirmation: Confirmation,
    source: Option<SourceHint>,
    responder: Responder,
}

impl ConfirmationRequest {
    pub(crate) fn new(
        action: &'static str,
        confirmation: Confirmation,
        source: Option<SourceHint>,
        respond: impl FnOnce(bool) + Send + 'static,
    ) -> Self {
        Self {
            action,
            confirmation,
            source,
            responder: Responder(Some(Box::new(respond))),
        }
    }

    /// Name of the action awaiting confirmation.
    pub fn action_name(&self) -> &'static str {
        self.action
    }

    /// The strings to display.
    pub fn confirmation(&self) -> &Confirmation {
        &self.confirmation
    }

    /// Positioning hint from the trigger.
    pub fn source(&self) -> Option<&SourceHint> {
        self.source.as_ref()
    }

    /// The user confirmed: run the action.
    pub fn confirm(self) {
        self.responder.respond(true);
    }

    /// The user declined: the action completes as canceled.
    pub fn decline(self) {
        self.responder.respond(false);
    }

    /// Answer with a boolean.
    pub fn respond(self, confirmed: bool) {
        self.responder.respond(confirmed);
    }
}

impl fmt::Debug for ConfirmationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationRequest")
            .field("action", &self.action)
            .field("confirmation", &self.confirmation)
            .field("source", &self.source)
            .finish()
    }
}

/// One-shot answer channel; declines on drop if never used.
struct Responder(Option<Box<dyn FnOnce(bool) + Send>>);

impl Responder {
    fn respond(mut self, confirmed: bool) {
        if let Some(respond) = self.0.take() {
            respond(confirmed);
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if let Some(respond) = self.0.take() {
            tracing::debug!("confirmation dropped unanswered, treating as declined");
            respond(false);
        }
    }
}
