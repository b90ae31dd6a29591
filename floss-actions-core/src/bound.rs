//! Actions paired with a runner and display metadata
//!
//! A [`BoundAction`] turns an action into UI triggers (menu entries, swipe
//! actions, alert buttons) that only know how to call the runner. The
//! triggers never see capability dispatch.
//!
//! A trigger's enabled state is sampled from `can_perform` when the trigger
//! is built, not observed live. Rebuild triggers when the state they depend
//! on changes.

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

use crate::action::Action;
use crate::presenter::SourceHint;
use crate::runner::ActionRunner;

/// Visual role of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriggerRole {
    #[default]
    Normal,
    /// Rendered with emphasis (usually red).
    Destructive,
    /// Closes the surrounding surface without performing anything.
    Cancel,
}

/// An action instance ready to be materialized as UI triggers.
pub struct BoundAction<A> {
    action: A,
    runner: ActionRunner,
    title: Cow<'static, str>,
    destructive: bool,
}

impl<A: Action + Clone> BoundAction<A> {
    /// Pair `action` with `runner` under a display title.
    ///
    /// The action counts as destructive when it asks for confirmation.
    pub fn new(runner: &ActionRunner, action: A, title: impl Into<Cow<'static, str>>) -> Self {
        let destructive = action.confirmation().is_some();
        Self {
            action,
            runner: runner.clone(),
            title: title.into(),
            destructive,
        }
    }

    /// Override the destructive styling.
    pub fn destructive(mut self, destructive: bool) -> Self {
        self.destructive = destructive;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_destructive(&self) -> bool {
        self.destructive
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    /// Role derived from the destructive flag.
    pub fn role(&self) -> TriggerRole {
        if self.destructive {
            TriggerRole::Destructive
        } else {
            TriggerRole::Normal
        }
    }

    /// Perform a copy of the action now.
    pub fn perform(&self, source: Option<SourceHint>) {
        let request = self.runner.request(self.action.clone());
        match source {
            Some(source) => request.source(source).perform(),
            None => request.perform(),
        }
    }

    /// A context-menu entry.
    pub fn menu_entry(&self) -> MenuEntry {
        MenuEntry {
            trigger: self.trigger(),
            shortcut: None,
        }
    }

    /// A row swipe action. Destructive actions sit on the trailing edge.
    pub fn swipe_action(&self) -> SwipeAction {
        let edge = if self.destructive {
            SwipeEdge::Trailing
        } else {
            SwipeEdge::Leading
        };
        SwipeAction {
            trigger: self.trigger(),
            edge,
        }
    }

    /// A button for an alert or action sheet.
    pub fn alert_button(&self) -> AlertButton {
        AlertButton {
            trigger: self.trigger(),
        }
    }

    fn trigger(&self) -> Trigger {
        let runner = self.runner.clone();
        let action = self.action.clone();
        Trigger {
            title: self.title.clone(),
            role: self.role(),
            enabled: self.action.can_perform(),
            activate: Some(Box::new(move |source| {
                let request = runner.request(action.clone());
                match source {
                    Some(source) => request.source(source).perform(),
                    None => request.perform(),
                }
            })),
        }
    }
}

impl<A: Action> fmt::Debug for BoundAction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction")
            .field("action", &self.action.name())
            .field("title", &self.title)
            .field("destructive", &self.destructive)
            .finish()
    }
}

type Activate = Box<dyn Fn(Option<SourceHint>) + Send>;

/// Shared part of every trigger: title, role, enabled state, activation.
pub struct Trigger {
    title: Cow<'static, str>,
    role: TriggerRole,
    enabled: bool,
    activate: Option<Activate>,
}

impl Trigger {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn role(&self) -> TriggerRole {
        self.role
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Perform the bound action. Returns false when the trigger is disabled
    /// or performs nothing.
    pub fn activate(&self, source: Option<SourceHint>) -> bool {
        if !self.enabled {
            tracing::debug!(trigger = %self.title, "disabled trigger activated, ignoring");
            return false;
        }
        match &self.activate {
            Some(activate) => {
                activate(source);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("title", &self.title)
            .field("role", &self.role)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Entry in a context or overflow menu.
#[derive(Debug)]
pub struct MenuEntry {
    trigger: Trigger,
    shortcut: Option<char>,
}

impl MenuEntry {
    /// Attach a single-key shortcut.
    pub fn with_shortcut(mut self, key: char) -> Self {
        self.shortcut = Some(key);
        self
    }

    pub fn shortcut(&self) -> Option<char> {
        self.shortcut
    }
}

impl Deref for MenuEntry {
    type Target = Trigger;

    fn deref(&self) -> &Trigger {
        &self.trigger
    }
}

/// Which edge of a row a swipe action is revealed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeEdge {
    Leading,
    Trailing,
}

/// Action revealed by swiping a list row.
#[derive(Debug)]
pub struct SwipeAction {
    trigger: Trigger,
    edge: SwipeEdge,
}

impl SwipeAction {
    pub fn edge(&self) -> SwipeEdge {
        self.edge
    }
}

impl Deref for SwipeAction {
    type Target = Trigger;

    fn deref(&self) -> &Trigger {
        &self.trigger
    }
}

/// Button in an alert or action sheet.
#[derive(Debug)]
pub struct AlertButton {
    trigger: Trigger,
}

impl AlertButton {
    /// A cancel button that performs nothing.
    pub fn cancel(title: impl Into<Cow<'static, str>>) -> Self {
        Self {
            trigger: Trigger {
                title: title.into(),
                role: TriggerRole::Cancel,
                enabled: true,
                activate: None,
            },
        }
    }
}

impl Deref for AlertButton {
    type Target = Trigger;

    fn deref(&self) -> &Trigger {
        &self.trigger
    }
}
