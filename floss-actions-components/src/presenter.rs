//! Terminal presenter: confirmation dialogs, error alerts and sheets
//!
//! Dialogs queue up and the front one is drawn over the frame and receives
//! keys. The application calls [`TerminalPresenter::handle_key`] before its
//! own key handling and [`TerminalPresenter::render`] last in each frame.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crossterm::event::{KeyCode, KeyEvent};
use floss_actions_core::{ActionError, ConfirmationRequest, Presenter, SourceHint, Surface};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::modal::{anchored_rect, centered_rect, render_modal, ModalStyle};

const DIALOG_WIDTH: u16 = 44;

enum Dialog {
    Confirm(ConfirmationRequest),
    Alert { message: String },
    Sheet {
        surface: Surface,
        source: Option<SourceHint>,
    },
}

impl Dialog {
    fn source(&self) -> Option<&SourceHint> {
        match self {
            Dialog::Confirm(request) => request.source(),
            Dialog::Alert { .. } => None,
            Dialog::Sheet { source, .. } => source.as_ref(),
        }
    }
}

/// What a key press did to the dialog stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKey {
    /// No dialog is open; handle the key normally.
    Ignored,
    /// A dialog swallowed the key.
    Consumed,
    /// A confirmation was answered.
    Answered { confirmed: bool },
    /// An alert or sheet was closed.
    Closed,
}

/// [`Presenter`] that draws modal dialogs with ratatui.
pub struct TerminalPresenter {
    dialogs: Mutex<VecDeque<Dialog>>,
    style: ModalStyle,
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::with_style(ModalStyle::with_bg(Color::Rgb(28, 28, 36)))
    }

    pub fn with_style(style: ModalStyle) -> Self {
        Self {
            dialogs: Mutex::new(VecDeque::new()),
            style,
        }
    }

    fn dialogs(&self) -> MutexGuard<'_, VecDeque<Dialog>> {
        self.dialogs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a dialog is showing.
    pub fn is_active(&self) -> bool {
        !self.dialogs().is_empty()
    }

    /// Number of queued dialogs, including the visible one.
    pub fn pending(&self) -> usize {
        self.dialogs().len()
    }

    /// Read the visible sheet's surface, if the front dialog is a sheet.
    pub fn with_surface<R>(&self, f: impl FnOnce(&Surface) -> R) -> Option<R> {
        match self.dialogs().front() {
            Some(Dialog::Sheet { surface, .. }) => Some(f(surface)),
            _ => None,
        }
    }

    /// Route a key to the front dialog.
    ///
    /// Confirmations take y/Enter or n/Esc, alerts close on Enter/Esc and
    /// sheets close on Esc. Any other key is swallowed while a dialog is open.
    pub fn handle_key(&self, key: &KeyEvent) -> DialogKey {
        let mut dialogs = self.dialogs();
        let Some(front) = dialogs.front() else {
            return DialogKey::Ignored;
        };

        let closes = match front {
            Dialog::Confirm(_) => matches!(
                key.code,
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter
                    | KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc
            ),
            Dialog::Alert { .. } => matches!(key.code, KeyCode::Enter | KeyCode::Esc),
            Dialog::Sheet { .. } => key.code == KeyCode::Esc,
        };
        if !closes {
            return DialogKey::Consumed;
        }

        let Some(dialog) = dialogs.pop_front() else {
            return DialogKey::Consumed;
        };
        // The answer may queue new dialogs, so release the lock first.
        drop(dialogs);

        match dialog {
            Dialog::Confirm(request) => {
                let confirmed =
                    matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter);
                tracing::debug!(
                    action = request.action_name(),
                    confirmed,
                    "confirmation answered"
                );
                request.respond(confirmed);
                DialogKey::Answered { confirmed }
            }
            Dialog::Alert { .. } | Dialog::Sheet { .. } => DialogKey::Closed,
        }
    }

    /// Draw the front dialog over the current frame.
    pub fn render(&self, frame: &mut Frame) {
        let dialogs = self.dialogs();
        let Some(dialog) = dialogs.front() else {
            return;
        };

        let (title, title_style, body, footer) = match dialog {
            Dialog::Confirm(request) => {
                let confirmation = request.confirmation();
                (
                    confirmation.title().to_string(),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    vec![Line::raw(confirmation.message().to_string())],
                    Line::from(vec![
                        Span::styled(
                            format!("[y] {}", confirmation.confirm_label()),
                            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                        ),
                        Span::raw("   "),
                        Span::raw("[n] Cancel"),
                    ]),
                )
            }
            Dialog::Alert { message } => (
                "Error".to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                vec![Line::raw(message.clone())],
                Line::raw("[enter] OK"),
            ),
            Dialog::Sheet { surface, .. } => (
                surface.title().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
                sheet_lines(surface),
                Line::styled("[esc] Close", Style::default().fg(Color::DarkGray)),
            ),
        };

        let height = (body.len() as u16).saturating_add(5);
        let bounds = frame.area();
        let area = match dialog.source().and_then(|source| source.area) {
            Some(anchor) => anchored_rect(
                DIALOG_WIDTH,
                height,
                Rect::new(anchor.x, anchor.y, anchor.width, anchor.height),
                bounds,
            ),
            None => centered_rect(DIALOG_WIDTH, height, bounds),
        };

        render_modal(frame, area, &self.style);
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!(" {} ", title), title_style));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [body_area, footer_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
        frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: true }), body_area);
        frame.render_widget(Paragraph::new(footer), footer_area);
    }
}

/// Text payloads are drawn as-is; anything else shows only its title.
fn sheet_lines(surface: &Surface) -> Vec<Line<'static>> {
    if let Some(text) = surface.downcast_ref::<String>() {
        return text.lines().map(|l| Line::raw(l.to_string())).collect();
    }
    if let Some(items) = surface.downcast_ref::<Vec<String>>() {
        return items.iter().map(|l| Line::raw(format!("  {}", l))).collect();
    }
    vec![Line::raw("")]
}

impl Presenter for TerminalPresenter {
    fn confirm(&self, request: ConfirmationRequest) {
        self.dialogs().push_back(Dialog::Confirm(request));
    }

    fn present(&self, surface: Surface, source: Option<&SourceHint>) {
        self.dialogs().push_back(Dialog::Sheet {
            surface,
            source: source.cloned(),
        });
    }

    fn dismiss(&self) {
        let mut dialogs = self.dialogs();
        if let Some(index) = dialogs
            .iter()
            .rposition(|dialog| matches!(dialog, Dialog::Sheet { .. }))
        {
            dialogs.remove(index);
        }
    }

    fn present_error(&self, error: &ActionError) {
        self.dialogs().push_back(Dialog::Alert {
            message: error.to_string(),
        });
    }
}

impl std::fmt::Debug for TerminalPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalPresenter")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
