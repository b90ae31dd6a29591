//! Context menu of bound actions

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use floss_actions_core::{Area, MenuEntry, SourceHint, TriggerRole};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::component::Component;

/// Props for [`ActionMenu`]
pub struct ActionMenuProps<'a, M> {
    /// Entries built from `BoundAction::menu_entry`
    pub entries: &'a [MenuEntry],
    /// Currently highlighted index
    pub selected: usize,
    /// Whether the menu has focus
    pub is_focused: bool,
    /// Menu title
    pub title: &'a str,
    /// Message for moving the highlight
    pub on_select: fn(usize) -> M,
    /// Message for activating an enabled entry
    pub on_activate: fn(usize) -> M,
}

/// Scrollable menu of action triggers
///
/// j/k/up/down/g/G move the highlight. Enter activates the highlighted entry
/// and an entry's shortcut activates it directly; shortcuts are checked before
/// navigation keys. Disabled entries are drawn dimmed and never activate.
/// Destructive entries are drawn in red.
///
/// The menu only emits messages; the caller runs
/// [`Trigger::activate`](floss_actions_core::Trigger::activate) with a source
/// hint from [`ActionMenu::source_hint`].
#[derive(Debug, Default)]
pub struct ActionMenu {
    scroll_offset: usize,
    last_area: Option<Rect>,
}

impl ActionMenu {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_visible(&mut self, selected: usize, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }

        if selected < self.scroll_offset {
            self.scroll_offset = selected;
        } else if selected >= self.scroll_offset + viewport_height {
            self.scroll_offset = selected.saturating_sub(viewport_height - 1);
        }
    }

    /// Screen row of entry `index` as of the last render, if visible.
    pub fn entry_area(&self, index: usize) -> Option<Rect> {
        let area = self.last_area?;
        let inner_height = area.height.saturating_sub(2) as usize;
        let row = index.checked_sub(self.scroll_offset)?;
        if row >= inner_height {
            return None;
        }
        Some(Rect::new(
            area.x + 1,
            area.y + 1 + row as u16,
            area.width.saturating_sub(2),
            1,
        ))
    }

    /// Source hint for activating entry `index`, anchored to its row.
    pub fn source_hint(&self, index: usize, anchor: impl Into<String>) -> SourceHint {
        let hint = SourceHint::named(anchor);
        match self.entry_area(index) {
            Some(rect) => hint.with_area(Area::new(rect.x, rect.y, rect.width, rect.height)),
            None => hint,
        }
    }

    fn entry_style(entry: &MenuEntry, highlighted: bool) -> Style {
        let mut style = match entry.role() {
            TriggerRole::Destructive => Style::default().fg(Color::Red),
            TriggerRole::Normal | TriggerRole::Cancel => Style::default(),
        };
        if !entry.is_enabled() {
            style = style.fg(Color::DarkGray).add_modifier(Modifier::DIM);
        }
        if highlighted {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }
        style
    }
}

impl<M> Component<M> for ActionMenu {
    type Props<'a> = ActionMenuProps<'a, M>;

    fn handle_key(&mut self, key: &KeyEvent, props: Self::Props<'_>) -> impl IntoIterator<Item = M> {
        if !props.is_focused || props.entries.is_empty() {
            return None;
        }

        let len = props.entries.len();

        if let KeyCode::Char(c) = key.code {
            if let Some(index) = props
                .entries
                .iter()
                .position(|entry| entry.shortcut() == Some(c))
            {
                return props.entries[index]
                    .is_enabled()
                    .then(|| (props.on_activate)(index));
            }
        }

        let target = match key.code {
            KeyCode::Char('j') | KeyCode::Down => (props.selected + 1).min(len - 1),
            KeyCode::Char('k') | KeyCode::Up => props.selected.saturating_sub(1),
            KeyCode::Char('g') | KeyCode::Home => 0,
            KeyCode::Char('G') | KeyCode::End => len - 1,
            KeyCode::Enter => {
                let index = props.selected.min(len - 1);
                return props.entries[index]
                    .is_enabled()
                    .then(|| (props.on_activate)(index));
            }
            _ => return None,
        };

        (target != props.selected).then(|| (props.on_select)(target))
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        self.last_area = Some(area);

        let viewport_height = area.height.saturating_sub(2) as usize;
        self.ensure_visible(props.selected, viewport_height);

        let items: Vec<ListItem> = props
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let mut spans = vec![Span::raw(entry.title().to_string())];
                if let Some(c) = entry.shortcut() {
                    spans.push(Span::styled(
                        format!("  [{}]", c),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
                    .style(Self::entry_style(entry, i == props.selected))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(props.title)
                .borders(Borders::ALL)
                .border_style(if props.is_focused {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::DarkGray)
                }),
        );

        let mut state = ListState::default().with_offset(self.scroll_offset);
        frame.render_stateful_widget(list, area, &mut state);
        self.scroll_offset = state.offset();
    }
}
