//! Component trait for terminal widgets that emit messages

use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

/// A UI element that renders from props and turns keys into messages
///
/// Props carry everything needed to draw. `handle_key` never mutates the
/// catalogue: it returns messages (usually indexes or trigger activations)
/// for the caller to act on. Internal UI state such as the scroll offset
/// lives in `&mut self`.
///
/// # Example
///
/// ```ignore
/// impl Component<Msg> for ThreadList {
///     type Props<'a> = ThreadListProps<'a>;
///
///     fn handle_key(&mut self, key: &KeyEvent, props: Self::Props<'_>) -> impl IntoIterator<Item = Msg> {
///         match key.code {
///             KeyCode::Char('d') => Some(Msg::Delete(props.selected)),
///             _ => None,
///         }
///     }
///
///     fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
///         frame.render_widget(Paragraph::new(props.title), area);
///     }
/// }
/// ```
pub trait Component<M> {
    /// Data required to render the component (read-only)
    type Props<'a>;

    /// Handle a key press and return messages for the caller
    ///
    /// Returns `None`, `Some(msg)` or any other `IntoIterator`. The default
    /// returns nothing, for render-only components.
    #[allow(unused_variables)]
    fn handle_key(&mut self, key: &KeyEvent, props: Self::Props<'_>) -> impl IntoIterator<Item = M> {
        None::<M>
    }

    /// Draw into `area`
    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>);
}
