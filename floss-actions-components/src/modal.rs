//! Dialog overlay with background dimming
//!
//! Confirmation dialogs, error alerts and picker sheets are drawn on top of
//! the current frame. The frame is dimmed first so the dialog stands out
//! while the catalogue behind it keeps updating.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier},
    widgets::Widget,
    Frame,
};

/// Configuration for dialog appearance
#[derive(Debug, Clone, Copy)]
pub struct ModalStyle {
    /// Dim factor for background (0.0 = no dim, 1.0 = black)
    pub dim_factor: f32,
    /// Background color for the dialog area (None = transparent)
    pub bg_color: Option<Color>,
}

impl Default for ModalStyle {
    fn default() -> Self {
        Self {
            dim_factor: 0.5,
            bg_color: None,
        }
    }
}

impl ModalStyle {
    /// Style with a background color
    pub fn with_bg(bg_color: Color) -> Self {
        Self {
            bg_color: Some(bg_color),
            ..Default::default()
        }
    }
}

/// Dim everything rendered so far and clear the dialog area.
///
/// Call after the background has been drawn, then draw the dialog content
/// into `area`.
pub fn render_modal(frame: &mut Frame, area: Rect, style: &ModalStyle) {
    dim_buffer(frame.buffer_mut(), style.dim_factor);

    if let Some(bg) = style.bg_color {
        frame.render_widget(BgFill(bg), area);
    }
}

/// Scale every cell's colors toward black by `factor`.
pub fn dim_buffer(buffer: &mut Buffer, factor: f32) {
    let factor = factor.clamp(0.0, 1.0);
    if factor == 0.0 {
        return;
    }

    let area = buffer.area;
    for y in area.y..area.y.saturating_add(area.height) {
        for x in area.x..area.x.saturating_add(area.width) {
            let cell = &mut buffer[(x, y)];
            let fg = dim_color(cell.fg, factor);
            let bg = dim_color(cell.bg, factor);
            cell.set_fg(fg);
            cell.set_bg(bg);
            if matches!(cell.fg, Color::Reset) {
                cell.modifier.insert(Modifier::DIM);
            }
        }
    }
}

fn dim_color(color: Color, factor: f32) -> Color {
    let keep = 1.0 - factor;
    let scale = |c: u8| (c as f32 * keep) as u8;
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(scale(r), scale(g), scale(b)),
        Color::Reset => Color::Reset,
        Color::Black => Color::Black,
        Color::White | Color::Gray if factor < 0.5 => Color::Gray,
        Color::White | Color::Gray | Color::LightRed | Color::LightGreen | Color::LightYellow
        | Color::LightBlue | Color::LightMagenta | Color::LightCyan => Color::DarkGray,
        _ if factor >= 0.5 => Color::Black,
        other => other,
    }
}

/// Fills an area with a background color
struct BgFill(Color);

impl Widget for BgFill {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for y in area.y..area.y.saturating_add(area.height) {
            for x in area.x..area.x.saturating_add(area.width) {
                buf[(x, y)].set_bg(self.0);
                buf[(x, y)].set_symbol(" ");
            }
        }
    }
}

/// Centered rectangle within an area, kept one cell inside its edges
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Rectangle placed just below `anchor`, or above it when there is no room.
///
/// The result is shifted and clamped so it stays inside `bounds`.
pub fn anchored_rect(width: u16, height: u16, anchor: Rect, bounds: Rect) -> Rect {
    let width = width.min(bounds.width);
    let height = height.min(bounds.height);
    let right = bounds.x.saturating_add(bounds.width);
    let bottom = bounds.y.saturating_add(bounds.height);

    let below = anchor.y.saturating_add(anchor.height);
    let y = if below.saturating_add(height) <= bottom {
        below
    } else if anchor.y >= bounds.y.saturating_add(height) {
        anchor.y - height
    } else {
        bottom.saturating_sub(height)
    };

    let x = anchor.x.max(bounds.x).min(right.saturating_sub(width));
    Rect::new(x, y.max(bounds.y), width, height)
}
