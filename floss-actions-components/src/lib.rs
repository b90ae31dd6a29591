//! Terminal components for floss-actions
//!
//! - [`TerminalPresenter`] - [`Presenter`](floss_actions_core::Presenter)
//!   that draws confirmation dialogs, error alerts and sheets as modals
//! - [`ActionMenu`] - scrollable menu of bound action triggers
//! - [`render_modal`] / [`anchored_rect`] - dimmed overlays positioned from a
//!   trigger's source hint
//!
//! # Example
//!
//! ```ignore
//! let presenter = Arc::new(TerminalPresenter::new());
//! let runner = ActionRunner::builder(catalog.clone(), ui.handle())
//!     .presenter(presenter.clone())
//!     .build();
//!
//! // key handling: dialogs first
//! if presenter.handle_key(&key) == DialogKey::Ignored {
//!     for msg in menu.handle_key(&key, props) {
//!         if let Msg::Activate(i) = msg {
//!             entries[i].activate(Some(menu.source_hint(i, "thread-menu")));
//!         }
//!     }
//! }
//!
//! // drawing: dialogs last
//! menu.render(frame, area, props);
//! presenter.render(frame);
//! ```

mod action_menu;
mod component;
mod modal;
mod presenter;
pub mod testing;

pub use action_menu::{ActionMenu, ActionMenuProps};
pub use component::Component;
pub use modal::{anchored_rect, centered_rect, dim_buffer, render_modal, ModalStyle};
pub use presenter::{DialogKey, TerminalPresenter};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        anchored_rect, centered_rect, render_modal, ActionMenu, ActionMenuProps, Component,
        DialogKey, ModalStyle, TerminalPresenter,
    };
}
