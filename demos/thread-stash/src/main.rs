//! Thread Stash - floss-actions demo
//!
//! A catalogue of embroidery threads where every change is an action:
//! - Enter/m: open the action menu for the highlighted thread
//! - s: toggle in stock (sync, undoable)
//! - a: add to shopping list (async, completes after a delay)
//! - d: delete (destructive, asks first)
//! - i: show details (presents a sheet)
//! - e: export (reactive, single value)
//! - j/k: move, q: quit
//!
//! Logs go to a file (`--log-file`), filtered by `RUST_LOG`.

mod actions;
mod catalog;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use floss_actions::prelude::*;
use floss_actions::{ActionRecord, Area, MenuEntry};
use floss_actions_components::{
    anchored_rect, ActionMenu, ActionMenuProps, Component, DialogKey, TerminalPresenter,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::actions::{AddToShoppingList, DeleteThread, ExportStash, MarkInStock, ShowDetails};
use crate::catalog::{Catalog, Thread, UndoLabels};

#[derive(Parser, Debug)]
#[command(name = "thread-stash")]
#[command(about = "Embroidery thread catalogue built on floss-actions")]
struct Args {
    /// JSON file holding the stash (created on first save)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Runner configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write logs
    #[arg(long, default_value = "thread-stash.log")]
    log_file: PathBuf,

    /// Delay for the simulated shopping list round trip, in milliseconds
    #[arg(long, default_value_t = 600)]
    delay_ms: u64,
}

fn init_logging(path: &PathBuf) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// Forwards every outcome to the status bar.
struct StatusMiddleware {
    tx: mpsc::UnboundedSender<String>,
}

impl Middleware for StatusMiddleware {
    fn before(&self, _record: &ActionRecord) {}

    fn after(&self, record: &ActionRecord, outcome: &Outcome) {
        let _ = self.tx.send(format!("{}: {}", record.name, outcome));
    }
}

/// Poll crossterm on a background task and forward key presses.
fn spawn_key_poller(
    tx: mpsc::UnboundedSender<KeyEvent>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_millis(16)) => {
                    while event::poll(Duration::ZERO).unwrap_or(false) {
                        match event::read() {
                            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                                if tx.send(key).is_err() {
                                    tracing::debug!("key channel closed, stopping poller");
                                    return;
                                }
                            }
                            Ok(_) => {}
                            Err(e) => tracing::warn!(error = %e, "failed to read terminal event"),
                        }
                    }
                }
            }
        }
    })
}

#[derive(Debug, PartialEq)]
enum MenuMsg {
    Select(usize),
    Activate(usize),
}

struct App {
    catalog: Arc<Catalog>,
    undo: Arc<UndoLabels>,
    runner: ActionRunner,
    presenter: Arc<TerminalPresenter>,
    delay: Duration,
    threads: Vec<Thread>,
    selected: usize,
    list_area: Rect,
    menu: Option<OpenMenu>,
    status: String,
    quit: bool,
}

struct OpenMenu {
    thread: u32,
    entries: Vec<MenuEntry>,
    selected: usize,
    widget: ActionMenu,
}

impl App {
    fn selected_thread(&self) -> Option<&Thread> {
        self.threads.get(self.selected)
    }

    fn refresh(&mut self) {
        self.threads = self.catalog.threads();
        if self.selected >= self.threads.len() {
            self.selected = self.threads.len().saturating_sub(1);
        }
    }

    /// Source hint for the highlighted row.
    fn row_hint(&self) -> SourceHint {
        let hint = SourceHint::named(format!("thread-list:{}", self.selected));
        let row = self.list_area.y + 1 + self.selected as u16;
        if row + 1 < self.list_area.y + self.list_area.height {
            hint.with_area(Area::new(
                self.list_area.x + 1,
                row,
                self.list_area.width.saturating_sub(2),
                1,
            ))
        } else {
            hint
        }
    }

    fn bound_actions(&self, thread: &Thread) -> Vec<MenuEntry> {
        let runner = &self.runner;
        let catalog = &self.catalog;
        let stock_title = if thread.in_stock {
            "Mark Out of Stock"
        } else {
            "Mark In Stock"
        };

        vec![
            BoundAction::new(
                runner,
                MarkInStock {
                    catalog: catalog.clone(),
                    id: thread.id,
                    in_stock: !thread.in_stock,
                },
                stock_title,
            )
            .menu_entry()
            .with_shortcut('s'),
            BoundAction::new(
                runner,
                AddToShoppingList {
                    catalog: catalog.clone(),
                    id: thread.id,
                    delay: self.delay,
                },
                "Add to Shopping List",
            )
            .menu_entry()
            .with_shortcut('a'),
            BoundAction::new(
                runner,
                ShowDetails {
                    catalog: catalog.clone(),
                    id: thread.id,
                },
                "Details",
            )
            .menu_entry()
            .with_shortcut('i'),
            BoundAction::new(
                runner,
                DeleteThread {
                    catalog: catalog.clone(),
                    id: thread.id,
                },
                "Delete",
            )
            .menu_entry()
            .with_shortcut('d'),
        ]
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.presenter.handle_key(&key) != DialogKey::Ignored {
            return;
        }

        if let Some(menu) = self.menu.as_mut() {
            if key.code == KeyCode::Esc || key.code == KeyCode::Char('q') {
                self.menu = None;
                return;
            }
            let msgs: Vec<MenuMsg> = menu
                .widget
                .handle_key(
                    &key,
                    ActionMenuProps {
                        entries: &menu.entries,
                        selected: menu.selected,
                        is_focused: true,
                        title: "",
                        on_select: MenuMsg::Select,
                        on_activate: MenuMsg::Activate,
                    },
                )
                .into_iter()
                .collect();
            for msg in msgs {
                match msg {
                    MenuMsg::Select(i) => menu.selected = i,
                    MenuMsg::Activate(i) => {
                        let hint = menu
                            .widget
                            .source_hint(i, format!("thread-menu:{}", menu.thread));
                        menu.entries[i].activate(Some(hint));
                        self.menu = None;
                        break;
                    }
                }
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected = (self.selected + 1).min(self.threads.len().saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Char('e') => {
                let summary_presenter = self.presenter.clone();
                self.runner
                    .request(ExportStash {
                        catalog: self.catalog.clone(),
                    })
                    .on_complete(move |result| {
                        if let Ok(summary) = result {
                            summary_presenter.present(Surface::new("Export", summary), None);
                        }
                    })
                    .perform();
            }
            KeyCode::Enter | KeyCode::Char('m') => {
                if let Some(thread) = self.selected_thread().cloned() {
                    self.menu = Some(OpenMenu {
                        thread: thread.id,
                        entries: self.bound_actions(&thread),
                        selected: 0,
                        widget: ActionMenu::new(),
                    });
                }
            }
            KeyCode::Char(c) => {
                let Some(thread) = self.selected_thread().cloned() else {
                    return;
                };
                let hint = self.row_hint();
                if let Some(entry) = self
                    .bound_actions(&thread)
                    .into_iter()
                    .find(|entry| entry.shortcut() == Some(c))
                {
                    entry.activate(Some(hint));
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let [list_area, side_area, status_area] = {
            let [main, status] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(frame.area());
            let [list, side] =
                Layout::horizontal([Constraint::Fill(2), Constraint::Fill(1)]).areas(main);
            [list, side, status]
        };
        self.list_area = list_area;

        let items: Vec<ListItem> = self
            .threads
            .iter()
            .map(|thread| {
                let marker = if thread.in_stock {
                    Span::styled("● ", Style::default().fg(Color::Green))
                } else {
                    Span::styled("○ ", Style::default().fg(Color::DarkGray))
                };
                ListItem::new(Line::from(vec![marker, Span::raw(thread.label())]))
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(" Stash ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, list_area, &mut state);

        let shopping: Vec<Line> = self
            .catalog
            .shopping_list()
            .into_iter()
            .map(|(label, qty)| Line::raw(format!("{} x {}", qty, label)))
            .collect();
        frame.render_widget(
            Paragraph::new(shopping).block(
                Block::default()
                    .title(" Shopping List ")
                    .borders(Borders::ALL),
            ),
            side_area,
        );

        let undo = self
            .undo
            .last()
            .map(|label| format!("  |  last undo group: {}", label))
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(format!("{}{}", self.status, undo))
                .style(Style::default().fg(Color::DarkGray)),
            status_area,
        );

        let anchor = self.row_hint().area.unwrap_or_default();
        let title = format!(
            " {} ",
            self.selected_thread().map(|t| t.code.as_str()).unwrap_or("")
        );
        if let Some(menu) = self.menu.as_mut() {
            let height = menu.entries.len() as u16 + 2;
            let area = anchored_rect(
                30,
                height,
                Rect::new(anchor.x + 4, anchor.y, anchor.width, anchor.height),
                frame.area(),
            );
            frame.render_widget(Clear, area);
            menu.widget.render(
                frame,
                area,
                ActionMenuProps {
                    entries: &menu.entries,
                    selected: menu.selected,
                    is_focused: true,
                    title: &title,
                    on_select: MenuMsg::Select,
                    on_activate: MenuMsg::Activate,
                },
            );
        }

        self.presenter.render(frame);
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let catalog = match &args.data {
        Some(path) => Catalog::open(path).map_err(io::Error::other)?,
        None => Catalog::sample(),
    };
    let config = match &args.config {
        Some(path) => RunnerConfig::from_path(path)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?,
        None => RunnerConfig::default(),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, Arc::new(catalog), config, args.delay_ms).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    catalog: Arc<Catalog>,
    config: RunnerConfig,
    delay_ms: u64,
) -> io::Result<()> {
    let mut ui = UiQueue::new();
    let presenter = Arc::new(TerminalPresenter::new());
    let undo = Arc::new(UndoLabels::default());
    let (status_tx, mut status_rx) = mpsc::unbounded_channel();

    let runner = ActionRunner::builder(catalog.clone(), ui.handle())
        .presenter(presenter.clone())
        .undo_history(undo.clone())
        .middleware(StatusMiddleware { tx: status_tx })
        .config(config)
        .build();

    let (key_tx, mut key_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let _poller = spawn_key_poller(key_tx, cancel.clone());

    let mut app = App {
        threads: catalog.threads(),
        catalog,
        undo,
        runner: runner.clone(),
        presenter,
        delay: Duration::from_millis(delay_ms),
        selected: 0,
        list_area: Rect::default(),
        menu: None,
        status: "Enter: actions  s/a/d/i: shortcuts  e: export  q: quit".to_string(),
        quit: false,
    };
    tracing::info!(threads = app.threads.len(), "thread stash started");

    while !app.quit {
        app.refresh();
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            Some(key) = key_rx.recv() => app.handle_key(key),
            Some(job) = ui.recv() => job.run(),
            Some(status) = status_rx.recv() => app.status = status,
        }
    }

    runner.shutdown();
    ui.drain();
    cancel.cancel();
    if let Some(log) = runner.action_log() {
        for entry in log.recent(10) {
            tracing::info!(
                action = entry.name,
                outcome = ?entry.outcome,
                elapsed = %entry.elapsed_display(),
                "recent action"
            );
        }
    }
    tracing::info!("thread stash stopped");
    Ok(())
}
