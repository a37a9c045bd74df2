use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use tokio::sync::watch;

use crate::core::config::Config;
use crate::core::system_monitor::RenderSnapshot;
use crate::ui::theme::Theme;

use super::event_handler::MonitorEvent;
use super::render::render_ui;

/// How long to wait for input before checking for a new snapshot.
const INPUT_POLL: Duration = Duration::from_millis(200);

/// Monitor application state
pub struct MonitorApp {
    snapshot: Arc<RenderSnapshot>,
    pub theme: Theme,
    pub date_format: String,
    pub quit_hint: String,
    /// First content line shown.
    pub scroll: usize,
    /// Content lines that fit between header and footer.
    pub viewport_rows: usize,
    pub should_quit: bool,
}

impl MonitorApp {
    pub fn new(config: MonitorAppConfig, snapshot: Arc<RenderSnapshot>) -> Self {
        Self {
            snapshot,
            theme: config.theme,
            date_format: config.date_format,
            quit_hint: config.quit_hint,
            scroll: 0,
            viewport_rows: 0,
            should_quit: false,
        }
    }

    pub fn snapshot(&self) -> &RenderSnapshot {
        &self.snapshot
    }

    /// Swap in a newer snapshot, keeping the scroll position valid.
    pub fn set_snapshot(&mut self, snapshot: Arc<RenderSnapshot>) {
        self.snapshot = snapshot;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Lines of content: each group name, its rows and a blank separator.
    pub fn content_height(&self) -> usize {
        self.snapshot
            .groups
            .iter()
            .map(|group| group.rows.len() + 2)
            .sum()
    }

    pub fn max_scroll(&self) -> usize {
        self.content_height().saturating_sub(self.viewport_rows)
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: MonitorEvent) {
        let page = self.viewport_rows.max(1);
        match event {
            MonitorEvent::Quit => self.should_quit = true,
            MonitorEvent::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            MonitorEvent::ScrollDown => self.scroll = (self.scroll + 1).min(self.max_scroll()),
            MonitorEvent::PageUp => self.scroll = self.scroll.saturating_sub(page),
            MonitorEvent::PageDown => self.scroll = (self.scroll + page).min(self.max_scroll()),
            MonitorEvent::Home => self.scroll = 0,
            MonitorEvent::End => self.scroll = self.max_scroll(),
            MonitorEvent::None => {}
        }
    }
}

/// Configuration for the monitor app
#[derive(Debug, Clone)]
pub struct MonitorAppConfig {
    pub theme: Theme,
    pub date_format: String,
    pub quit_hint: String,
}

impl From<&Config> for MonitorAppConfig {
    fn from(config: &Config) -> Self {
        Self {
            theme: Theme::from_palette(&config.palette),
            date_format: config.date_format.clone(),
            quit_hint: config.quit_hint.clone(),
        }
    }
}

impl Default for MonitorAppConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Run the monitor TUI until the user quits.
///
/// Snapshots are taken from `snapshot_rx` as they are published; the screen
/// is redrawn on every input poll so the footer clock keeps running.
pub fn run_monitor_app(
    config: MonitorAppConfig,
    mut snapshot_rx: watch::Receiver<Arc<RenderSnapshot>>,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let initial = snapshot_rx.borrow_and_update().clone();
    let mut app = MonitorApp::new(config, initial);

    let result = event_loop(&mut terminal, &mut app, &mut snapshot_rx);

    // Restore terminal even when the loop failed
    let restored = restore_terminal(terminal.backend_mut());

    result.and(restored)
}

/// Undo raw mode, the alternate screen and the hidden cursor. Every step
/// runs; the first failure is reported.
fn restore_terminal<W: io::Write>(backend: &mut CrosstermBackend<W>) -> Result<()> {
    let raw = disable_raw_mode().context("Failed to disable raw mode");
    let screen =
        execute!(backend, LeaveAlternateScreen).context("Failed to leave alternate screen");
    let cursor = backend.show_cursor().context("Failed to show cursor");

    raw.and(screen).and(cursor)
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut MonitorApp,
    snapshot_rx: &mut watch::Receiver<Arc<RenderSnapshot>>,
) -> Result<()> {
    loop {
        // A closed channel means the update thread is gone; keep the last view.
        if snapshot_rx.has_changed().unwrap_or(false) {
            app.set_snapshot(snapshot_rx.borrow_and_update().clone());
        }

        let size = terminal.size().context("Failed to read terminal size")?;
        app.viewport_rows = size.height.saturating_sub(2) as usize;

        terminal.draw(|frame| render_ui(frame, app))?;

        if event::poll(INPUT_POLL).context("Event poll failed")? {
            if let Event::Key(key) = event::read().context("Event read failed")? {
                app.handle_event(MonitorEvent::from_key(key));
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
