use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Events that can occur in the monitor TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Quit the application
    Quit,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    /// Jump to the first group
    Home,
    /// Jump to the last group
    End,
    /// No action
    None,
}

impl MonitorEvent {
    /// Map a key press to an event. Key releases are ignored.
    pub fn from_key(key: KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return MonitorEvent::None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                MonitorEvent::Quit
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => MonitorEvent::Quit,
            KeyCode::Up | KeyCode::Char('k') => MonitorEvent::ScrollUp,
            KeyCode::Down | KeyCode::Char('j') => MonitorEvent::ScrollDown,
            KeyCode::PageUp => MonitorEvent::PageUp,
            KeyCode::PageDown | KeyCode::Char(' ') => MonitorEvent::PageDown,
            KeyCode::Home | KeyCode::Char('g') => MonitorEvent::Home,
            KeyCode::End | KeyCode::Char('G') => MonitorEvent::End,
            _ => MonitorEvent::None,
        }
    }
}
