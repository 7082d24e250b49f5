//! Event handling for the parley TUI.

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent,
    MouseEventKind,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// Lines moved per PageUp/PageDown.
const PAGE: u16 = 10;

/// Events that can occur in the TUI.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// A mouse event occurred.
    Mouse(MouseEvent),
    /// No input arrived within the tick interval.
    Tick,
    /// Terminal was resized.
    Resize(u16, u16),
}

/// Forwards terminal events from a polling thread.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Start polling; a [`Event::Tick`] is sent whenever `tick_rate` passes
    /// without input.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let forward = tx.clone();

        // crossterm polling blocks, so it gets its own thread
        std::thread::spawn(move || loop {
            let event = match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(CrosstermEvent::Key(key)) => Some(Event::Key(key)),
                    Ok(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                    Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                    _ => None,
                },
                _ => Some(Event::Tick),
            };
            if let Some(event) = event {
                if forward.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Wait for the next event.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Something the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Send,
    Newline,
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    NewChat,
    DeleteChat,
    PrevChat,
    NextChat,
    ReactUp,
    ReactDown,
    ToggleSidebar,
    CycleTheme,
    ScrollUp(u16),
    ScrollDown(u16),
    None,
}

/// Map a key press to an action.
pub fn key_to_action(key: KeyEvent) -> Action {
    if key.kind == KeyEventKind::Release {
        return Action::None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            KeyCode::Char('k') => Action::NewChat,
            KeyCode::Char('d') => Action::DeleteChat,
            KeyCode::Char('p') => Action::PrevChat,
            KeyCode::Char('n') => Action::NextChat,
            KeyCode::Char('y') => Action::ReactUp,
            KeyCode::Char('x') => Action::ReactDown,
            KeyCode::Char('b') => Action::ToggleSidebar,
            KeyCode::Char('t') => Action::CycleTheme,
            KeyCode::Char('j') | KeyCode::Enter => Action::Newline,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
        {
            Action::Newline
        }
        KeyCode::Enter => Action::Send,
        KeyCode::Char(c) => Action::Insert(c),
        KeyCode::Tab => Action::Insert('\t'),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::Up => Action::ScrollUp(1),
        KeyCode::Down => Action::ScrollDown(1),
        KeyCode::PageUp => Action::ScrollUp(PAGE),
        KeyCode::PageDown => Action::ScrollDown(PAGE),
        _ => Action::None,
    }
}

/// Map a mouse event to an action.
pub fn mouse_to_action(mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::ScrollUp => Action::ScrollUp(3),
        MouseEventKind::ScrollDown => Action::ScrollDown(3),
        _ => Action::None,
    }
}
