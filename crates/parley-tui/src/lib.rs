//! parley-tui: Terminal UI for the parley chat shell
//!
//! This crate provides the interactive layer for parley:
//! - Conversation sidebar and transcript with markdown replies
//! - Character-by-character reveal of fresh replies
//! - Reactions and conversation switching from the keyboard

mod app;
mod event;
mod layout;
#[cfg(test)]
pub mod test_utils;
mod text;
mod theme;
mod widgets;

pub use app::{App, Submission};
pub use event::{Action, Event, EventHandler};
pub use parley_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parley_engine::{
    store_dir, Config, ConversationStore, FileStore, HttpReplyClient, KeyValueStore, ReplyClient,
    ReplyError,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Shortest tick the event loop will run at.
const MIN_TICK: Duration = Duration::from_millis(5);

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the TUI over the conversations stored under `data_dir`.
///
/// Sets up the terminal, runs the event loop, and restores the terminal on
/// exit.
pub async fn run_tui(data_dir: &Path, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Box<dyn KeyValueStore> = Box::new(FileStore::new(store_dir(data_dir))?);
    let mut store = ConversationStore::with_key(backend, config.storage_key.clone());
    let bootstrap = store.initialize();
    info!(?bootstrap, "Conversation store ready");

    let client: Arc<dyn ReplyClient> = Arc::new(HttpReplyClient::from_config(&config)?);
    let mut app = App::new(store, &config);

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut events = EventHandler::new(config.typing_interval().max(MIN_TICK));

    let result = run_loop(&mut terminal, &mut app, &mut events, &client).await;

    app.shutdown();
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    client: &Arc<dyn ReplyClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reply: Option<JoinHandle<Result<String, ReplyError>>> = None;

    loop {
        app.on_tick(Instant::now());
        terminal.draw(|frame| layout::draw(frame, app))?;

        if let Some(event) = events.next().await {
            let action = match event {
                Event::Key(key) => event::key_to_action(key),
                Event::Mouse(mouse) => event::mouse_to_action(mouse),
                Event::Tick | Event::Resize(_, _) => Action::None,
            };
            if let Some(submission) = app.handle_action(action) {
                debug!(conversation_id = %submission.conversation_id, "Requesting reply");
                let client = Arc::clone(client);
                reply = Some(tokio::spawn(async move {
                    client.reply(&submission.text).await
                }));
            }
        }

        // Settle a finished reply without blocking the loop
        if reply.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = reply.take() {
                let outcome = handle
                    .await
                    .unwrap_or_else(|e| Err(ReplyError::Task(e.to_string())));
                app.complete_reply(outcome, Instant::now());
            }
        }

        if app.should_quit {
            if let Some(handle) = reply.take() {
                handle.abort();
            }
            break;
        }
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
