//! Screen layout.
//!
//! ```text
//! ● parley │ "Title" │ 2 messages │ → hints
//! ┌ Chats ─────┐┌ Title ──────────────────┐
//! │▌ Title     ││ You · Just now          │
//! │  Just now  ││ ...                     │
//! └────────────┘└─────────────────────────┘
//! ┌─────────────────────────────────────────┐
//! │> _                                      │
//! └─────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, StatefulWidget, Widget},
    Frame,
};

use crate::app::App;
use crate::widgets::{
    InputBar, Sidebar, StatusBar, StatusBarContent, Transcript, SIDEBAR_WIDTH,
};

/// Minimum terminal width.
pub const MIN_WIDTH: u16 = 40;
/// Minimum terminal height.
pub const MIN_HEIGHT: u16 = 10;

/// Draw the app into a frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    render(area, frame.buffer_mut(), app, Utc::now());
}

/// Render the app into `buf`, using `now` for relative timestamps.
pub fn render(area: Rect, buf: &mut Buffer, app: &mut App, now: DateTime<Utc>) {
    Block::default()
        .style(Style::default().bg(app.theme.base))
        .render(area, buf);

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let content = StatusBarContent::too_small();
        StatusBar::new(&content, &app.theme).render(area, buf);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(InputBar::height_for(&app.input)),
        ])
        .split(area);

    let content = app.status_content();
    StatusBar::new(&content, &app.theme).render(chunks[0], buf);

    let body = chunks[1];
    let transcript_area = if app.show_sidebar && body.width >= MIN_WIDTH + SIDEBAR_WIDTH {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(body);
        Sidebar::new(
            app.store.conversations(),
            app.store.current_id(),
            &app.theme,
            now,
        )
        .render(columns[0], buf);
        columns[1]
    } else {
        body
    };

    let mut state = app.transcript;
    Transcript::new(app.store.current(), &app.theme, now)
        .reveal(app.reveal_view())
        .thinking(app.thinking_here())
        .render(transcript_area, buf, &mut state);
    app.transcript = state;

    InputBar::new(&app.input, &app.theme)
        .waiting(app.is_waiting())
        .render(chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Action;
    use crate::test_utils::{create_test_app, render_app_to_string, TEST_HEIGHT, TEST_WIDTH};
    use crate::widgets::EMPTY_STATE;
    use insta::assert_snapshot;

    #[test]
    fn test_fresh_app_awaits_input() {
        let mut app = create_test_app();
        let text = render_app_to_string(&mut app, TEST_WIDTH, TEST_HEIGHT);
        assert!(text.contains(EMPTY_STATE));
        assert!(text.contains("\"New Chat\""));
        assert!(text.contains("0 messages"));
        assert!(text.contains("Type a message"));
    }

    #[test]
    fn test_sidebar_shown_on_wide_terminal() {
        let mut app = create_test_app();
        let text = render_app_to_string(&mut app, 100, TEST_HEIGHT);
        assert!(text.contains("Chats"));
    }

    #[test]
    fn test_sidebar_hidden_when_toggled_or_narrow() {
        let mut app = create_test_app();
        let narrow = render_app_to_string(&mut app, 60, TEST_HEIGHT);
        assert!(!narrow.contains("Chats"));

        app.handle_action(Action::ToggleSidebar);
        let wide = render_app_to_string(&mut app, 100, TEST_HEIGHT);
        assert!(!wide.contains("Chats"));
    }

    #[test]
    fn test_waiting_state_rendered() {
        let mut app = create_test_app();
        for c in "Hi".chars() {
            app.handle_action(Action::Insert(c));
        }
        app.handle_action(Action::Send);

        let text = render_app_to_string(&mut app, TEST_WIDTH, TEST_HEIGHT);
        assert!(text.contains("thinking..."));
        assert!(text.contains("Waiting for reply"));
        assert!(text.contains("\"Hi\""));
    }

    #[test]
    fn test_too_small_terminal() {
        let mut app = create_test_app();
        let text = render_app_to_string(&mut app, 36, 5);
        assert!(text.contains("too small"));
        assert!(!text.contains(EMPTY_STATE));
    }

    #[test]
    fn test_snapshot_status_line() {
        let mut app = create_test_app();
        app.show_sidebar = false;
        let text = render_app_to_string(&mut app, 60, MIN_HEIGHT);
        let status = text.lines().next().unwrap_or_default();
        assert_snapshot!(status, @r#"● parley │ "New Chat" │ 0 messages │ → ^K new  ^D delete  ^P"#);
    }
}
