//! Test helpers for rendering the parley TUI into strings.

use chrono::Utc;
use ratatui::{backend::TestBackend, buffer::Buffer, layout::Rect, Terminal};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::layout;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Create a test terminal with the default dimensions (80x24).
pub fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(TEST_WIDTH, TEST_HEIGHT);
    Terminal::new(backend).expect("Failed to create test terminal")
}

/// Create an app over an in-memory store.
pub fn create_test_app() -> App {
    App::new_for_test()
}

/// Convert a buffer to text, one line per row.
///
/// Cells covered by a wide symbol are skipped, and trailing spaces on each
/// row are trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut rows = Vec::with_capacity(area.height as usize);

    for y in area.y..area.y + area.height {
        let mut row = String::new();
        let mut x = area.x;
        while x < area.x + area.width {
            let symbol = buffer.cell((x, y)).map_or(" ", |c| c.symbol());
            row.push_str(symbol);
            let width = u16::try_from(symbol.width()).unwrap_or(1).max(1);
            x = x.saturating_add(width);
        }
        rows.push(row.trim_end_matches(' ').to_string());
    }

    rows.join("\n")
}

/// Render the whole app at the given size.
pub fn render_app_to_string(app: &mut App, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    layout::render(area, &mut buffer, app, Utc::now());
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Style;

    #[test]
    fn test_create_test_terminal() {
        let terminal = create_test_terminal();
        let size = terminal.size().unwrap();
        assert_eq!(size.width, TEST_WIDTH);
        assert_eq!(size.height, TEST_HEIGHT);
    }

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", Style::default());
        buffer.set_string(0, 1, "World", Style::default());

        assert_eq!(buffer_to_string(&buffer), "Hello\nWorld\n");
    }

    #[test]
    fn test_buffer_to_string_skips_wide_cells() {
        let area = Rect::new(0, 0, 12, 1);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "👍 ok", Style::default());

        assert_eq!(buffer_to_string(&buffer), "👍 ok");
    }

    #[test]
    fn test_render_app_to_string() {
        let mut app = create_test_app();
        let text = render_app_to_string(&mut app, TEST_WIDTH, TEST_HEIGHT);
        assert!(text.contains("parley"));
    }
}
