//! Message composer at the bottom of the screen.
//!
//! Enter sends; Alt+Enter or Ctrl+J inserts a newline. While a reply is
//! pending the bar shows a waiting line instead of the editor.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

/// Most input lines shown before the bar scrolls.
pub const MAX_VISIBLE_LINES: u16 = 6;

/// Editable text with a cursor counted in characters.
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    content: String,
    /// Cursor position as a char index into `content`.
    cursor: usize,
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True when there is nothing worth sending.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Number of display lines.
    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }

    /// Take the content, leaving the input empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    /// Start of the cursor's line.
    pub fn move_home(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.cursor = self.line_start(line);
    }

    /// End of the cursor's line.
    pub fn move_end(&mut self) {
        let (line, _) = self.cursor_line_col();
        let len = self
            .content
            .split('\n')
            .nth(line)
            .map_or(0, |l| l.chars().count());
        self.cursor = self.line_start(line) + len;
    }

    /// Line index and column of the cursor.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for ch in self.content.chars().take(self.cursor) {
            if ch == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    fn line_start(&self, line: usize) -> usize {
        self.content
            .split('\n')
            .take(line)
            .map(|l| l.chars().count() + 1)
            .sum()
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map_or(self.content.len(), |(i, _)| i)
    }
}

/// Input bar widget.
pub struct InputBar<'a> {
    input: &'a TextInputState,
    theme: &'a Theme,
    waiting: bool,
}

impl<'a> InputBar<'a> {
    pub fn new(input: &'a TextInputState, theme: &'a Theme) -> Self {
        Self {
            input,
            theme,
            waiting: false,
        }
    }

    /// Show the waiting line instead of the editor.
    #[must_use]
    pub fn waiting(mut self, waiting: bool) -> Self {
        self.waiting = waiting;
        self
    }

    /// Height the bar wants for the current content, borders included.
    #[allow(clippy::cast_possible_truncation)]
    pub fn height_for(input: &TextInputState) -> u16 {
        let lines = input.line_count().min(MAX_VISIBLE_LINES as usize) as u16;
        lines.max(1) + 2
    }

    fn editor_lines(&self) -> Vec<Line<'static>> {
        let (cursor_line, cursor_col) = self.input.cursor_line_col();
        let muted = Style::default().fg(self.theme.muted);
        let cursor = Style::default().fg(self.theme.primary);

        self.input
            .content()
            .split('\n')
            .enumerate()
            .map(|(idx, text)| {
                let prefix = if idx == 0 { "> " } else { "  " };
                let mut spans = vec![Span::styled(prefix, muted)];
                if idx == cursor_line {
                    let split = text
                        .char_indices()
                        .nth(cursor_col)
                        .map_or(text.len(), |(i, _)| i);
                    spans.push(Span::raw(text[..split].to_string()));
                    spans.push(Span::styled("█", cursor));
                    spans.push(Span::raw(text[split..].to_string()));
                } else {
                    spans.push(Span::raw(text.to_string()));
                }
                if idx == 0 && self.input.content().is_empty() {
                    spans.push(Span::styled(
                        "Type a message (Enter to send, Alt+Enter for newline)",
                        muted,
                    ));
                }
                Line::from(spans)
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.waiting {
            self.theme.border
        } else {
            self.theme.border_focused
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        if self.waiting {
            Paragraph::new("● Waiting for reply...")
                .block(block)
                .style(Style::default().fg(self.theme.muted))
                .render(area, buf);
            return;
        }

        let inner_height = area.height.saturating_sub(2) as usize;
        let (cursor_line, _) = self.input.cursor_line_col();
        let offset = cursor_line.saturating_sub(inner_height.saturating_sub(1));

        Paragraph::new(self.editor_lines())
            .block(block)
            .style(Style::default().fg(self.theme.text))
            .scroll((offset as u16, 0))
            .render(area, buf);
    }
}
