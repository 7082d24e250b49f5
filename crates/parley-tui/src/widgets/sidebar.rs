//! Conversation list.

use chrono::{DateTime, Utc};
use parley_engine::{format_relative, Conversation};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::text::truncate_to_width;
use crate::theme::Theme;

/// Width of the sidebar including borders.
pub const SIDEBAR_WIDTH: u16 = 30;

/// Sidebar listing every conversation, current one highlighted.
///
/// Each entry takes two rows: the title, then the relative update time.
pub struct Sidebar<'a> {
    conversations: &'a [Conversation],
    current_id: Option<&'a str>,
    theme: &'a Theme,
    now: DateTime<Utc>,
}

impl<'a> Sidebar<'a> {
    pub fn new(
        conversations: &'a [Conversation],
        current_id: Option<&'a str>,
        theme: &'a Theme,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            conversations,
            current_id,
            theme,
            now,
        }
    }

    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let title_width = width.saturating_sub(2);
        let mut lines = Vec::with_capacity(self.conversations.len() * 2);

        for convo in self.conversations {
            let current = self.current_id == Some(convo.id.as_str());
            let (marker, title_style) = if current {
                (
                    "▌ ",
                    Style::default()
                        .fg(self.theme.primary)
                        .bg(self.theme.highlight)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("  ", Style::default().fg(self.theme.text))
            };

            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(self.theme.primary)),
                Span::styled(truncate_to_width(&convo.title, title_width), title_style),
            ]));
            lines.push(Line::from(Span::styled(
                format!("  {}", format_relative(convo.updated_at, self.now)),
                Style::default().fg(self.theme.muted),
            )));
        }
        lines
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Chats ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border));
        let inner = block.inner(area);
        let lines = self.lines(inner.width as usize);

        // Keep the current entry on screen.
        let selected_row = self
            .conversations
            .iter()
            .position(|c| self.current_id == Some(c.id.as_str()))
            .map_or(0, |i| i * 2 + 1);
        let visible = inner.height as usize;
        let offset = (selected_row + 1).saturating_sub(visible);

        Paragraph::new(lines)
            .block(block)
            .scroll((offset as u16, 0))
            .render(area, buf);
    }
}
