//! Message transcript for the current conversation.
//!
//! ```text
//! ┌ Physics ─────────────────────────────┐
//! │ You · 2m ago                         │
//! │ Explain relativity                   │
//! │                                      │
//! │ Assistant · Just now  👍              │
//! │ Sure. **Special** relativity...▍     │
//! └──────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use parley_engine::{format_relative, Conversation, Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};

use crate::text::{render_markdown, wrap_lines, wrap_text};
use crate::theme::Theme;

/// Placeholder shown for a conversation with no messages.
pub const EMPTY_STATE: &str = "Awaiting input.";

const REVEAL_CURSOR: &str = "▍";
const ERROR_PREFIX: &str = "❌ Error:";

/// Scroll position, counted in lines up from the bottom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscriptState {
    pub scroll: u16,
    /// Largest useful `scroll` at the last render.
    pub max_scroll: u16,
}

impl TranscriptState {
    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Jump back to the newest messages.
    pub fn follow(&mut self) {
        self.scroll = 0;
    }
}

/// A message being revealed character by character.
#[derive(Debug, Clone, Copy)]
pub struct Reveal<'a> {
    pub message_id: &'a str,
    pub revealed: &'a str,
}

/// Transcript widget.
pub struct Transcript<'a> {
    conversation: Option<&'a Conversation>,
    reveal: Option<Reveal<'a>>,
    thinking: bool,
    theme: &'a Theme,
    now: DateTime<Utc>,
}

impl<'a> Transcript<'a> {
    pub fn new(
        conversation: Option<&'a Conversation>,
        theme: &'a Theme,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation,
            reveal: None,
            thinking: false,
            theme,
            now,
        }
    }

    /// Show `revealed` in place of the message's content.
    #[must_use]
    pub fn reveal(mut self, reveal: Option<Reveal<'a>>) -> Self {
        self.reveal = reveal;
        self
    }

    /// Show the thinking indicator below the last message.
    #[must_use]
    pub fn thinking(mut self, thinking: bool) -> Self {
        self.thinking = thinking;
        self
    }

    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let messages = self.conversation.map_or(&[][..], |c| c.messages.as_slice());
        if messages.is_empty() && !self.thinking {
            return vec![
                Line::default(),
                Line::from(Span::styled(
                    format!("  {EMPTY_STATE}"),
                    Style::default()
                        .fg(self.theme.muted)
                        .add_modifier(Modifier::ITALIC),
                )),
            ];
        }

        let mut lines = Vec::new();
        for message in messages {
            lines.extend(self.message_lines(message, width));
            lines.push(Line::default());
        }
        if self.thinking {
            lines.push(self.header(Role::Assistant, None, None));
            lines.push(Line::from(Span::styled(
                "● ● ● thinking...",
                Style::default().fg(self.theme.muted),
            )));
        }
        wrap_lines(lines, width)
    }

    fn message_lines(&self, message: &Message, width: usize) -> Vec<Line<'static>> {
        let mut lines = vec![self.header(
            message.role,
            Some(message.timestamp),
            message.reaction.map(|r| r.emoji()),
        )];

        let revealing = self
            .reveal
            .filter(|r| r.message_id == message.id && message.is_typing);
        let body = revealing.map_or(message.content.as_str(), |r| r.revealed);

        let mut body_lines = match message.role {
            Role::User => plain_lines(body, Style::default().fg(self.theme.text), width),
            Role::Assistant if body.starts_with(ERROR_PREFIX) => {
                plain_lines(body, Style::default().fg(self.theme.error), width)
            }
            Role::Assistant => render_markdown(body, self.theme),
        };

        if revealing.is_some() {
            let cursor = Span::styled(REVEAL_CURSOR, Style::default().fg(self.theme.primary));
            match body_lines.last_mut() {
                Some(last) => last.spans.push(cursor),
                None => body_lines.push(Line::from(cursor)),
            }
        }

        lines.extend(body_lines);
        lines
    }

    fn header(
        &self,
        role: Role,
        timestamp: Option<DateTime<Utc>>,
        reaction: Option<&'static str>,
    ) -> Line<'static> {
        let color = match role {
            Role::User => self.theme.user,
            Role::Assistant => self.theme.assistant,
        };
        let mut spans = vec![Span::styled(
            role.label(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )];
        if let Some(ts) = timestamp {
            spans.push(Span::styled(
                format!(" · {}", format_relative(ts, self.now)),
                Style::default().fg(self.theme.muted),
            ));
        }
        if let Some(emoji) = reaction {
            spans.push(Span::raw(format!("  {emoji}")));
        }
        Line::from(spans)
    }
}

fn plain_lines(text: &str, style: Style, width: usize) -> Vec<Line<'static>> {
    wrap_text(text, width)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, style)))
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
impl StatefulWidget for Transcript<'_> {
    type State = TranscriptState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut TranscriptState) {
        let title = self
            .conversation
            .map_or_else(|| " parley ".to_string(), |c| format!(" {} ", c.title));
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border));
        let inner = block.inner(area);

        let lines = self.lines(inner.width as usize);
        let visible = inner.height as usize;
        let max_scroll = lines.len().saturating_sub(visible);
        state.max_scroll = max_scroll.min(u16::MAX as usize) as u16;
        state.scroll = state.scroll.min(state.max_scroll);
        let top = max_scroll - state.scroll as usize;

        Paragraph::new(lines)
            .block(block)
            .scroll((top.min(u16::MAX as usize) as u16, 0))
            .render(area, buf);
    }
}
