//! Status bar widget for the top of the TUI.
//!
//! Format: `● parley │ "Title" │ 4 messages │ state │ → hints`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::Theme;

/// Status bar content.
#[derive(Debug, Clone, Default)]
pub struct StatusBarContent {
    /// Current conversation title.
    pub title: String,
    /// Messages in the current conversation.
    pub message_count: usize,
    /// Transient activity ("thinking", "typing").
    pub activity: Option<String>,
    /// Key hints.
    pub hint: Option<String>,
}

impl StatusBarContent {
    /// Shown when the terminal is below the minimum size.
    pub fn too_small() -> Self {
        Self {
            title: "Terminal too small".into(),
            message_count: 0,
            activity: None,
            hint: Some("Resize to at least 40x10".into()),
        }
    }

    fn count_label(&self) -> String {
        match self.message_count {
            1 => "1 message".to_string(),
            n => format!("{n} messages"),
        }
    }
}

/// Status bar widget.
pub struct StatusBar<'a> {
    content: &'a StatusBarContent,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(content: &'a StatusBarContent, theme: &'a Theme) -> Self {
        Self { content, theme }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let sep = || Span::styled(" │ ", Style::default().fg(self.theme.muted));

        let mut spans = vec![
            Span::styled("● ", Style::default().fg(self.theme.primary)),
            Span::styled("parley", Style::default().fg(self.theme.text)),
            sep(),
            Span::styled(
                format!("\"{}\"", self.content.title),
                Style::default().fg(self.theme.text),
            ),
            sep(),
            Span::styled(
                self.content.count_label(),
                Style::default().fg(self.theme.subtext),
            ),
        ];

        if let Some(ref activity) = self.content.activity {
            spans.push(sep());
            spans.push(Span::styled(
                activity.as_str(),
                Style::default().fg(self.theme.info),
            ));
        }

        if let Some(ref hint) = self.content.hint {
            spans.push(sep());
            spans.push(Span::styled(
                format!("→ {hint}"),
                Style::default().fg(self.theme.secondary),
            ));
        }

        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    fn render(content: &StatusBarContent) -> String {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new(content, &theme).render(area, &mut buf);
        buffer_to_string(&buf)
    }

    #[test]
    fn test_renders_title_and_count() {
        let content = StatusBarContent {
            title: "New Chat".into(),
            message_count: 1,
            ..StatusBarContent::default()
        };
        let text = render(&content);
        assert!(text.contains("\"New Chat\""));
        assert!(text.contains("1 message"));
        assert!(!text.contains("1 messages"));
    }

    #[test]
    fn test_renders_activity_and_hint() {
        let content = StatusBarContent {
            title: "Physics".into(),
            message_count: 4,
            activity: Some("thinking".into()),
            hint: Some("^K new".into()),
        };
        let text = render(&content);
        assert!(text.contains("4 messages"));
        assert!(text.contains("thinking"));
        assert!(text.contains("→ ^K new"));
    }

    #[test]
    fn test_too_small_content() {
        let content = StatusBarContent::too_small();
        assert!(content.title.contains("too small"));
        assert!(content.hint.is_some());
    }
}
