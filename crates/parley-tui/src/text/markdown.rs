//! Markdown rendering with pulldown-cmark.
//!
//! Message content is opaque markdown. Rendering is lossy on purpose for a
//! terminal: tables, images and raw HTML are reduced to their text.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

use super::styles::MarkdownStyles;
use crate::theme::Theme;

/// Render markdown into styled Lines (unwrapped).
pub fn render_markdown(input: &str, theme: &Theme) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(MarkdownStyles::from_theme(theme));
    for event in Parser::new_ext(input, options) {
        renderer.event(event);
    }
    renderer.finish()
}

/// A list being rendered: `Some(n)` numbers items from `n`.
struct ListFrame {
    next_number: Option<u64>,
}

struct Renderer {
    styles: MarkdownStyles,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    inline: Vec<Style>,
    lists: Vec<ListFrame>,
    quote_depth: usize,
    in_code_block: bool,
    /// Marker to emit before the first text of the current item.
    marker: Option<String>,
}

impl Renderer {
    fn new(styles: MarkdownStyles) -> Self {
        Self {
            styles,
            lines: Vec::new(),
            spans: Vec::new(),
            inline: Vec::new(),
            lists: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            marker: None,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.code_block_text(&text);
                } else {
                    self.push_text(&text, self.style());
                }
            }
            Event::Code(code) => self.push_text(&format!("`{code}`"), self.styles.code),
            Event::SoftBreak => self.push_text(" ", self.style()),
            Event::HardBreak => self.break_line(),
            Event::Rule => {
                self.break_line();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(24), self.styles.rule)));
                self.blank();
            }
            Event::TaskListMarker(done) => {
                let check = if done { "[x] " } else { "[ ] " };
                self.push_text(check, self.styles.list_marker);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html, self.style()),
            Event::FootnoteReference(label) => {
                self.push_text(&format!("[{label}]"), self.styles.list_marker);
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.break_line();
                self.inline.push(self.heading_style(level));
            }
            Tag::Emphasis => self.inline.push(self.styles.emphasis),
            Tag::Strong => self.inline.push(self.styles.strong),
            Tag::Strikethrough => self.inline.push(self.styles.strikethrough),
            Tag::Link { .. } => self.inline.push(self.styles.link),
            Tag::CodeBlock(_) => {
                self.break_line();
                self.in_code_block = true;
            }
            Tag::List(first) => {
                self.break_line();
                self.lists.push(ListFrame { next_number: first });
            }
            Tag::Item => {
                self.break_line();
                let depth = self.lists.len().saturating_sub(1);
                let bullet = match self.lists.last_mut() {
                    Some(ListFrame {
                        next_number: Some(n),
                    }) => {
                        let label = format!("{n}. ");
                        *n += 1;
                        label
                    }
                    _ => "• ".to_string(),
                };
                self.marker = Some(format!("{}{bullet}", "  ".repeat(depth)));
            }
            Tag::BlockQuote => {
                self.break_line();
                self.quote_depth += 1;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.inline.pop();
                self.break_line();
                self.blank();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.inline.pop();
            }
            TagEnd::CodeBlock => {
                self.break_line();
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::List(_) => {
                self.break_line();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => {
                self.break_line();
                self.marker = None;
            }
            TagEnd::BlockQuote => {
                self.break_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::Paragraph => {
                self.break_line();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            _ => {}
        }
    }

    fn code_block_text(&mut self, text: &str) {
        for line in text.lines() {
            self.lead_in();
            self.spans
                .push(Span::styled(format!("  {line}"), self.styles.code_block));
            self.break_line();
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        self.lead_in();
        self.spans.push(Span::styled(text.to_string(), style));
    }

    /// Quote bar and list marker at the start of a line.
    fn lead_in(&mut self) {
        if !self.spans.is_empty() {
            return;
        }
        if self.quote_depth > 0 {
            self.spans
                .push(Span::styled("│ ".repeat(self.quote_depth), self.styles.quote));
        }
        if let Some(marker) = self.marker.take() {
            self.spans.push(Span::styled(marker, self.styles.list_marker));
        }
    }

    fn style(&self) -> Style {
        let base = if self.quote_depth > 0 {
            self.styles.quote
        } else {
            self.styles.text
        };
        self.inline.iter().fold(base, |acc, s| acc.patch(*s))
    }

    fn heading_style(&self, level: HeadingLevel) -> Style {
        if level == HeadingLevel::H1 {
            self.styles.heading
        } else {
            self.styles.subheading
        }
    }

    fn break_line(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}
