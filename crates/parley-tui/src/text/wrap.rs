//! Wrapping for plain strings and styled Lines.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

use super::width::visual_width;

/// Wrap plain text to `width` columns, keeping explicit line breaks.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.split('\n').map(str::to_string).collect();
    }
    text.split('\n')
        .flat_map(|paragraph| {
            if paragraph.is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(paragraph, width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

/// Wrap each Line to `width` cells, preserving span styles.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }
    lines
        .into_iter()
        .flat_map(|line| wrap_line(line, width))
        .collect()
}

/// Greedy word wrap over styled runs. Whitespace at a break is dropped and
/// words wider than the line are split by character.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let total: usize = line.spans.iter().map(|s| visual_width(&s.content)).sum();
    if total <= width {
        return vec![line];
    }

    let line_style = line.style;
    let mut rows = RowBuilder::new(width);
    for span in &line.spans {
        for (piece, is_space) in runs(&span.content) {
            rows.push(piece, is_space, span.style);
        }
    }

    rows.finish()
        .into_iter()
        .map(|spans| Line::from(spans).style(line_style))
        .collect()
}

/// Split `text` into alternating whitespace and non-whitespace runs.
fn runs(text: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match current {
            Some(kind) if kind == is_space => {}
            Some(kind) => {
                out.push((&text[start..idx], kind));
                start = idx;
                current = Some(is_space);
            }
            None => current = Some(is_space),
        }
    }
    if let Some(kind) = current {
        out.push((&text[start..], kind));
    }
    out
}

struct RowBuilder {
    width: usize,
    rows: Vec<Vec<Span<'static>>>,
    used: usize,
}

impl RowBuilder {
    fn new(width: usize) -> Self {
        Self {
            width,
            rows: vec![Vec::new()],
            used: 0,
        }
    }

    fn push(&mut self, piece: &str, is_space: bool, style: Style) {
        let piece_width = visual_width(piece);
        if self.used + piece_width <= self.width {
            self.append(piece, style);
            return;
        }
        if is_space {
            self.break_row();
            return;
        }
        if piece_width <= self.width {
            self.break_row();
            self.append(piece, style);
            return;
        }

        for ch in piece.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if self.used > 0 && self.used + ch_width > self.width {
                self.break_row();
            }
            let mut buf = [0u8; 4];
            self.append(ch.encode_utf8(&mut buf), style);
        }
    }

    fn append(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        self.used += visual_width(text);
        let Some(row) = self.rows.last_mut() else {
            return;
        };
        match row.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(text),
            _ => row.push(Span::styled(text.to_string(), style)),
        }
    }

    fn break_row(&mut self) {
        if self.used == 0 {
            return;
        }
        self.rows.push(Vec::new());
        self.used = 0;
    }

    fn finish(mut self) -> Vec<Vec<Span<'static>>> {
        if self.rows.len() > 1 && self.rows.last().is_some_and(Vec::is_empty) {
            self.rows.pop();
        }
        let last = self.rows.len().saturating_sub(1);
        for row in &mut self.rows[..last] {
            trim_row_end(row);
        }
        self.rows
    }
}

/// Drop whitespace left dangling at a break.
fn trim_row_end(row: &mut Vec<Span<'static>>) {
    while let Some(span) = row.last_mut() {
        let keep = span.content.trim_end().len();
        if keep == 0 {
            row.pop();
            continue;
        }
        span.content.to_mut().truncate(keep);
        break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_text_keeps_breaks() {
        assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn test_wrap_text_long() {
        let lines = wrap_text("Hello world this is a long line", 10);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn test_short_line_untouched() {
        let wrapped = wrap_lines(vec![Line::from("Short")], 20);
        assert_eq!(wrapped.len(), 1);
        assert_eq!(text_of(&wrapped[0]), "Short");
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        let wrapped = wrap_lines(vec![Line::from("the quick brown fox jumps")], 10);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_splits_overlong_word() {
        let wrapped = wrap_lines(vec![Line::from("abcdefghij")], 4);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_preserves_styles_across_rows() {
        let red = Style::default().fg(Color::Red);
        let blue = Style::default().fg(Color::Blue);
        let line = Line::from(vec![
            Span::styled("alpha beta ", red),
            Span::styled("gamma delta", blue),
        ]);
        let wrapped = wrap_lines(vec![line], 11);

        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped[0].spans[0].style, red);
        assert_eq!(text_of(&wrapped[0]), "alpha beta");
        assert_eq!(wrapped[1].spans[0].style, blue);
        assert_eq!(text_of(&wrapped[1]), "gamma delta");
    }

    #[test]
    fn test_wide_chars_respect_cell_width() {
        let wrapped = wrap_lines(vec![Line::from("你好世界你好")], 5);
        for line in &wrapped {
            assert!(visual_width(&text_of(line)) <= 5);
        }
        let joined: String = wrapped.iter().map(text_of).collect();
        assert_eq!(joined, "你好世界你好");
    }
}
