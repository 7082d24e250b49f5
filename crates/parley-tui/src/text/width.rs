//! Terminal cell width helpers.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

/// Width of `s` in terminal cells. Wide characters count as 2.
pub fn visual_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Shorten `s` to at most `max_width` cells, ending with `…` when cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if visual_width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut out: String = s
        .chars()
        .take_while(|ch| {
            used += ch.width().unwrap_or(0);
            used <= budget
        })
        .collect();
    out.push(ELLIPSIS);
    out
}
