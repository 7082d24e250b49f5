//! Markdown styling.

use ratatui::style::{Modifier, Style};

use crate::theme::Theme;

/// Styles for rendered markdown elements.
#[derive(Debug, Clone)]
pub struct MarkdownStyles {
    pub heading: Style,
    pub subheading: Style,
    pub code: Style,
    pub code_block: Style,
    pub emphasis: Style,
    pub strong: Style,
    pub strikethrough: Style,
    pub list_marker: Style,
    pub link: Style,
    pub quote: Style,
    pub rule: Style,
    pub text: Style,
}

impl MarkdownStyles {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            heading: Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
            subheading: Style::default()
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
            code: Style::default().fg(theme.secondary).bg(theme.surface),
            code_block: Style::default().fg(theme.secondary).bg(theme.surface),
            emphasis: Style::default().add_modifier(Modifier::ITALIC),
            strong: Style::default().add_modifier(Modifier::BOLD),
            strikethrough: Style::default().add_modifier(Modifier::CROSSED_OUT),
            list_marker: Style::default().fg(theme.muted),
            link: Style::default()
                .fg(theme.info)
                .add_modifier(Modifier::UNDERLINED),
            quote: Style::default()
                .fg(theme.subtext)
                .add_modifier(Modifier::ITALIC),
            rule: Style::default().fg(theme.border),
            text: Style::default().fg(theme.text),
        }
    }
}

impl Default for MarkdownStyles {
    fn default() -> Self {
        Self::from_theme(&Theme::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_theme_modifiers() {
        let styles = MarkdownStyles::from_theme(&Theme::latte());
        assert!(styles.heading.add_modifier.contains(Modifier::BOLD));
        assert!(styles.emphasis.add_modifier.contains(Modifier::ITALIC));
        assert!(styles.link.add_modifier.contains(Modifier::UNDERLINED));
        assert_eq!(styles.text.fg, Some(Theme::latte().text));
    }
}
