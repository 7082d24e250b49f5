//! Palette definitions.

use parley_engine::ThemeChoice;
use ratatui::style::Color;

/// Theme color palette.
#[derive(Debug, Clone)]
pub struct Theme {
    pub choice: ThemeChoice,

    // Backgrounds
    pub base: Color,
    pub surface: Color,
    pub highlight: Color,

    // Foregrounds
    pub text: Color,
    pub subtext: Color,
    pub muted: Color,

    // Accents
    pub primary: Color,
    pub secondary: Color,

    // Speakers
    pub user: Color,
    pub assistant: Color,

    // Semantic
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // Borders
    pub border: Color,
    pub border_focused: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::mocha()
    }
}

impl Theme {
    /// Palette for a configured theme.
    pub fn from_choice(choice: ThemeChoice) -> Self {
        match choice {
            ThemeChoice::Dark => Self::mocha(),
            ThemeChoice::Light => Self::latte(),
            ThemeChoice::HighContrast => Self::high_contrast(),
        }
    }

    /// Human-readable palette name for the status bar.
    pub fn name(&self) -> &'static str {
        match self.choice {
            ThemeChoice::Dark => "dark",
            ThemeChoice::Light => "light",
            ThemeChoice::HighContrast => "high contrast",
        }
    }

    /// Catppuccin Mocha.
    pub fn mocha() -> Self {
        Self {
            choice: ThemeChoice::Dark,
            base: Color::Rgb(30, 30, 46),         // #1e1e2e
            surface: Color::Rgb(49, 50, 68),      // #313244
            highlight: Color::Rgb(69, 71, 90),    // #45475a
            text: Color::Rgb(205, 214, 244),      // #cdd6f4
            subtext: Color::Rgb(166, 173, 200),   // #a6adc8
            muted: Color::Rgb(108, 112, 134),     // #6c7086
            primary: Color::Rgb(180, 190, 254),   // #b4befe lavender
            secondary: Color::Rgb(148, 226, 213), // #94e2d5 teal
            user: Color::Rgb(137, 180, 250),      // #89b4fa blue
            assistant: Color::Rgb(250, 179, 135), // #fab387 peach
            warning: Color::Rgb(249, 226, 175),   // #f9e2af
            error: Color::Rgb(243, 139, 168),     // #f38ba8
            info: Color::Rgb(137, 220, 235),      // #89dceb sky
            border: Color::Rgb(69, 71, 90),
            border_focused: Color::Rgb(180, 190, 254),
        }
    }

    /// Catppuccin Latte.
    pub fn latte() -> Self {
        Self {
            choice: ThemeChoice::Light,
            base: Color::Rgb(239, 241, 245),      // #eff1f5
            surface: Color::Rgb(230, 233, 239),   // #e6e9ef
            highlight: Color::Rgb(204, 208, 218), // #ccd0da
            text: Color::Rgb(76, 79, 105),        // #4c4f69
            subtext: Color::Rgb(92, 95, 119),     // #5c5f77
            muted: Color::Rgb(140, 143, 161),     // #8c8fa1
            primary: Color::Rgb(114, 135, 253),   // #7287fd lavender
            secondary: Color::Rgb(23, 146, 153),  // #179299 teal
            user: Color::Rgb(30, 102, 245),       // #1e66f5 blue
            assistant: Color::Rgb(254, 100, 11),  // #fe640b peach
            warning: Color::Rgb(223, 142, 29),    // #df8e1d
            error: Color::Rgb(210, 15, 57),       // #d20f39
            info: Color::Rgb(4, 165, 229),        // #04a5e5 sky
            border: Color::Rgb(188, 192, 204),
            border_focused: Color::Rgb(114, 135, 253),
        }
    }

    /// High contrast palette using the basic terminal colors.
    pub fn high_contrast() -> Self {
        Self {
            choice: ThemeChoice::HighContrast,
            base: Color::Black,
            surface: Color::Rgb(24, 24, 24),
            highlight: Color::Rgb(64, 64, 64),
            text: Color::White,
            subtext: Color::Rgb(210, 210, 210),
            muted: Color::Rgb(160, 160, 160),
            primary: Color::Cyan,
            secondary: Color::Magenta,
            user: Color::LightBlue,
            assistant: Color::LightYellow,
            warning: Color::Yellow,
            error: Color::LightRed,
            info: Color::LightCyan,
            border: Color::White,
            border_focused: Color::Cyan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_mocha() {
        let theme = Theme::default();
        assert_eq!(theme.choice, ThemeChoice::Dark);
        assert!(matches!(theme.base, Color::Rgb(30, 30, 46)));
    }

    #[test]
    fn test_from_choice() {
        assert!(matches!(
            Theme::from_choice(ThemeChoice::Light).base,
            Color::Rgb(239, 241, 245)
        ));
        assert!(matches!(
            Theme::from_choice(ThemeChoice::HighContrast).base,
            Color::Black
        ));
    }

    #[test]
    fn test_cycling_choices_visits_every_palette() {
        let mut choice = ThemeChoice::Dark;
        let mut names = Vec::new();
        for _ in 0..3 {
            names.push(Theme::from_choice(choice).name());
            choice = choice.next();
        }
        assert_eq!(names, vec!["dark", "light", "high contrast"]);
        assert_eq!(choice, ThemeChoice::Dark);
    }
}
