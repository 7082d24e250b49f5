//! Color palettes for the TUI.
//!
//! Three palettes are available: Catppuccin Mocha (dark), Catppuccin Latte
//! (light) and a high contrast one. [`Theme::from_choice`] maps the
//! configured [`parley_engine::ThemeChoice`] onto a palette.

mod colors;

pub use colors::Theme;
