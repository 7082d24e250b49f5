//! UI widgets for the TUI.
//!
//! This module provides:
//! - [`StatusBar`] - Top bar with title, message count and hints
//! - [`Sidebar`] - Conversation list
//! - [`Transcript`] - Messages of the current conversation
//! - [`InputBar`] - Multi-line composer backed by [`TextInputState`]

mod input_bar;
mod sidebar;
mod status_bar;
mod transcript;

pub use input_bar::{InputBar, TextInputState};
pub use sidebar::{Sidebar, SIDEBAR_WIDTH};
pub use status_bar::{StatusBar, StatusBarContent};
pub use transcript::{Reveal, Transcript, TranscriptState, EMPTY_STATE};
