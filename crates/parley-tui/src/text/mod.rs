//! Text rendering utilities.
//!
//! - [`render_markdown`] turns message content into styled Lines
//! - [`wrap_lines`] and [`wrap_text`] fit text to a width
//! - [`visual_width`] and [`truncate_to_width`] measure terminal cells

mod markdown;
mod styles;
mod width;
mod wrap;

pub use markdown::render_markdown;
pub use styles::MarkdownStyles;
pub use width::{truncate_to_width, visual_width};
pub use wrap::{wrap_lines, wrap_text};
