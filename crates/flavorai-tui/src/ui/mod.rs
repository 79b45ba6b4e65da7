//! Terminal UI module using ratatui.
//!
//! - `render`: Main frame rendering, layout and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color palette and text styling
//! - `tabs`: Page content (recipe lists with detail, new-recipe form)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
