//! Color constants for prompt frames.

use ratatui::style::Color;

/// Used for the destructive option of a confirm prompt
pub const DANGER: Color = Color::Rgb(200, 40, 40);
/// Used for prompt titles
pub const ACCENT: Color = Color::Cyan;
/// Used for the footer hint line
pub const MUTED: Color = Color::DarkGray;

