//! 24-bit ANSI colors for the console's level token.

use crate::level::Level;
use std::fmt::Write;

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const CYAN: Self = Self::new(139, 233, 253);
    pub const GREEN: Self = Self::new(80, 250, 123);
    pub const YELLOW: Self = Self::new(241, 250, 140);
    pub const RED: Self = Self::new(255, 85, 85);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Debug cyan, Info green, Warn yellow, Error red.
    #[must_use]
    pub const fn for_level(level: Level) -> Self {
        match level {
            Level::Debug => Self::CYAN,
            Level::Info => Self::GREEN,
            Level::Warn => Self::YELLOW,
            Level::Error => Self::RED,
        }
    }

    /// Appends `text` wrapped in this color's escape and a reset.
    pub fn paint(self, text: &str, out: &mut String) {
        let _ = write!(out, "\x1b[38;2;{};{};{}m{text}{RESET}", self.r, self.g, self.b);
    }
}

/// Owned form of `Color::paint`.
#[must_use]
pub fn colorize(text: &str, color: Color) -> String {
    let mut out = String::with_capacity(text.len() + 24);
    color.paint(text, &mut out);
    out
}
