//! Style types for highlighted text
//!
//! A document class names its styles; patterns refer to them by name and
//! every location a pattern produces carries the style's font format and
//! color, so rendering never needs to look the style up again.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use bitflags::bitflags;

bitflags! {
    /// Font attributes of a style
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontFormat: u8 {
        const BOLD = 0b0000_0001;
        const ITALIC = 0b0000_0010;
        const UNDERLINE = 0b0000_0100;
        const STRIKE = 0b0000_1000;
        const OVERLINE = 0b0001_0000;
    }
}

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// A named set of visual attributes
///
/// Styles compare and order by name only.
#[derive(Debug, Clone, Default)]
pub struct Style {
    name: String,
    font_format: FontFormat,
    color: Option<Color>,
}

impl Style {
    /// Create a plain style with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder: set font format
    pub fn with_format(mut self, format: FontFormat) -> Self {
        self.font_format = format;
        self
    }

    /// Builder: set color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn font_format(&self) -> FontFormat {
        self.font_format
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Check if this style changes nothing visually
    pub fn is_plain(&self) -> bool {
        self.font_format.is_empty() && self.color.is_none()
    }
}

impl PartialEq for Style {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Style {}

impl PartialOrd for Style {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Style {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// Styles of one document class, keyed by name
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    styles: BTreeMap<String, Style>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a style, replacing any style of the same name
    pub fn insert(&mut self, style: Style) {
        self.styles.insert(style.name.clone(), style);
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Style> {
        self.styles.values()
    }
}

impl FromIterator<Style> for StyleTable {
    fn from_iter<I: IntoIterator<Item = Style>>(iter: I) -> Self {
        let mut table = Self::new();
        for style in iter {
            table.insert(style);
        }
        table
    }
}

/// A formatted run of text within a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte offset where this span starts (inclusive)
    pub start: usize,
    /// Byte offset where this span ends (exclusive)
    pub end: usize,
    pub font_format: FontFormat,
    pub color: Option<Color>,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, font_format: FontFormat, color: Option<Color>) -> Self {
        Self {
            start,
            end,
            font_format,
            color,
        }
    }

    /// Check if this span contains a byte position
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Get the length of this span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
