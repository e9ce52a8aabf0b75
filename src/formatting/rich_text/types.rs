// src/formatting/rich_text/types.rs
//! Structured form of resolved rich text, separate from any output format.

use crate::types::{AbsoluteUrl, Color};

/// A sequence of styled segments, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyledText {
    pub segments: Vec<TextSegment>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segment(mut self, segment: TextSegment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The literal text with all styling dropped.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A run of text with one consistent style.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub text: String,
    pub style: TextStyle,
}

/// Styling applied to a segment. Every flag combines independently.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
    pub link: Option<AbsoluteUrl>,
}

impl TextStyle {
    /// Checks if any styling is applied.
    pub fn has_styling(&self) -> bool {
        self.bold
            || self.italic
            || self.strikethrough
            || self.underline
            || self.code
            || !self.color.is_default()
            || self.link.is_some()
    }
}
