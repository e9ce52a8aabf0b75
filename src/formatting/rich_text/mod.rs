// src/formatting/rich_text/mod.rs
//! Resolves rich text runs into styled segments and renders them as HTML.

mod annotations;
mod types;

pub use annotations::{html_escape, HtmlStyleRenderer};
pub use types::{StyledText, TextSegment, TextStyle};

use crate::types::TextRun;
use annotations::run_to_style;

/// Resolves runs into styled segments, preserving order and dropping runs
/// with empty content.
pub fn resolve_rich_text(runs: &[TextRun]) -> StyledText {
    runs.iter()
        .filter(|run| !run.is_empty())
        .fold(StyledText::new(), |text, run| {
            text.with_segment(TextSegment {
                text: run.content.clone(),
                style: run_to_style(run),
            })
        })
}

/// Renders resolved text to inline HTML.
pub fn render_html(text: &StyledText) -> String {
    text.segments
        .iter()
        .map(|segment| HtmlStyleRenderer::apply_styles(&segment.text, &segment.style))
        .collect()
}
