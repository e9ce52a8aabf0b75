// src/formatting/rich_text/annotations.rs
//! Annotation processing for rich text.

use super::types::TextStyle;
use crate::types::TextRun;

/// Converts a run's annotations and link into a segment style.
pub fn run_to_style(run: &TextRun) -> TextStyle {
    let annotations = &run.annotations;
    TextStyle {
        bold: annotations.bold,
        italic: annotations.italic,
        strikethrough: annotations.strikethrough,
        underline: annotations.underline,
        code: annotations.code,
        color: annotations.color,
        link: run.link.clone(),
    }
}

/// Renderer for text styles to HTML.
pub struct HtmlStyleRenderer;

impl HtmlStyleRenderer {
    /// Wraps escaped `content` in the tags for `style`.
    ///
    /// Nesting from the inside out: code, strikethrough, bold, italic,
    /// underline, color span, link.
    pub fn apply_styles(content: &str, style: &TextStyle) -> String {
        let mut result = html_escape(content);

        if style.code {
            result = format!("<code>{}</code>", result);
        }

        if style.strikethrough {
            result = format!("<s>{}</s>", result);
        }

        if style.bold {
            result = format!("<strong>{}</strong>", result);
        }

        if style.italic {
            result = format!("<em>{}</em>", result);
        }

        if style.underline {
            result = format!("<u>{}</u>", result);
        }

        if let Some(class) = style.color.css_class() {
            result = format!("<span class=\"{}\">{}</span>", class, result);
        }

        // Links always open in a new browsing context.
        if let Some(url) = &style.link {
            result = format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                html_escape(url.as_str()),
                result
            );
        }

        result
    }
}

/// Basic HTML escaping for text and attribute values.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
