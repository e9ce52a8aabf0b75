use super::{AbsoluteUrl, Color};
use serde::{Deserialize, Serialize};

/// Independent styling flags carried by one run of text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
}

impl Annotations {
    /// True when no flag is set and the color is the default.
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.strikethrough || self.underline || self.code)
            && self.color.is_default()
    }
}

/// One contiguous span of inline text with uniform styling.
///
/// Mentions and inline equations arrive from the provider as runs too; they
/// are carried here by their display text and `href`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextRun {
    pub content: String,
    pub link: Option<AbsoluteUrl>,
    pub annotations: Annotations,
}

impl TextRun {
    /// Create an unstyled run without a link.
    pub fn plain(text: &str) -> Self {
        Self {
            content: text.to_string(),
            ..Default::default()
        }
    }

    pub fn with_link(mut self, link: AbsoluteUrl) -> Self {
        self.link = Some(link);
        self
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Concatenates the literal content of a run sequence.
pub fn plain_text(runs: &[TextRun]) -> String {
    runs.iter().map(|run| run.content.as_str()).collect()
}
