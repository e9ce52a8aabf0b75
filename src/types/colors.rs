use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notion's fixed text/background palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
    GrayBackground,
    BrownBackground,
    OrangeBackground,
    YellowBackground,
    GreenBackground,
    BlueBackground,
    PurpleBackground,
    PinkBackground,
    RedBackground,
}

impl std::str::FromStr for Color {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let color = match s {
            "default" => Color::Default,
            "gray" => Color::Gray,
            "brown" => Color::Brown,
            "orange" => Color::Orange,
            "yellow" => Color::Yellow,
            "green" => Color::Green,
            "blue" => Color::Blue,
            "purple" => Color::Purple,
            "pink" => Color::Pink,
            "red" => Color::Red,
            "gray_background" => Color::GrayBackground,
            "brown_background" => Color::BrownBackground,
            "orange_background" => Color::OrangeBackground,
            "yellow_background" => Color::YellowBackground,
            "green_background" => Color::GreenBackground,
            "blue_background" => Color::BlueBackground,
            "purple_background" => Color::PurpleBackground,
            "pink_background" => Color::PinkBackground,
            "red_background" => Color::RedBackground,
            _ => return Err(ValidationError::InvalidColor(s.to_string())),
        };
        Ok(color)
    }
}

impl Color {
    /// Parses a provider color name, falling back to `Default` for names
    /// outside the palette.
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            log::debug!("Unknown color '{}', using default", name);
            Color::Default
        })
    }

    /// The provider's name for this color.
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Gray => "gray",
            Color::Brown => "brown",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Red => "red",
            Color::GrayBackground => "gray_background",
            Color::BrownBackground => "brown_background",
            Color::OrangeBackground => "orange_background",
            Color::YellowBackground => "yellow_background",
            Color::GreenBackground => "green_background",
            Color::BlueBackground => "blue_background",
            Color::PurpleBackground => "purple_background",
            Color::PinkBackground => "pink_background",
            Color::RedBackground => "red_background",
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Color::Default)
    }

    pub fn is_background(&self) -> bool {
        self.as_str().ends_with("_background")
    }

    /// CSS class applied to styled text, or `None` for the default color.
    ///
    /// Foreground colors map to `color-<name>`, background colors to
    /// `bg-<name>`.
    pub fn css_class(&self) -> Option<String> {
        if self.is_default() {
            return None;
        }
        let name = self.as_str();
        Some(match name.strip_suffix("_background") {
            Some(base) => format!("bg-{}", base),
            None => format!("color-{}", name),
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_color_parsing() {
        assert_eq!(Color::from_str("red").unwrap(), Color::Red);
        assert_eq!(
            Color::from_str("gray_background").unwrap(),
            Color::GrayBackground
        );
        assert!(Color::from_str("invalid").is_err());
        assert_eq!(Color::parse_lenient("ultraviolet"), Color::Default);
    }

    #[test]
    fn test_css_classes() {
        assert_eq!(Color::Default.css_class(), None);
        assert_eq!(Color::Red.css_class().as_deref(), Some("color-red"));
        assert_eq!(
            Color::BlueBackground.css_class().as_deref(),
            Some("bg-blue")
        );
        assert!(Color::BlueBackground.is_background());
        assert!(!Color::Blue.is_background());
    }
}
