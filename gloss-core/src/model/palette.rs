use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Category;

/// Visual treatment for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStyle {
    pub background: String,
    pub border: String,
    pub label: String,
}

impl CategoryStyle {
    pub fn new(background: &str, border: &str, label: &str) -> Self {
        Self {
            background: background.to_string(),
            border: border.to_string(),
            label: label.to_string(),
        }
    }
}

/// Category to style table, keyed by the category's wire name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub styles: HashMap<String, CategoryStyle>,
    pub default: CategoryStyle,
}

impl Palette {
    /// Style for `category`, or the default when the table has no entry
    pub fn style_for(&self, category: &Category) -> &CategoryStyle {
        match self.styles.get(category.as_str()) {
            Some(style) => style,
            None => {
                tracing::warn!(
                    "Unknown highlight category {:?}, using default style",
                    category.as_str()
                );
                &self.default
            }
        }
    }

    pub fn set(&mut self, category: &Category, style: CategoryStyle) {
        self.styles.insert(category.as_str().to_string(), style);
    }
}

impl Default for Palette {
    fn default() -> Self {
        let euphemism = CategoryStyle::new(
            "rgba(239, 68, 68, 0.15)",
            "rgba(239, 68, 68, 0.5)",
            "Euphemism detected",
        );

        let mut styles = HashMap::new();
        styles.insert("euphemism".to_string(), euphemism.clone());
        styles.insert(
            "passive_voice".to_string(),
            CategoryStyle::new("rgba(249, 115, 22, 0.15)", "rgba(249, 115, 22, 0.5)", "Passive Voice"),
        );
        styles.insert(
            "source_bias".to_string(),
            CategoryStyle::new("rgba(234, 179, 8, 0.2)", "rgba(234, 179, 8, 0.5)", "Source Bias"),
        );
        styles.insert(
            "omission".to_string(),
            CategoryStyle::new("rgba(156, 163, 175, 0.2)", "rgba(156, 163, 175, 0.5)", "Omission"),
        );
        styles.insert(
            "headline_mismatch".to_string(),
            CategoryStyle::new(
                "rgba(168, 85, 247, 0.15)",
                "rgba(168, 85, 247, 0.5)",
                "Headline Mismatch",
            ),
        );
        styles.insert(
            "other".to_string(),
            CategoryStyle::new("rgba(161, 161, 170, 0.15)", "rgba(161, 161, 170, 0.5)", "Other Framing"),
        );

        Self {
            styles,
            default: euphemism,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_category_has_a_style() {
        let palette = Palette::default();
        for category in Category::all() {
            assert!(palette.styles.contains_key(category.as_str()));
        }
    }

    #[test]
    fn test_default_colors() {
        let palette = Palette::default();

        let source_bias = palette.style_for(&Category::SourceBias);
        assert_eq!(source_bias.background, "rgba(234, 179, 8, 0.2)");
        assert_eq!(source_bias.border, "rgba(234, 179, 8, 0.5)");
        assert_eq!(source_bias.label, "Source Bias");

        let other = palette.style_for(&Category::Other);
        assert_eq!(other.label, "Other Framing");
    }

    #[test]
    fn test_unknown_category_falls_back_to_default() {
        let palette = Palette::default();
        let style = palette.style_for(&Category::from("missing_context"));
        assert_eq!(style, palette.style_for(&Category::Euphemism));
    }

    #[test]
    fn test_partial_palette_json_keeps_default() {
        let palette: Palette = serde_json::from_str(
            r##"{"styles":{"omission":{"background":"#eee","border":"#999","label":"Left out"}}}"##,
        )
        .unwrap();

        assert_eq!(palette.style_for(&Category::Omission).label, "Left out");
        assert_eq!(palette.default.label, "Euphemism detected");
    }
}
