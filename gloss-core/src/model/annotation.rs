use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Framing category an annotation request is classified under
///
/// Unrecognised category strings are kept as `Unknown` instead of failing
/// deserialization; they render with the palette's default style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Euphemism,
    PassiveVoice,
    SourceBias,
    Omission,
    HeadlineMismatch,
    Other,
    Unknown(String),
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Euphemism,
            Category::PassiveVoice,
            Category::SourceBias,
            Category::Omission,
            Category::HeadlineMismatch,
            Category::Other,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Euphemism => "euphemism",
            Category::PassiveVoice => "passive_voice",
            Category::SourceBias => "source_bias",
            Category::Omission => "omission",
            Category::HeadlineMismatch => "headline_mismatch",
            Category::Other => "other",
            Category::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unknown(_))
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "euphemism" => Category::Euphemism,
            "passive_voice" => Category::PassiveVoice,
            "source_bias" => Category::SourceBias,
            "omission" => Category::Omission,
            "headline_mismatch" => Category::HeadlineMismatch,
            "other" => Category::Other,
            _ => Category::Unknown(raw),
        }
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        Category::from(raw.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One quotation to locate and mark in the page
///
/// Requests are immutable once submitted; the annotator clones them into
/// its replay state and into every outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub text: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl AnnotationRequest {
    pub fn new(
        category: impl Into<Category>,
        text: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category: category.into(),
            text: text.into(),
            explanation: explanation.into(),
            reference: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}
