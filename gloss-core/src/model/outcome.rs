use serde::{Deserialize, Serialize};

use super::{AnnotationRequest, Palette};

/// Longest quoted excerpt shown for a request that could not be placed
const EXCERPT_CHARS: usize = 100;

/// Matching tier that produced (or failed to produce) an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Tokenized,
    Partial,
    Fallback,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Tokenized => "tokenized",
            MatchMethod::Partial => "partial",
            MatchMethod::Fallback => "fallback",
        }
    }
}

/// Result of placing one request during an injection cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    #[serde(rename = "highlight")]
    pub request: AnnotationRequest,
    pub success: bool,
    pub method: MatchMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AttemptOutcome {
    pub fn matched(request: AnnotationRequest, method: MatchMethod, matched_text: String) -> Self {
        Self {
            request,
            success: true,
            method,
            matched_text: Some(matched_text),
            error: None,
        }
    }

    pub fn failed(request: AnnotationRequest, error: impl Into<String>) -> Self {
        Self {
            request,
            success: false,
            method: MatchMethod::Fallback,
            matched_text: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of one batch's outcomes
///
/// Built only through [`BatchReport::from_attempts`], so
/// `total == attempts.len() == succeeded + failed` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub attempts: Vec<AttemptOutcome>,
}

impl BatchReport {
    pub fn from_attempts(attempts: Vec<AttemptOutcome>) -> Self {
        let total = attempts.len();
        let succeeded = attempts.iter().filter(|a| a.success).count();
        Self {
            total,
            succeeded,
            failed: total - succeeded,
            attempts,
        }
    }

    pub fn empty() -> Self {
        Self::from_attempts(Vec::new())
    }

    pub fn failed_attempts(&self) -> impl Iterator<Item = &AttemptOutcome> {
        self.attempts.iter().filter(|a| !a.success)
    }

    /// Display rows for requests that could not be shown in the page
    pub fn fallback_items(&self, palette: &Palette) -> Vec<FallbackItem> {
        self.failed_attempts()
            .map(|attempt| FallbackItem::new(&attempt.request, palette))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One "could not be shown in-page" entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackItem {
    pub id: String,
    pub label: String,
    pub border: String,
    pub excerpt: String,
    pub explanation: String,
}

impl FallbackItem {
    fn new(request: &AnnotationRequest, palette: &Palette) -> Self {
        let style = palette.style_for(&request.category);
        let mut excerpt: String = request.text.chars().take(EXCERPT_CHARS).collect();
        if request.text.chars().count() > EXCERPT_CHARS {
            excerpt.push_str("...");
        }

        Self {
            id: request.id.clone(),
            label: style.label.clone(),
            border: style.border.clone(),
            excerpt,
            explanation: request.explanation.clone(),
        }
    }
}
