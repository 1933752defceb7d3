//! Annotator configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::locate::MatchOptions;
use crate::model::Palette;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotatorConfig {
    /// Element id of the isolation host
    pub host_id: String,
    /// Prefix for every class name the overlay uses
    pub class_prefix: String,
    pub matching: MatchOptions,
    /// Show requests that could not be placed inside the isolation surface
    pub render_fallback_list: bool,
    pub palette: Palette,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            host_id: "gloss-highlights".to_string(),
            class_prefix: "gloss".to_string(),
            matching: MatchOptions::default(),
            render_fallback_list: true,
            palette: Palette::default(),
        }
    }
}

impl AnnotatorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Invalid annotator configuration")?;
        if config.host_id.trim().is_empty() {
            anyhow::bail!("hostId must not be empty");
        }
        Ok(config)
    }
}
