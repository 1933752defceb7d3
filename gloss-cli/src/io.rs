//! File I/O for native CLI

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use gloss_core::{AnnotationRequest, AnnotatorConfig, ArenaDocument, BatchReport};

/// Parse a saved HTML page
pub fn load_page(path: &Path) -> Result<ArenaDocument> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;

    let content = fs::read_to_string(&canonical)
        .with_context(|| format!("Failed to read file: {}", canonical.display()))?;

    Ok(ArenaDocument::parse_html(&content))
}

/// Load a JSON array of annotation requests
pub fn load_requests(path: &Path) -> Result<Vec<AnnotationRequest>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read requests: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse requests in {}", path.display()))
}

/// Load annotator configuration, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<AnnotatorConfig> {
    let Some(path) = path else {
        return Ok(AnnotatorConfig::default());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;

    AnnotatorConfig::from_json(&content)
        .with_context(|| format!("Invalid config in {}", path.display()))
}

/// `article.html` becomes `article.annotated.html` next to it
pub fn default_output_path(page: &Path) -> PathBuf {
    let stem = page
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "page".to_string());
    page.with_file_name(format!("{}.annotated.html", stem))
}

/// Display name for a page path
pub fn page_name(page: &Path) -> String {
    page.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Get the ~/.gloss directory path, creating it if needed
pub fn gloss_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let gloss_dir = home.join(".gloss");

    if !gloss_dir.exists() {
        fs::create_dir_all(&gloss_dir)
            .with_context(|| format!("Failed to create {}", gloss_dir.display()))?;
    }

    Ok(gloss_dir)
}

/// Write the annotated page
pub fn write_page(path: &Path, doc: &ArenaDocument) -> Result<()> {
    fs::write(path, doc.to_html())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write the batch report as pretty JSON
pub fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;

    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/tmp/site/article.html")),
            PathBuf::from("/tmp/site/article.annotated.html")
        );
        assert_eq!(
            default_output_path(Path::new("page")),
            PathBuf::from("page.annotated.html")
        );
    }

    #[test]
    fn test_page_name() {
        assert_eq!(page_name(Path::new("/tmp/article.html")), "article.html");
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), AnnotatorConfig::default());
    }

    #[test]
    fn test_missing_files_report_path() {
        let err = load_requests(Path::new("/nonexistent/requests.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/requests.json"));
    }
}
