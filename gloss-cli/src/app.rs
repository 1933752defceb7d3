//! Review session state

use gloss_core::{
    AnnotationRequest, Annotator, ArenaDocument, AttemptOutcome, BatchReport, Dom, MemorySink,
};

/// State behind the review screen
pub struct App {
    pub annotator: Annotator<ArenaDocument>,
    pub sink: MemorySink,
    pub requests: Vec<AnnotationRequest>,
    pub report: Option<BatchReport>,
    pub page_name: String,
    pub selected: usize,
    pub scroll: u16,
    pub running: bool,
    pub help: bool,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(
        annotator: Annotator<ArenaDocument>,
        sink: MemorySink,
        requests: Vec<AnnotationRequest>,
        page_name: String,
    ) -> Self {
        let report = annotator.last_report().cloned();
        Self {
            annotator,
            sink,
            requests,
            report,
            page_name,
            selected: 0,
            scroll: 0,
            running: true,
            help: false,
            status_message: None,
        }
    }

    pub fn attempts(&self) -> &[AttemptOutcome] {
        self.report
            .as_ref()
            .map(|r| r.attempts.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_attempt(&self) -> Option<&AttemptOutcome> {
        self.attempts().get(self.selected)
    }

    pub fn next(&mut self) {
        let len = self.attempts().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn prev(&mut self) {
        let len = self.attempts().len();
        if len > 0 {
            self.selected = if self.selected == 0 {
                len - 1
            } else {
                self.selected - 1
            };
        }
    }

    /// Activate the wrapper placed for the selected request, as a click would
    pub fn activate_selected(&mut self) {
        let Some(attempt) = self.selected_attempt() else {
            return;
        };
        if !attempt.success {
            self.set_status("Not shown in the page, nothing to activate");
            return;
        }

        let id = attempt.request.id.clone();
        let dom = self.annotator.dom();
        let wrapper = self
            .annotator
            .wrappers()
            .into_iter()
            .find(|w| dom.attribute(w, "data-gloss-id").as_deref() == Some(id.as_str()));

        match wrapper {
            Some(w) if self.annotator.activate(&w) => {
                let message = match self.sink.activations().last() {
                    Some((request, matched)) => {
                        format!("HIGHLIGHT_ACTIVATED {}: \"{}\"", request.id, matched)
                    }
                    None => format!("Activated {}", id),
                };
                self.set_status(&message);
            }
            _ => self.set_status(&format!("No wrapper found for {}", id)),
        }
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(10);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(10);
    }

    /// Remove all highlights from the page
    pub fn clear(&mut self) {
        self.annotator.clear();
        self.report = None;
        self.selected = 0;
        self.set_status("Cleared all highlights");
    }

    /// Run the loaded requests again
    pub fn reinject(&mut self) {
        match self.annotator.inject(self.requests.clone()) {
            Ok(report) => {
                self.set_status(&format!(
                    "Injected {}/{} highlights",
                    report.succeeded, report.total
                ));
                self.report = Some(report);
                self.selected = self.selected.min(self.attempts().len().saturating_sub(1));
            }
            Err(e) => self.set_status(&format!("Error: {}", e)),
        }
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gloss_core::{AnnotatorConfig, Category};

    fn app() -> App {
        let doc = ArenaDocument::parse_html(
            "<p>The cuts were a difficult but necessary step.</p><p>Nothing else.</p>",
        );
        let sink = MemorySink::new();
        let mut annotator =
            Annotator::new(doc, AnnotatorConfig::default()).with_sink(Box::new(sink.clone()));
        let requests = vec![
            AnnotationRequest::new(Category::Euphemism, "difficult but necessary", "Softens cuts")
                .with_id("a"),
            AnnotationRequest::new(Category::Omission, "qqqq zzzz", "Missing").with_id("b"),
        ];
        annotator.inject(requests.clone()).unwrap();
        App::new(annotator, sink, requests, "page.html".into())
    }

    #[test]
    fn test_selection_wraps() {
        let mut app = app();
        assert_eq!(app.attempts().len(), 2);
        app.prev();
        assert_eq!(app.selected, 1);
        app.next();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_activate_selected_publishes() {
        let mut app = app();
        app.activate_selected();
        assert_eq!(app.sink.activations().len(), 1);
        assert_eq!(
            app.status_message.as_deref(),
            Some("HIGHLIGHT_ACTIVATED a: \"difficult but necessary\"")
        );

        app.next();
        app.activate_selected();
        assert_eq!(app.sink.activations().len(), 1);
    }

    #[test]
    fn test_clear_then_reinject() {
        let mut app = app();
        app.clear();
        assert!(app.attempts().is_empty());
        assert_eq!(app.annotator.wrapper_count(), 0);

        app.reinject();
        assert_eq!(app.attempts().len(), 2);
        assert_eq!(app.annotator.wrapper_count(), 1);
    }
}
