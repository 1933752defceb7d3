//! Annotator
//!
//! Owns one document session: the isolation surface, the wrappers placed
//! for the current batch, the batch itself (so it can be replayed) and the
//! supervisor watching for the surface being torn out. Independent
//! instances share nothing.

use std::collections::HashSet;

use crate::config::AnnotatorConfig;
use crate::dom::{self, Dom};
use crate::error::{AnnotateError, WrapError};
use crate::isolation::IsolationHost;
use crate::locate::{Locator, MatchCandidate, Tier};
use crate::materialize::{self, Materializer, Wrapped};
use crate::model::{AnnotationRequest, AttemptOutcome, BatchReport, CategoryStyle};
use crate::report::{EventSink, LogSink, Reporter};
use crate::supervisor::{ChangeNotifier, ManualNotifier, Supervisor, SupervisorState};

/// Longest slice of a request's text quoted in a failure message
const ERROR_QUOTE_CHARS: usize = 60;

#[derive(Debug, Clone)]
struct Placement<N> {
    request: AnnotationRequest,
    wrapped: Wrapped<N>,
}

pub struct Annotator<D: Dom> {
    dom: D,
    config: AnnotatorConfig,
    locator: Locator,
    materializer: Materializer,
    host: IsolationHost<D::Node>,
    supervisor: Supervisor,
    reporter: Reporter,
    placements: Vec<Placement<D::Node>>,
    current: Option<Vec<AnnotationRequest>>,
    last_report: Option<BatchReport>,
    tooltip_seq: u64,
}

impl<D: Dom> Annotator<D> {
    /// Annotator with a hand-driven notifier and a logging sink
    pub fn new(dom: D, config: AnnotatorConfig) -> Self {
        Self {
            locator: Locator::new(config.matching.clone()),
            materializer: Materializer::new(&config.class_prefix),
            host: IsolationHost::new(&config.host_id, &config.class_prefix),
            supervisor: Supervisor::new(Box::new(ManualNotifier::new())),
            reporter: Reporter::new(Box::new(LogSink)),
            placements: Vec::new(),
            current: None,
            last_report: None,
            tooltip_seq: 0,
            dom,
            config,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn ChangeNotifier>) -> Self {
        self.supervisor = Supervisor::new(notifier);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.reporter = Reporter::new(sink);
        self
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Direct access to the document, e.g. to simulate host re-renders.
    /// Call [`Annotator::on_structural_change`] afterwards as a host
    /// notifier would.
    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Whether the isolation surface is currently in the document
    pub fn is_active(&self) -> bool {
        self.host.is_attached(&self.dom)
    }

    pub fn wrapper_count(&self) -> usize {
        self.placements.len()
    }

    pub fn wrappers(&self) -> Vec<D::Node> {
        self.placements
            .iter()
            .map(|p| p.wrapped.wrapper.clone())
            .collect()
    }

    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    pub fn current_batch(&self) -> Option<&[AnnotationRequest]> {
        self.current.as_deref()
    }

    pub fn supervisor_state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    pub fn replay_count(&self) -> usize {
        self.supervisor.replay_count()
    }

    /// Replace whatever is shown with `requests` and report the outcome.
    ///
    /// The only error is a malformed batch (duplicate ids); every placement
    /// failure is recorded in the returned report instead.
    pub fn inject(&mut self, requests: Vec<AnnotationRequest>) -> Result<BatchReport, AnnotateError> {
        let mut seen = HashSet::new();
        for request in &requests {
            if !seen.insert(request.id.as_str()) {
                return Err(AnnotateError::DuplicateRequestId(request.id.clone()));
            }
        }

        self.current = Some(requests);
        let (report, surface_ok) = self.run_current(false);
        if surface_ok {
            self.supervisor.arm();
        } else {
            self.supervisor.disarm();
        }
        Ok(report)
    }

    /// Remove every wrapper, tooltip and the isolation surface, and stop
    /// watching. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.release_placements();
        if let Err(e) = self.host.teardown(&mut self.dom) {
            tracing::warn!("Isolation surface teardown failed: {}", e);
        }
        self.supervisor.disarm();
        self.current = None;
        self.last_report = None;
    }

    /// Entry point for the host's change notifications. Replays the current
    /// batch when, and only when, the isolation surface has been detached.
    pub fn on_structural_change(&mut self) -> Option<BatchReport> {
        if !self.supervisor.should_replay(self.host.is_attached(&self.dom)) {
            return None;
        }
        if self.current.is_none() {
            self.supervisor.disarm();
            return None;
        }

        tracing::warn!("Isolation surface was removed from the document, replaying last batch");
        self.supervisor.begin_replay();
        let (report, surface_ok) = self.run_current(true);
        self.supervisor.finish_replay(surface_ok);
        Some(report)
    }

    /// Publish an activation for the wrapper containing `node`
    pub fn activate(&self, node: &D::Node) -> bool {
        match self.placement_for(node) {
            Some(p) => {
                self.reporter
                    .publish_activation(&p.request, &p.wrapped.matched_text);
                true
            }
            None => false,
        }
    }

    /// Keyboard activation: Enter or Space on a wrapper
    pub fn handle_key(&self, node: &D::Node, key: &str) -> bool {
        matches!(key, "Enter" | " " | "Spacebar") && self.activate(node)
    }

    /// Show or hide the tooltip of the wrapper containing `node`. Hosts call
    /// this on hover and focus changes.
    pub fn set_tooltip_visible(&mut self, node: &D::Node, visible: bool) -> bool {
        let tooltip = match self.placement_for(node) {
            Some(p) => p.wrapped.tooltip.clone(),
            None => return false,
        };
        match materialize::set_tooltip_visible(&mut self.dom, &tooltip, visible) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Could not toggle tooltip: {}", e);
                false
            }
        }
    }

    fn placement_for(&self, node: &D::Node) -> Option<&Placement<D::Node>> {
        // Latest first so a nested wrapper wins over the one around it.
        self.placements
            .iter()
            .rev()
            .find(|p| dom::is_inclusive_ancestor(&self.dom, &p.wrapped.wrapper, node))
    }

    fn run_current(&mut self, replay: bool) -> (BatchReport, bool) {
        let requests = self.current.clone().unwrap_or_default();
        self.release_placements();

        let (attempts, surface_ok) = match self.host.acquire(&mut self.dom) {
            Ok(_) => {
                let attempts: Vec<AttemptOutcome> =
                    requests.iter().map(|r| self.place(r)).collect();
                (attempts, true)
            }
            Err(e) => {
                tracing::warn!("Isolation surface unavailable: {}", e);
                let reason = format!("Isolation surface unavailable: {}", e);
                let attempts = requests
                    .into_iter()
                    .map(|r| AttemptOutcome::failed(r, reason.clone()))
                    .collect();
                (attempts, false)
            }
        };

        let report = self.reporter.compile(attempts);

        if surface_ok && self.config.render_fallback_list {
            let items = report.fallback_items(&self.config.palette);
            if let Err(e) = self.host.render_fallback_list(&mut self.dom, &items) {
                tracing::warn!("Could not render fallback list: {}", e);
            }
        }

        self.reporter.publish_report(&report, replay);
        self.last_report = Some(report.clone());
        (report, surface_ok)
    }

    fn place(&mut self, request: &AnnotationRequest) -> AttemptOutcome {
        let style = self.config.palette.style_for(&request.category).clone();
        let mut located = 0;
        let mut last_error: Option<WrapError> = None;

        for tier in Tier::ALL {
            let nodes = dom::visible_text_nodes(&self.dom);
            let candidates = self.locator.locate(&self.dom, &nodes, tier, &request.text);
            if candidates.is_empty() {
                continue;
            }
            located += candidates.len();

            match self.wrap_candidates(request, tier, &candidates, &style) {
                Ok(matched) => {
                    tracing::debug!("Placed {} via {:?} tier", request.id, tier);
                    return AttemptOutcome::matched(request.clone(), tier.method(), matched);
                }
                Err(e) => {
                    tracing::warn!("Could not wrap {:?} candidates for {}: {}", tier, request.id, e);
                    last_error = Some(e);
                }
            }
        }

        let error = match last_error {
            Some(e) => format!(
                "Located {} candidate(s) but none could be wrapped: {}",
                located, e
            ),
            None => format!(
                "No occurrence of \"{}\" after exact, tokenized and partial matching",
                quote(&request.text)
            ),
        };
        AttemptOutcome::failed(request.clone(), error)
    }

    /// The exact tier marks every occurrence; looser tiers stop at the first
    /// candidate that wraps. Returns the first wrapped text in document order.
    fn wrap_candidates(
        &mut self,
        request: &AnnotationRequest,
        tier: Tier,
        candidates: &[MatchCandidate<D::Node>],
        style: &CategoryStyle,
    ) -> Result<String, WrapError> {
        let mut last_error = WrapError::InvalidRange("no candidates".into());

        if tier == Tier::Exact {
            // Back to front: wrapping splits text nodes, and splitting only
            // ever shortens the head, so earlier offsets stay valid.
            let mut first_matched = None;
            for candidate in candidates.iter().rev() {
                match self.wrap_one(request, candidate, style) {
                    Ok(text) => first_matched = Some(text),
                    Err(e) => last_error = e,
                }
            }
            return first_matched.ok_or(last_error);
        }

        for candidate in candidates {
            match self.wrap_one(request, candidate, style) {
                Ok(text) => return Ok(text),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    fn wrap_one(
        &mut self,
        request: &AnnotationRequest,
        candidate: &MatchCandidate<D::Node>,
        style: &CategoryStyle,
    ) -> Result<String, WrapError> {
        if candidate.range.text(&self.dom) != candidate.matched_text {
            return Err(WrapError::InvalidRange(
                "candidate text no longer matches the document".into(),
            ));
        }

        self.tooltip_seq += 1;
        let tooltip_id = format!("{}-tooltip-{}", self.config.class_prefix, self.tooltip_seq);
        let wrapped = self.materializer.materialize(
            &mut self.dom,
            &candidate.range,
            request,
            style,
            &tooltip_id,
        )?;

        self.host.track(wrapped.tooltip.clone());
        let matched = wrapped.matched_text.clone();
        self.placements.push(Placement {
            request: request.clone(),
            wrapped,
        });
        Ok(matched)
    }

    /// Undo every placement: tooltips out, wrappers unwrapped, split
    /// elements merged, text nodes re-joined.
    fn release_placements(&mut self) {
        if let Err(e) = self.host.release_tracked(&mut self.dom) {
            tracing::warn!("Could not remove tooltips: {}", e);
        }

        let mut parents: Vec<D::Node> = Vec::new();
        for placement in self.placements.drain(..).rev() {
            match materialize::unwrap(&mut self.dom, &placement.wrapped.wrapper) {
                Ok(Some(parent)) => {
                    if !parents.contains(&parent) {
                        parents.push(parent);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Could not unwrap {}: {}", placement.request.id, e),
            }
            for split in placement.wrapped.splits.iter().rev() {
                if let Err(e) = materialize::merge_split(&mut self.dom, split) {
                    tracing::warn!("Could not merge split element: {}", e);
                }
            }
        }

        for parent in &parents {
            if let Err(e) = dom::normalize(&mut self.dom, parent) {
                tracing::warn!("Could not normalize text after unwrap: {}", e);
            }
        }
    }
}

fn quote(text: &str) -> String {
    let mut quoted: String = text.chars().take(ERROR_QUOTE_CHARS).collect();
    if text.chars().count() > ERROR_QUOTE_CHARS {
        quoted.push_str("...");
    }
    quoted
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use super::*;
    use crate::dom::testing::FlakyDom;
    use crate::dom::{body_text, ArenaDocument, PART_ATTR, PART_WRAPPER};
    use crate::model::{Category, MatchMethod};
    use crate::report::MemorySink;

    fn annotator(html: &str) -> (Annotator<ArenaDocument>, MemorySink) {
        let sink = MemorySink::new();
        let annotator = Annotator::new(ArenaDocument::parse_html(html), AnnotatorConfig::default())
            .with_sink(Box::new(sink.clone()));
        (annotator, sink)
    }

    fn rendered(doc: &ArenaDocument) -> String {
        dom::visible_text_nodes(doc)
            .iter()
            .map(|n| doc.text(n))
            .collect()
    }

    fn request(id: &str, text: &str) -> AnnotationRequest {
        AnnotationRequest::new(Category::Euphemism, text, "why").with_id(id)
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let (mut annotator, sink) = annotator("<p>text</p>");
        let result = annotator.inject(vec![request("a", "text"), request("a", "other")]);

        assert_eq!(result, Err(AnnotateError::DuplicateRequestId("a".into())));
        assert!(sink.notifications().is_empty());
        assert!(!annotator.is_active());
    }

    #[test]
    fn test_exact_marks_up_to_limit_occurrences() {
        let (mut annotator, _) =
            annotator("<p>spin spin</p><p>spin</p><p>spin and spin</p>");
        let report = annotator.inject(vec![request("a", "spin")]).unwrap();

        assert_eq!(report.attempts[0].method, MatchMethod::Exact);
        assert_eq!(annotator.wrapper_count(), 3);
        assert_eq!(
            annotator
                .dom()
                .elements_with_attribute(PART_ATTR, PART_WRAPPER)
                .len(),
            3
        );
    }

    #[test]
    fn test_activation_publishes_request_and_text() {
        let (mut annotator, sink) = annotator("<p>a difficult but necessary step</p>");
        annotator
            .inject(vec![request("a", "difficult but necessary")])
            .unwrap();

        let wrapper = annotator.wrappers()[0];
        let inner = annotator.dom().children(&wrapper)[0];

        assert!(annotator.activate(&inner));
        assert!(annotator.handle_key(&wrapper, "Enter"));
        assert!(!annotator.handle_key(&wrapper, "Tab"));

        let activations = sink.activations();
        assert_eq!(activations.len(), 2);
        assert_eq!(activations[0].0.id, "a");
        assert_eq!(activations[0].1, "difficult but necessary");
    }

    #[test]
    fn test_tooltip_toggles_from_inside_wrapper() {
        let (mut annotator, _) = annotator("<p>a difficult but necessary step</p>");
        annotator
            .inject(vec![request("a", "difficult but necessary")])
            .unwrap();

        let wrapper = annotator.wrappers()[0];
        let inner = annotator.dom().children(&wrapper)[0];
        let tooltip = annotator.dom().find_by_id("gloss-tooltip-1").unwrap();
        assert!(annotator.dom().is_hidden(&tooltip));

        assert!(annotator.set_tooltip_visible(&inner, true));
        assert!(!annotator.dom().is_hidden(&tooltip));
        assert!(annotator.set_tooltip_visible(&wrapper, false));
        assert!(annotator.dom().is_hidden(&tooltip));

        let body = annotator.dom().body().unwrap();
        assert!(!annotator.set_tooltip_visible(&body, true));
    }

    #[test]
    fn test_activate_outside_wrapper_is_ignored() {
        let (mut annotator, sink) = annotator("<p>alpha</p><p>beta</p>");
        annotator.inject(vec![request("a", "alpha")]).unwrap();
        let body = annotator.dom().body().unwrap();

        assert!(!annotator.activate(&body));
        assert!(sink.activations().is_empty());
    }

    #[test]
    fn test_reinjection_replaces_previous_batch() {
        let (mut annotator, _) = annotator("<p>alpha beta</p>");
        annotator.inject(vec![request("a", "alpha")]).unwrap();
        annotator.inject(vec![request("b", "beta")]).unwrap();

        assert_eq!(annotator.wrapper_count(), 1);
        assert_eq!(annotator.current_batch().unwrap()[0].id, "b");
        assert_eq!(rendered(annotator.dom()), "alpha beta");
    }

    #[test]
    fn test_tooltips_are_not_matched_by_later_requests() {
        let (mut annotator, _) = annotator("<p>alpha beta</p>");
        let mut first = request("a", "alpha");
        first.explanation = "gamma".into();
        let report = annotator
            .inject(vec![first, request("b", "gamma")])
            .unwrap();

        assert!(report.attempts[0].success);
        assert!(!report.attempts[1].success);
    }

    fn flaky_annotator(html: &str) -> Annotator<FlakyDom> {
        Annotator::new(
            FlakyDom::new(ArenaDocument::parse_html(html)),
            AnnotatorConfig::default(),
        )
        .with_sink(Box::new(MemorySink::new()))
    }

    const LAYOFFS: &str = "<p>The layoffs were difficult but necessary for everyone.</p>";

    #[test]
    fn test_wrap_failure_moves_to_next_tier() {
        let mut annotator = flaky_annotator(LAYOFFS);
        annotator.dom_mut().fail_wrapper_inserts = 1;

        let report = annotator
            .inject(vec![request("a", "difficult but necessary")])
            .unwrap();

        let attempt = &report.attempts[0];
        assert!(attempt.success);
        assert_eq!(attempt.method, MatchMethod::Tokenized);
        assert_eq!(attempt.matched_text.as_deref(), Some("difficult but necessary"));
        assert_eq!(annotator.wrapper_count(), 1);
    }

    #[test]
    fn test_wrap_failure_moves_to_next_candidate() {
        let mut annotator = flaky_annotator(
            "<p>Nobody mentioned the changes here.</p><p>The changes came later.</p>",
        );
        annotator.dom_mut().block_wrapper_before = Some("Nobody".into());

        let report = annotator.inject(vec![request("a", "(changes)")]).unwrap();

        let attempt = &report.attempts[0];
        assert!(attempt.success);
        assert_eq!(attempt.method, MatchMethod::Partial);
        assert_eq!(attempt.matched_text.as_deref(), Some("The changes came later."));
        assert_eq!(annotator.wrapper_count(), 1);
    }

    #[test]
    fn test_unwrappable_candidates_are_reported() {
        let mut annotator = flaky_annotator(LAYOFFS);
        let before = body_text(annotator.dom());
        annotator.dom_mut().fail_wrapper_inserts = usize::MAX;

        let report = annotator
            .inject(vec![request("a", "difficult but necessary")])
            .unwrap();

        let attempt = &report.attempts[0];
        assert!(!attempt.success);
        assert_eq!(attempt.method, MatchMethod::Fallback);
        let error = attempt.error.as_deref().unwrap();
        assert!(
            error.starts_with("Located 3 candidate(s) but none could be wrapped"),
            "{}",
            error
        );
        assert_eq!(annotator.wrapper_count(), 0);

        annotator.clear();
        assert_eq!(body_text(annotator.dom()), before);
    }

    #[test]
    fn test_fallback_error_quotes_request() {
        let (mut annotator, _) = annotator("<p>alpha</p>");
        let report = annotator.inject(vec![request("a", "zzzz qqqq")]).unwrap();
        let error = report.attempts[0].error.as_deref().unwrap();
        assert!(error.contains("zzzz qqqq"));
    }
}
