//! Isolation host
//!
//! Owns the single attachment point for overlay markup: a host element
//! appended to the body with an isolated root holding the fallback list and
//! its style rules. Those rules never reach the page, so wrappers and
//! tooltips carry inline styles instead. Also tracks the in-page tooltip
//! nodes so a teardown leaves nothing behind.

use crate::dom::{Dom, PART_ATTR, PART_HOST};
use crate::error::DomError;
use crate::model::FallbackItem;

const HOST_STYLE: &str = "position: absolute; top: 0; left: 0; z-index: 2147483647; pointer-events: none;";

const FALLBACK_HEADING: &str = "Some annotations could not be displayed in the page";

fn stylesheet(prefix: &str) -> String {
    format!(
        r#"
.{p}-fallback {{
  pointer-events: auto;
  position: fixed;
  right: 16px;
  bottom: 16px;
  max-width: 360px;
  padding: 12px 16px;
  background: #fefce8;
  border: 1px solid #fef08a;
  border-radius: 8px;
  font: 13px/1.4 system-ui, sans-serif;
  color: #854d0e;
}}
.{p}-fallback-item {{
  background: #ffffff;
  border-left: 4px solid;
  border-radius: 4px;
  padding: 8px;
  margin-top: 8px;
}}
.{p}-fallback-label {{
  font-size: 11px;
  font-weight: 600;
  text-transform: uppercase;
  color: #6b7280;
}}
.{p}-fallback-quote {{
  font-style: italic;
  color: #374151;
}}
"#,
        p = prefix
    )
}

#[derive(Debug, Clone)]
pub struct IsolationHost<N> {
    host_id: String,
    class_prefix: String,
    host: Option<N>,
    container: Option<N>,
    tracked: Vec<N>,
}

impl<N: Clone + PartialEq> IsolationHost<N> {
    pub fn new(host_id: &str, class_prefix: &str) -> Self {
        Self {
            host_id: host_id.to_string(),
            class_prefix: class_prefix.to_string(),
            host: None,
            container: None,
            tracked: Vec::new(),
        }
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Whether the tracked surface is still in the document
    pub fn is_attached<D: Dom<Node = N>>(&self, dom: &D) -> bool {
        match &self.host {
            Some(host) => dom.is_attached(host) && dom.find_by_id(&self.host_id).as_ref() == Some(host),
            None => false,
        }
    }

    /// Reuse the current surface if it is still attached, otherwise build a
    /// fresh one. Returns the container inside the isolated root.
    pub fn acquire<D: Dom<Node = N>>(&mut self, dom: &mut D) -> Result<N, DomError> {
        if self.is_attached(dom) {
            if let Some(container) = &self.container {
                return Ok(container.clone());
            }
        }

        self.host = None;
        self.container = None;

        let body = dom.body().ok_or(DomError::NoBody)?;

        // Another instance (or a previous page state) may have left a host
        // with our id behind.
        if let Some(stale) = dom.find_by_id(&self.host_id) {
            tracing::debug!("Removing stale isolation host #{}", self.host_id);
            dom.remove(&stale)?;
        }

        let host = dom.create_element("div")?;
        dom.set_attribute(&host, "id", &self.host_id)?;
        dom.set_attribute(&host, PART_ATTR, PART_HOST)?;
        dom.set_attribute(&host, "style", HOST_STYLE)?;

        let root = dom.attach_isolated_root(&host)?;

        let style = dom.create_element("style")?;
        let css = dom.create_text(&stylesheet(&self.class_prefix));
        dom.append_child(&style, &css)?;
        dom.append_child(&root, &style)?;

        let container = dom.create_element("div")?;
        dom.set_attribute(&container, "class", &format!("{}-container", self.class_prefix))?;
        dom.append_child(&root, &container)?;

        dom.append_child(&body, &host)?;
        tracing::debug!("Created isolation host #{}", self.host_id);

        self.host = Some(host);
        self.container = Some(container.clone());
        Ok(container)
    }

    /// Register an in-page node that must go away with the surface
    pub fn track(&mut self, node: N) {
        self.tracked.push(node);
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Remove every tracked in-page node. A failed removal does not stop
    /// the rest; the first error is returned once all were attempted.
    pub fn release_tracked<D: Dom<Node = N>>(&mut self, dom: &mut D) -> Result<(), DomError> {
        let mut first_error = None;
        for node in self.tracked.drain(..) {
            if let Err(e) = dom.remove(&node) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Remove tracked nodes and the whole surface, even if some removal
    /// fails along the way
    pub fn teardown<D: Dom<Node = N>>(&mut self, dom: &mut D) -> Result<(), DomError> {
        let released = self.release_tracked(dom);
        self.container = None;
        let removed = match self.host.take() {
            Some(host) => dom.remove(&host),
            None => Ok(()),
        };
        released.and(removed)
    }

    /// Replace the container's content with the list of requests that could
    /// not be placed. An empty list clears it.
    pub fn render_fallback_list<D: Dom<Node = N>>(
        &mut self,
        dom: &mut D,
        items: &[FallbackItem],
    ) -> Result<(), DomError> {
        let container = match &self.container {
            Some(container) => container.clone(),
            None => return Ok(()),
        };
        for child in dom.children(&container) {
            dom.remove(&child)?;
        }
        if items.is_empty() {
            return Ok(());
        }

        let p = &self.class_prefix;
        let panel = element(dom, "section", &format!("{}-fallback", p))?;
        dom.set_attribute(&panel, "role", "status")?;
        let heading = element(dom, "h3", &format!("{}-fallback-heading", p))?;
        append_text(dom, &heading, FALLBACK_HEADING)?;
        dom.append_child(&panel, &heading)?;

        for item in items {
            let row = element(dom, "div", &format!("{}-fallback-item", p))?;
            dom.set_attribute(&row, "data-gloss-id", &item.id)?;
            dom.set_attribute(&row, "style", &format!("border-color: {};", item.border))?;

            for (part, text) in [
                ("label", item.label.clone()),
                ("quote", format!("\"{}\"", item.excerpt)),
                ("explanation", item.explanation.clone()),
            ] {
                let line = element(dom, "div", &format!("{}-fallback-{}", p, part))?;
                append_text(dom, &line, &text)?;
                dom.append_child(&row, &line)?;
            }
            dom.append_child(&panel, &row)?;
        }

        dom.append_child(&container, &panel)
    }
}

fn element<D: Dom>(dom: &mut D, tag: &str, class: &str) -> Result<D::Node, DomError> {
    let node = dom.create_element(tag)?;
    dom.set_attribute(&node, "class", class)?;
    Ok(node)
}

fn append_text<D: Dom>(dom: &mut D, parent: &D::Node, text: &str) -> Result<(), DomError> {
    let node = dom.create_text(text);
    dom.append_child(parent, &node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::testing::FlakyDom;
    use crate::dom::{body_text, ArenaDocument, NodeId};

    fn host() -> IsolationHost<NodeId> {
        IsolationHost::new("gloss-highlights", "gloss")
    }

    #[test]
    fn test_acquire_creates_single_host() {
        let mut doc = ArenaDocument::new();
        let mut isolation = host();

        let first = isolation.acquire(&mut doc).unwrap();
        let second = isolation.acquire(&mut doc).unwrap();

        assert_eq!(first, second);
        assert!(isolation.is_attached(&doc));
        assert_eq!(doc.elements_with_attribute(PART_ATTR, PART_HOST).len(), 1);
        assert_eq!(body_text(&doc), "");
    }

    #[test]
    fn test_acquire_replaces_detached_host() {
        let mut doc = ArenaDocument::new();
        let mut isolation = host();
        let first = isolation.acquire(&mut doc).unwrap();

        let host_node = doc.find_by_id("gloss-highlights").unwrap();
        doc.remove(&host_node).unwrap();
        assert!(!isolation.is_attached(&doc));

        let second = isolation.acquire(&mut doc).unwrap();
        assert_ne!(first, second);
        assert!(isolation.is_attached(&doc));
    }

    #[test]
    fn test_acquire_removes_foreign_host_with_same_id() {
        let mut doc = ArenaDocument::new();
        host().acquire(&mut doc).unwrap();

        let mut other = host();
        other.acquire(&mut doc).unwrap();

        assert_eq!(doc.elements_with_attribute("id", "gloss-highlights").len(), 1);
        assert!(other.is_attached(&doc));
    }

    #[test]
    fn test_acquire_without_body_fails() {
        let mut doc = ArenaDocument::without_body();
        assert_eq!(host().acquire(&mut doc), Err(DomError::NoBody));
    }

    #[test]
    fn test_teardown_removes_tracked_nodes() {
        let mut doc = ArenaDocument::new();
        let body = doc.body().unwrap();
        let mut isolation = host();
        isolation.acquire(&mut doc).unwrap();

        let tooltip = doc.append_element(&body, "span");
        isolation.track(tooltip);

        isolation.teardown(&mut doc).unwrap();
        isolation.teardown(&mut doc).unwrap();

        assert!(!doc.is_attached(&tooltip));
        assert!(doc.find_by_id("gloss-highlights").is_none());
        assert_eq!(isolation.tracked_count(), 0);
    }

    #[test]
    fn test_teardown_continues_past_failed_removal() {
        let mut doc = FlakyDom::new(ArenaDocument::new());
        let body = doc.body().unwrap();
        let mut isolation = host();
        isolation.acquire(&mut doc).unwrap();

        let stuck = doc.inner.append_element(&body, "span");
        let loose = doc.inner.append_element(&body, "span");
        isolation.track(stuck);
        isolation.track(loose);
        doc.fail_removal_of.push(stuck);

        assert!(matches!(isolation.teardown(&mut doc), Err(DomError::Host(_))));
        assert!(!doc.is_attached(&loose));
        assert!(doc.find_by_id("gloss-highlights").is_none());
        assert!(!isolation.is_attached(&doc));
        assert_eq!(isolation.tracked_count(), 0);

        assert_eq!(isolation.teardown(&mut doc), Ok(()));
    }

    #[test]
    fn test_fallback_list_lives_in_isolated_root() {
        let mut doc = ArenaDocument::new();
        let mut isolation = host();
        isolation.acquire(&mut doc).unwrap();

        let items = vec![FallbackItem {
            id: "r1".into(),
            label: "Omission".into(),
            border: "rgba(156, 163, 175, 0.5)".into(),
            excerpt: "missing text".into(),
            explanation: "Left out".into(),
        }];
        isolation.render_fallback_list(&mut doc, &items).unwrap();

        assert_eq!(doc.elements_with_attribute("data-gloss-id", "r1").len(), 1);
        assert_eq!(body_text(&doc), "");

        isolation.render_fallback_list(&mut doc, &[]).unwrap();
        assert!(doc.elements_with_attribute("data-gloss-id", "r1").is_empty());
    }
}
