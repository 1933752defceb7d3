//! Document abstraction
//!
//! Every algorithm in this crate is written against the [`Dom`] trait so the
//! same locator and materializer run over the in-memory [`ArenaDocument`]
//! and over a live browser page.

mod arena;
#[cfg(feature = "html")]
mod html;
mod range;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt::Debug;

pub use arena::{ArenaDocument, NodeId};
pub use range::DomRange;
pub(crate) use range::common_ancestor;

use crate::error::DomError;

/// Attribute marking nodes this crate injected
pub const PART_ATTR: &str = "data-gloss-part";
pub const PART_HOST: &str = "host";
pub const PART_WRAPPER: &str = "wrapper";
pub const PART_TOOLTIP: &str = "tooltip";

/// Elements whose text never renders
const NON_RENDERING: &[&str] = &["script", "style", "template", "noscript"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// Root of an isolated subtree attached to a host element
    IsolatedRoot,
    Other,
}

/// Operations the annotation engine needs from a host document
///
/// Text offsets are UTF-8 byte offsets into [`Dom::text`].
pub trait Dom {
    type Node: Clone + PartialEq + Debug;

    fn body(&self) -> Option<Self::Node>;
    fn node_kind(&self, node: &Self::Node) -> NodeKind;
    /// Lowercase tag name for elements
    fn tag_name(&self, node: &Self::Node) -> Option<String>;
    /// Character data of a text node; empty for anything else
    fn text(&self, node: &Self::Node) -> String;
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    /// Whether an element is excluded from rendering by its style
    fn is_hidden(&self, node: &Self::Node) -> bool;
    /// Whether the node is reachable from the document root
    fn is_attached(&self, node: &Self::Node) -> bool;
    fn find_by_id(&self, id: &str) -> Option<Self::Node>;

    fn create_element(&mut self, tag: &str) -> Result<Self::Node, DomError>;
    fn create_text(&mut self, text: &str) -> Self::Node;
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;
    /// Insert `child` into `parent` before `reference`, or append when
    /// `reference` is `None`. An attached `child` is moved.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), DomError>;
    /// Detach a node from its parent. Detached nodes are left alone.
    fn remove(&mut self, node: &Self::Node) -> Result<(), DomError>;
    /// Split a text node at `offset`; the tail becomes a new sibling
    /// inserted directly after it and is returned.
    fn split_text(&mut self, node: &Self::Node, offset: usize) -> Result<Self::Node, DomError>;
    fn set_text(&mut self, node: &Self::Node, text: &str) -> Result<(), DomError>;
    /// Copy of a node without its children
    fn shallow_clone(&mut self, node: &Self::Node) -> Result<Self::Node, DomError>;
    /// Attach an isolated subtree root to `host` and return it
    fn attach_isolated_root(&mut self, host: &Self::Node) -> Result<Self::Node, DomError>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }
}

/// Concatenated text of the light tree under `node`
pub fn text_content<D: Dom>(dom: &D, node: &D::Node) -> String {
    let mut out = String::new();
    collect_text(dom, node, &mut out);
    out
}

fn collect_text<D: Dom>(dom: &D, node: &D::Node, out: &mut String) {
    match dom.node_kind(node) {
        NodeKind::Text => out.push_str(&dom.text(node)),
        NodeKind::Element | NodeKind::IsolatedRoot => {
            for child in dom.children(node) {
                collect_text(dom, &child, out);
            }
        }
        NodeKind::Other => {}
    }
}

/// Rendered text of the document body
pub fn body_text<D: Dom>(dom: &D) -> String {
    dom.body()
        .map(|body| text_content(dom, &body))
        .unwrap_or_default()
}

/// Non-empty text nodes under the body that actually render, in document
/// order. Injected hosts and tooltips are skipped.
pub fn visible_text_nodes<D: Dom>(dom: &D) -> Vec<D::Node> {
    let mut nodes = Vec::new();
    let mut stack = match dom.body() {
        Some(body) => vec![body],
        None => return nodes,
    };

    while let Some(node) = stack.pop() {
        match dom.node_kind(&node) {
            NodeKind::Text => {
                if !dom.text(&node).is_empty() {
                    nodes.push(node);
                }
            }
            NodeKind::Element => {
                if is_skipped_element(dom, &node) {
                    continue;
                }
                let mut children = dom.children(&node);
                children.reverse();
                stack.extend(children);
            }
            NodeKind::IsolatedRoot | NodeKind::Other => {}
        }
    }

    nodes
}

fn is_skipped_element<D: Dom>(dom: &D, node: &D::Node) -> bool {
    if let Some(tag) = dom.tag_name(node) {
        if NON_RENDERING.contains(&tag.as_str()) {
            return true;
        }
    }
    if matches!(
        dom.attribute(node, PART_ATTR).as_deref(),
        Some(PART_HOST) | Some(PART_TOOLTIP)
    ) {
        return true;
    }
    dom.is_hidden(node)
}

/// Whether `ancestor` is `node` or one of its ancestors
pub fn is_inclusive_ancestor<D: Dom>(dom: &D, ancestor: &D::Node, node: &D::Node) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if &n == ancestor {
            return true;
        }
        current = dom.parent(&n);
    }
    false
}

/// Merge adjacent text children of `parent` and drop empty ones
pub fn normalize<D: Dom>(dom: &mut D, parent: &D::Node) -> Result<(), DomError> {
    let mut run: Option<(D::Node, String)> = None;

    for child in dom.children(parent) {
        if dom.node_kind(&child) != NodeKind::Text {
            flush_run(dom, run.take())?;
            continue;
        }
        let text = dom.text(&child);
        if text.is_empty() {
            dom.remove(&child)?;
            continue;
        }
        match run.as_mut() {
            Some((_, merged)) => {
                merged.push_str(&text);
                dom.remove(&child)?;
            }
            None => run = Some((child, text)),
        }
    }

    flush_run(dom, run)
}

fn flush_run<D: Dom>(dom: &mut D, run: Option<(D::Node, String)>) -> Result<(), DomError> {
    if let Some((node, merged)) = run {
        if dom.text(&node) != merged {
            dom.set_text(&node, &merged)?;
        }
    }
    Ok(())
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_skips_non_rendering() {
        let doc = ArenaDocument::parse_html(
            r#"<body><p>one</p><script>var x;</script><style>p{}</style>
            <div style="display: none">hidden</div>
            <div hidden>also hidden</div>
            <span style="visibility:hidden">invisible</span><p>two</p></body>"#,
        );

        let texts: Vec<String> = visible_text_nodes(&doc)
            .iter()
            .map(|n| doc.text(n))
            .filter(|t| !t.trim().is_empty())
            .collect();

        assert_eq!(texts, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_visible_text_is_in_document_order() {
        let doc = ArenaDocument::parse_html("<body><p>a<b>b</b>c</p><p>d</p></body>");
        let texts: Vec<String> = visible_text_nodes(&doc).iter().map(|n| doc.text(n)).collect();
        assert_eq!(texts.concat(), "abcd");
    }

    #[test]
    fn test_normalize_merges_adjacent_text() {
        let mut doc = ArenaDocument::new();
        let body = doc.body().unwrap();
        let p = doc.append_element(&body, "p");
        doc.append_text(&p, "Hello ");
        doc.append_text(&p, "");
        doc.append_text(&p, "world");

        normalize(&mut doc, &p).unwrap();

        let children = doc.children(&p);
        assert_eq!(children.len(), 1);
        assert_eq!(doc.text(&children[0]), "Hello world");
    }
}
