use crate::error::WrapError;

use super::{Dom, NodeKind};

/// A span between two text-node boundary points
///
/// Ranges are snapshots: any mutation touching their containers may
/// invalidate them, so [`DomRange::validate`] runs before every use.
#[derive(Debug, Clone, PartialEq)]
pub struct DomRange<N> {
    pub start_node: N,
    pub start_offset: usize,
    pub end_node: N,
    pub end_offset: usize,
}

impl<N: Clone + PartialEq> DomRange<N> {
    /// Range covering `start..end` of a single text node
    pub fn within(node: N, start: usize, end: usize) -> Self {
        Self {
            start_node: node.clone(),
            start_offset: start,
            end_node: node,
            end_offset: end,
        }
    }

    pub fn is_single_node(&self) -> bool {
        self.start_node == self.end_node
    }

    /// Check that both boundaries still sit inside attached text nodes and
    /// that the range is non-empty and forward.
    pub fn validate<D: Dom<Node = N>>(&self, dom: &D) -> Result<(), WrapError> {
        for (node, offset) in [
            (&self.start_node, self.start_offset),
            (&self.end_node, self.end_offset),
        ] {
            if dom.node_kind(node) != NodeKind::Text {
                return Err(WrapError::InvalidRange("boundary is not a text node".into()));
            }
            if !dom.is_attached(node) {
                return Err(WrapError::InvalidRange("boundary node is detached".into()));
            }
            let text = dom.text(node);
            if offset > text.len() || !text.is_char_boundary(offset) {
                return Err(WrapError::InvalidRange(format!(
                    "offset {} does not fit text of length {}",
                    offset,
                    text.len()
                )));
            }
        }

        if self.is_single_node() {
            if self.start_offset >= self.end_offset {
                return Err(WrapError::InvalidRange("range is empty".into()));
            }
        } else if !precedes(dom, &self.start_node, &self.end_node) {
            return Err(WrapError::InvalidRange("range ends before it starts".into()));
        }
        Ok(())
    }

    /// Text currently covered by the range
    pub fn text<D: Dom<Node = N>>(&self, dom: &D) -> String {
        if self.is_single_node() {
            let text = dom.text(&self.start_node);
            return text
                .get(self.start_offset..self.end_offset)
                .unwrap_or_default()
                .to_string();
        }

        let mut out = String::new();
        let mut inside = false;
        for node in super::visible_text_nodes(dom) {
            let text = dom.text(&node);
            if node == self.start_node {
                inside = true;
                out.push_str(text.get(self.start_offset..).unwrap_or_default());
            } else if node == self.end_node {
                out.push_str(text.get(..self.end_offset).unwrap_or_default());
                break;
            } else if inside {
                out.push_str(&text);
            }
        }
        out
    }
}

/// Ancestors of `node`, nearest first, starting with its parent
pub(crate) fn ancestors<D: Dom>(dom: &D, node: &D::Node) -> Vec<D::Node> {
    let mut chain = Vec::new();
    let mut current = dom.parent(node);
    while let Some(n) = current {
        current = dom.parent(&n);
        chain.push(n);
    }
    chain
}

/// Nearest element containing both nodes
pub(crate) fn common_ancestor<D: Dom>(dom: &D, a: &D::Node, b: &D::Node) -> Option<D::Node> {
    let b_chain = ancestors(dom, b);
    ancestors(dom, a)
        .into_iter()
        .find(|candidate| b_chain.contains(candidate))
}

/// Whether `a` comes before `b` in document order
fn precedes<D: Dom>(dom: &D, a: &D::Node, b: &D::Node) -> bool {
    let path_a = child_path(dom, a);
    let path_b = child_path(dom, b);
    path_a < path_b
}

fn child_path<D: Dom>(dom: &D, node: &D::Node) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = node.clone();
    while let Some(parent) = dom.parent(&current) {
        let index = dom
            .children(&parent)
            .iter()
            .position(|c| *c == current)
            .unwrap_or(0);
        path.push(index);
        current = parent;
    }
    path.reverse();
    path
}
