//! In-memory document tree
//!
//! Nodes live in a single arena and are never freed; removal only detaches
//! them. Handles stay valid for the lifetime of the document.

use crate::error::DomError;

use super::{Dom, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        isolated_root: Option<NodeId>,
    },
    Text(String),
    IsolatedRoot {
        host: NodeId,
    },
    Comment(String),
}

#[derive(Debug, Clone)]
struct Entry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document implementing [`Dom`]
///
/// Nodes are never freed. Removing a node only detaches it, so every
/// [`NodeId`] stays valid, but the arena only grows: each inject or replay
/// leaves its host, wrappers and tooltips behind after they are removed.
/// A session that re-injects many times should start again from a freshly
/// parsed document if memory matters.
#[derive(Debug, Clone)]
pub struct ArenaDocument {
    nodes: Vec<Entry>,
}

impl ArenaDocument {
    /// A document with an empty `<html><head></head><body></body></html>`
    pub fn new() -> Self {
        let mut doc = Self::without_body();
        let root = doc.root();
        let html = doc.append_element(&root, "html");
        doc.append_element(&html, "head");
        doc.append_element(&html, "body");
        doc
    }

    /// A bare document node with no elements at all
    pub fn without_body() -> Self {
        Self {
            nodes: vec![Entry {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Nodes ever created, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn append_element(&mut self, parent: &NodeId, tag: &str) -> NodeId {
        let id = self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            isolated_root: None,
        });
        self.attach(*parent, id, None);
        id
    }

    pub fn append_text(&mut self, parent: &NodeId, text: &str) -> NodeId {
        let id = self.push(NodeData::Text(text.to_string()));
        self.attach(*parent, id, None);
        id
    }

    pub fn append_comment(&mut self, parent: &NodeId, text: &str) -> NodeId {
        let id = self.push(NodeData::Comment(text.to_string()));
        self.attach(*parent, id, None);
        id
    }

    /// Isolated subtree root attached to `host`, if any
    pub fn isolated_root(&self, host: &NodeId) -> Option<NodeId> {
        match &self.entry(host).data {
            NodeData::Element { isolated_root, .. } => *isolated_root,
            _ => None,
        }
    }

    /// All elements carrying `name="value"`, isolated subtrees included
    pub fn elements_with_attribute(&self, name: &str, value: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let entry = self.entry(&id);
            if let NodeData::Element {
                attrs,
                isolated_root,
                ..
            } = &entry.data
            {
                if attrs.iter().any(|(k, v)| k == name && v == value) {
                    found.push(id);
                }
                if let Some(root) = isolated_root {
                    stack.push(*root);
                }
            }
            stack.extend(entry.children.iter().rev().copied());
        }
        found
    }

    pub(crate) fn comment_text(&self, node: &NodeId) -> Option<&str> {
        match &self.entry(node).data {
            NodeData::Comment(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn attributes(&self, node: &NodeId) -> &[(String, String)] {
        match &self.entry(node).data {
            NodeData::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    fn entry(&self, id: &NodeId) -> &Entry {
        &self.nodes[id.0]
    }

    fn entry_mut(&mut self, id: &NodeId) -> &mut Entry {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Entry {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.entry_mut(&id).parent.take() {
            self.entry_mut(&parent).children.retain(|c| *c != id);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.detach(child);
        let children = &mut self.entry_mut(&parent).children;
        match index {
            Some(i) if i <= children.len() => children.insert(i, child),
            _ => children.push(child),
        }
        self.entry_mut(&child).parent = Some(parent);
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.logical_parent(id);
        }
        false
    }

    /// Parent in the composed tree: isolated roots continue through their host
    fn logical_parent(&self, id: NodeId) -> Option<NodeId> {
        let entry = self.entry(&id);
        match entry.data {
            NodeData::IsolatedRoot { host } => Some(host),
            _ => entry.parent,
        }
    }
}

impl Default for ArenaDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn style_hides(style: &str) -> bool {
    style.split(';').any(|decl| {
        let mut parts = decl.splitn(2, ':');
        let prop = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let value = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let value = value.trim_end_matches("!important").trim();
        (prop == "display" && value == "none") || (prop == "visibility" && value == "hidden")
    })
}

impl Dom for ArenaDocument {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        let html = self
            .entry(&self.root())
            .children
            .iter()
            .copied()
            .find(|c| self.tag_name(c).as_deref() == Some("html"))?;
        self.entry(&html)
            .children
            .iter()
            .copied()
            .find(|c| self.tag_name(c).as_deref() == Some("body"))
    }

    fn node_kind(&self, node: &NodeId) -> NodeKind {
        match self.entry(node).data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::IsolatedRoot { .. } => NodeKind::IsolatedRoot,
            NodeData::Document | NodeData::Comment(_) => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        match &self.entry(node).data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    fn text(&self, node: &NodeId) -> String {
        match &self.entry(node).data {
            NodeData::Text(text) => text.clone(),
            _ => String::new(),
        }
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.entry(node).parent
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.entry(node).children.clone()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.attributes(node)
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn is_hidden(&self, node: &NodeId) -> bool {
        if self.attribute(node, "hidden").is_some() {
            return true;
        }
        self.attribute(node, "style")
            .map(|style| style_hides(&style))
            .unwrap_or(false)
    }

    fn is_attached(&self, node: &NodeId) -> bool {
        self.is_ancestor_or_self(self.root(), *node)
    }

    fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if self.attribute(&node, "id").as_deref() == Some(id) {
                return Some(node);
            }
            stack.extend(self.entry(&node).children.iter().rev().copied());
        }
        None
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomError::Host(format!("invalid tag name {:?}", tag)));
        }
        Ok(self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            isolated_root: None,
        }))
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.entry_mut(node).data {
            NodeData::Element { attrs, .. } => {
                match attrs.iter_mut().find(|(k, _)| k == name) {
                    Some(slot) => slot.1 = value.to_string(),
                    None => attrs.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(DomError::NotElement),
        }
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> Result<(), DomError> {
        match self.entry(parent).data {
            NodeData::Text(_) | NodeData::Comment(_) => {
                return Err(DomError::Hierarchy("parent cannot have children".into()))
            }
            _ => {}
        }
        if matches!(
            self.entry(child).data,
            NodeData::Document | NodeData::IsolatedRoot { .. }
        ) {
            return Err(DomError::Hierarchy("node cannot be inserted".into()));
        }
        if self.is_ancestor_or_self(*child, *parent) {
            return Err(DomError::Hierarchy(
                "cannot insert a node into its own subtree".into(),
            ));
        }
        if reference == Some(child) {
            return Ok(());
        }

        self.detach(*child);
        let index = match reference {
            Some(r) => Some(
                self.entry(parent)
                    .children
                    .iter()
                    .position(|c| c == r)
                    .ok_or_else(|| {
                        DomError::Hierarchy("reference node is not a child of parent".into())
                    })?,
            ),
            None => None,
        };
        self.attach(*parent, *child, index);
        Ok(())
    }

    fn remove(&mut self, node: &NodeId) -> Result<(), DomError> {
        self.detach(*node);
        Ok(())
    }

    fn split_text(&mut self, node: &NodeId, offset: usize) -> Result<NodeId, DomError> {
        let tail = match &mut self.entry_mut(node).data {
            NodeData::Text(text) => {
                if offset > text.len() {
                    return Err(DomError::OffsetOutOfBounds {
                        offset,
                        len: text.len(),
                    });
                }
                if !text.is_char_boundary(offset) {
                    return Err(DomError::Host(format!(
                        "offset {} splits a character",
                        offset
                    )));
                }
                text.split_off(offset)
            }
            _ => return Err(DomError::NotText),
        };

        let tail_id = self.push(NodeData::Text(tail));
        if let Some(parent) = self.entry(node).parent {
            let index = self
                .entry(&parent)
                .children
                .iter()
                .position(|c| c == node)
                .map(|i| i + 1);
            self.attach(parent, tail_id, index);
        }
        Ok(tail_id)
    }

    fn set_text(&mut self, node: &NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.entry_mut(node).data {
            NodeData::Text(current) => {
                *current = text.to_string();
                Ok(())
            }
            _ => Err(DomError::NotText),
        }
    }

    fn shallow_clone(&mut self, node: &NodeId) -> Result<NodeId, DomError> {
        let data = match &self.entry(node).data {
            NodeData::Element { tag, attrs, .. } => NodeData::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                isolated_root: None,
            },
            NodeData::Text(text) => NodeData::Text(text.clone()),
            NodeData::Comment(text) => NodeData::Comment(text.clone()),
            NodeData::Document | NodeData::IsolatedRoot { .. } => {
                return Err(DomError::Hierarchy("node cannot be cloned".into()))
            }
        };
        Ok(self.push(data))
    }

    fn attach_isolated_root(&mut self, host: &NodeId) -> Result<NodeId, DomError> {
        match self.entry(host).data {
            NodeData::Element {
                isolated_root: Some(_),
                ..
            } => {
                return Err(DomError::Hierarchy(
                    "element already hosts an isolated root".into(),
                ))
            }
            NodeData::Element { .. } => {}
            _ => return Err(DomError::NotElement),
        }

        let root = self.push(NodeData::IsolatedRoot { host: *host });
        if let NodeData::Element { isolated_root, .. } = &mut self.entry_mut(host).data {
            *isolated_root = Some(root);
        }
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(text: &str) -> (ArenaDocument, NodeId, NodeId) {
        let mut doc = ArenaDocument::new();
        let body = doc.body().unwrap();
        let p = doc.append_element(&body, "p");
        let t = doc.append_text(&p, text);
        (doc, p, t)
    }

    #[test]
    fn test_split_text_inserts_tail_after() {
        let (mut doc, p, t) = paragraph("Hello world");
        let tail = doc.split_text(&t, 5).unwrap();

        assert_eq!(doc.text(&t), "Hello");
        assert_eq!(doc.text(&tail), " world");
        assert_eq!(doc.children(&p), vec![t, tail]);
    }

    #[test]
    fn test_split_text_rejects_bad_offsets() {
        let (mut doc, _, t) = paragraph("héllo");
        assert!(matches!(
            doc.split_text(&t, 50),
            Err(DomError::OffsetOutOfBounds { .. })
        ));
        assert!(doc.split_text(&t, 2).is_err());
    }

    #[test]
    fn test_insert_moves_attached_node() {
        let (mut doc, p, t) = paragraph("text");
        let body = doc.body().unwrap();
        let div = doc.append_element(&body, "div");

        doc.append_child(&div, &t).unwrap();

        assert!(doc.children(&p).is_empty());
        assert_eq!(doc.parent(&t), Some(div));
    }

    #[test]
    fn test_insert_into_own_subtree_fails() {
        let (mut doc, p, _) = paragraph("text");
        let span = doc.append_element(&p, "span");
        assert!(doc.append_child(&span, &p).is_err());
    }

    #[test]
    fn test_removed_nodes_are_detached() {
        let (mut doc, p, t) = paragraph("text");
        assert!(doc.is_attached(&t));
        doc.remove(&p).unwrap();
        assert!(!doc.is_attached(&t));
        assert!(doc.remove(&p).is_ok());
    }

    #[test]
    fn test_isolated_root_is_not_a_child() {
        let mut doc = ArenaDocument::new();
        let body = doc.body().unwrap();
        let host = doc.append_element(&body, "div");
        let root = doc.attach_isolated_root(&host).unwrap();
        let inner = doc.create_text("inside");
        doc.append_child(&root, &inner).unwrap();

        assert!(doc.children(&host).is_empty());
        assert!(doc.is_attached(&inner));
        assert!(doc.attach_isolated_root(&host).is_err());

        doc.remove(&host).unwrap();
        assert!(!doc.is_attached(&inner));
    }

    #[test]
    fn test_removed_nodes_stay_in_arena() {
        let mut doc = ArenaDocument::new();
        let body = doc.body().unwrap();
        let p = doc.append_element(&body, "p");
        let text = doc.append_text(&p, "kept");
        let count = doc.node_count();

        doc.remove(&p).unwrap();

        assert_eq!(doc.node_count(), count);
        assert!(!doc.is_attached(&text));
        assert_eq!(doc.text(&text), "kept");
        assert_eq!(doc.parent(&text), Some(p));
    }

    #[test]
    fn test_find_by_id_ignores_detached() {
        let mut doc = ArenaDocument::new();
        let body = doc.body().unwrap();
        let div = doc.append_element(&body, "div");
        doc.set_attribute(&div, "id", "target").unwrap();

        assert_eq!(doc.find_by_id("target"), Some(div));
        doc.remove(&div).unwrap();
        assert_eq!(doc.find_by_id("target"), None);
    }

    #[test]
    fn test_style_hidden_detection() {
        assert!(style_hides("color: red; display: none"));
        assert!(style_hides("visibility:hidden !important"));
        assert!(!style_hides("display: block"));
    }
}
