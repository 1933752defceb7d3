//! Arena document that can be told to refuse some mutations

use crate::error::DomError;

use super::{ArenaDocument, Dom, NodeId, NodeKind, PART_ATTR, PART_WRAPPER};

#[derive(Debug, Clone, Default)]
pub(crate) struct FlakyDom {
    pub inner: ArenaDocument,
    /// Refuse this many wrapper insertions, then behave
    pub fail_wrapper_inserts: usize,
    /// Refuse wrapper insertions before a node whose text contains this
    pub block_wrapper_before: Option<String>,
    /// Nodes whose removal always fails
    pub fail_removal_of: Vec<NodeId>,
}

impl FlakyDom {
    pub fn new(inner: ArenaDocument) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    fn refuses_wrapper(&mut self, child: &NodeId, reference: Option<&NodeId>) -> bool {
        if self.inner.attribute(child, PART_ATTR).as_deref() != Some(PART_WRAPPER) {
            return false;
        }
        if self.fail_wrapper_inserts > 0 {
            self.fail_wrapper_inserts -= 1;
            return true;
        }
        match (&self.block_wrapper_before, reference) {
            (Some(blocked), Some(reference)) => {
                self.inner.text(reference).contains(blocked.as_str())
            }
            _ => false,
        }
    }
}

impl Dom for FlakyDom {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        self.inner.body()
    }

    fn node_kind(&self, node: &NodeId) -> NodeKind {
        self.inner.node_kind(node)
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        self.inner.tag_name(node)
    }

    fn text(&self, node: &NodeId) -> String {
        self.inner.text(node)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.inner.parent(node)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.inner.children(node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.inner.attribute(node, name)
    }

    fn is_hidden(&self, node: &NodeId) -> bool {
        self.inner.is_hidden(node)
    }

    fn is_attached(&self, node: &NodeId) -> bool {
        self.inner.is_attached(node)
    }

    fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.inner.find_by_id(id)
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        self.inner.create_element(tag)
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.inner.create_text(text)
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.inner.set_attribute(node, name, value)
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> Result<(), DomError> {
        if self.refuses_wrapper(child, reference) {
            return Err(DomError::Host("wrapper insertion refused".into()));
        }
        self.inner.insert_before(parent, child, reference)
    }

    fn remove(&mut self, node: &NodeId) -> Result<(), DomError> {
        if self.fail_removal_of.contains(node) {
            return Err(DomError::Host("removal refused".into()));
        }
        self.inner.remove(node)
    }

    fn split_text(&mut self, node: &NodeId, offset: usize) -> Result<NodeId, DomError> {
        self.inner.split_text(node, offset)
    }

    fn set_text(&mut self, node: &NodeId, text: &str) -> Result<(), DomError> {
        self.inner.set_text(node, text)
    }

    fn shallow_clone(&mut self, node: &NodeId) -> Result<NodeId, DomError> {
        self.inner.shallow_clone(node)
    }

    fn attach_isolated_root(&mut self, host: &NodeId) -> Result<NodeId, DomError> {
        self.inner.attach_isolated_root(host)
    }
}
