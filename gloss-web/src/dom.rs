//! Live page implementation of the document trait
//!
//! Offsets handed to the engine are UTF-8 byte offsets into Rust strings;
//! the browser counts UTF-16 code units, so `split_text` converts.

use gloss_core::{Dom, DomError, NodeKind};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Node, ShadowRoot, ShadowRootInit, ShadowRootMode, Text};

#[derive(Debug, Clone)]
pub struct BrowserDom {
    document: Document,
}

impl BrowserDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// The page the script runs in
    pub fn current() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn element<'a>(&self, node: &'a Node) -> Result<&'a Element, DomError> {
        node.dyn_ref::<Element>().ok_or(DomError::NotElement)
    }
}

pub(crate) fn js_error(err: JsValue) -> DomError {
    let message = match err.dyn_ref::<js_sys::Error>() {
        Some(e) => String::from(e.message()),
        None => err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    };
    DomError::Host(message)
}

/// UTF-16 length of the first `offset` bytes of `text`
fn utf16_offset(text: &str, offset: usize) -> Result<u32, DomError> {
    let head = text.get(..offset).ok_or(DomError::OffsetOutOfBounds {
        offset,
        len: text.len(),
    })?;
    Ok(head.encode_utf16().count() as u32)
}

impl Dom for BrowserDom {
    type Node = Node;

    fn body(&self) -> Option<Node> {
        self.document.body().map(Node::from)
    }

    fn node_kind(&self, node: &Node) -> NodeKind {
        match node.node_type() {
            Node::ELEMENT_NODE => NodeKind::Element,
            Node::TEXT_NODE => NodeKind::Text,
            Node::DOCUMENT_FRAGMENT_NODE if node.dyn_ref::<ShadowRoot>().is_some() => {
                NodeKind::IsolatedRoot
            }
            _ => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>().map(|e| e.local_name())
    }

    fn text(&self, node: &Node) -> String {
        match node.node_type() {
            Node::TEXT_NODE => node.node_value().unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.item(i)).collect()
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn is_hidden(&self, node: &Node) -> bool {
        let (Some(element), Some(window)) = (node.dyn_ref::<Element>(), web_sys::window()) else {
            return false;
        };
        if element.has_attribute("hidden") {
            return true;
        }
        match window.get_computed_style(element) {
            Ok(Some(style)) => {
                style.get_property_value("display").ok().as_deref() == Some("none")
                    || style.get_property_value("visibility").ok().as_deref() == Some("hidden")
            }
            _ => false,
        }
    }

    fn is_attached(&self, node: &Node) -> bool {
        node.is_connected()
    }

    fn find_by_id(&self, id: &str) -> Option<Node> {
        self.document.get_element_by_id(id).map(Node::from)
    }

    fn create_element(&mut self, tag: &str) -> Result<Node, DomError> {
        self.document
            .create_element(tag)
            .map(Node::from)
            .map_err(js_error)
    }

    fn create_text(&mut self, text: &str) -> Node {
        self.document.create_text_node(text).into()
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), DomError> {
        self.element(node)?
            .set_attribute(name, value)
            .map_err(js_error)
    }

    fn insert_before(
        &mut self,
        parent: &Node,
        child: &Node,
        reference: Option<&Node>,
    ) -> Result<(), DomError> {
        parent
            .insert_before(child, reference)
            .map(|_| ())
            .map_err(|e| DomError::Hierarchy(js_error(e).to_string()))
    }

    fn remove(&mut self, node: &Node) -> Result<(), DomError> {
        if let Some(parent) = node.parent_node() {
            parent.remove_child(node).map_err(js_error)?;
        }
        Ok(())
    }

    fn split_text(&mut self, node: &Node, offset: usize) -> Result<Node, DomError> {
        let text = node.dyn_ref::<Text>().ok_or(DomError::NotText)?;
        let units = utf16_offset(&self.text(node), offset)?;
        text.split_text(units).map(Node::from).map_err(js_error)
    }

    fn set_text(&mut self, node: &Node, text: &str) -> Result<(), DomError> {
        if node.node_type() != Node::TEXT_NODE {
            return Err(DomError::NotText);
        }
        node.set_node_value(Some(text));
        Ok(())
    }

    fn shallow_clone(&mut self, node: &Node) -> Result<Node, DomError> {
        node.clone_node().map_err(js_error)
    }

    fn attach_isolated_root(&mut self, host: &Node) -> Result<Node, DomError> {
        let init = ShadowRootInit::new(ShadowRootMode::Open);
        self.element(host)?
            .attach_shadow(&init)
            .map(Node::from)
            .map_err(js_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_offset_counts_code_units() {
        assert_eq!(utf16_offset("abc", 2).unwrap(), 2);
        // é is two UTF-8 bytes and one UTF-16 unit
        assert_eq!(utf16_offset("café au lait", 6).unwrap(), 5);
        // 😀 is four UTF-8 bytes and two UTF-16 units
        assert_eq!(utf16_offset("😀x", 4).unwrap(), 2);
    }

    #[test]
    fn test_utf16_offset_rejects_bad_offsets() {
        assert!(utf16_offset("abc", 4).is_err());
        assert!(utf16_offset("é", 1).is_err());
    }
}
