//! HTML parsing and serialization for [`ArenaDocument`]

use std::collections::HashMap;

use scraper::{Html, Node};

use super::{ArenaDocument, Dom, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl ArenaDocument {
    /// Parse an HTML document. Parsing never fails; malformed markup is
    /// repaired the way browsers repair it.
    pub fn parse_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut doc = ArenaDocument::without_body();
        let mut mapped = HashMap::new();

        let tree_root = html.tree.root();
        mapped.insert(tree_root.id(), doc.root());

        for node in tree_root.descendants().skip(1) {
            let parent = match node.parent().and_then(|p| mapped.get(&p.id()).copied()) {
                Some(parent) => parent,
                None => continue,
            };

            match node.value() {
                Node::Element(element) => {
                    let id = doc.append_element(&parent, element.name());
                    for (name, value) in element.attrs() {
                        // Parsed attribute names are always valid.
                        let _ = doc.set_attribute(&id, name, value);
                    }
                    mapped.insert(node.id(), id);
                }
                Node::Text(text) => {
                    let text: &str = text;
                    doc.append_text(&parent, text);
                }
                Node::Comment(comment) => {
                    let comment: &str = comment;
                    doc.append_comment(&parent, comment);
                }
                _ => {}
            }
        }

        doc
    }

    /// Serialize the document. Isolated subtrees are written as declarative
    /// shadow roots so the output reopens with the overlay intact.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>");
        for child in self.children(&self.root()) {
            self.write_node(&child, false, &mut out);
        }
        out
    }

    fn write_node(&self, node: &NodeId, raw_text: bool, out: &mut String) {
        match self.node_kind(node) {
            NodeKind::Text => {
                let text = self.text(node);
                if raw_text {
                    out.push_str(&text);
                } else {
                    out.push_str(&html_escape::encode_text(&text));
                }
            }
            NodeKind::Element => {
                let tag = self.tag_name(node).unwrap_or_default();
                out.push('<');
                out.push_str(&tag);
                for (name, value) in self.attributes(node) {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }

                if let Some(root) = self.isolated_root(node) {
                    out.push_str("<template shadowrootmode=\"open\">");
                    for child in self.children(&root) {
                        self.write_node(&child, false, out);
                    }
                    out.push_str("</template>");
                }

                let raw = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
                for child in self.children(node) {
                    self.write_node(&child, raw, out);
                }

                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
            NodeKind::Other => {
                if let Some(comment) = self.comment_text(node) {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                }
            }
            NodeKind::IsolatedRoot => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::body_text;

    #[test]
    fn test_parse_builds_body() {
        let doc = ArenaDocument::parse_html("<p>Hello <b>bold</b> world</p>");
        assert!(doc.body().is_some());
        assert_eq!(body_text(&doc), "Hello bold world");
    }

    #[test]
    fn test_parse_keeps_attributes() {
        let doc = ArenaDocument::parse_html(r#"<div id="main" class="x">t</div>"#);
        let div = doc.find_by_id("main").unwrap();
        assert_eq!(doc.attribute(&div, "class").as_deref(), Some("x"));
    }

    #[test]
    fn test_serialize_escapes_text_and_attributes() {
        let doc = ArenaDocument::parse_html(r#"<p title="a &quot;b&quot;">1 &lt; 2 &amp; 3</p>"#);
        let html = doc.to_html();

        assert!(html.contains("1 &lt; 2 &amp; 3"));
        assert!(html.contains("title=\"a &quot;b&quot;\""));
    }

    #[test]
    fn test_serialize_round_trips_text() {
        let source = "<p>One <i>two</i></p><br><script>if (a < b) {}</script>";
        let doc = ArenaDocument::parse_html(source);
        let again = ArenaDocument::parse_html(&doc.to_html());
        assert_eq!(body_text(&doc), body_text(&again));
        assert!(doc.to_html().contains("if (a < b) {}"));
    }
}
