//! Span materializer
//!
//! Turns a located range into a wrapper element carrying the category
//! styling, an accessible activation control and a tooltip. Wrapping is
//! attempted with a plain surround first and with extract-and-reinsert when
//! the range straddles element boundaries.

use crate::dom::{self, Dom, DomRange, PART_ATTR, PART_TOOLTIP, PART_WRAPPER};
use crate::error::{DomError, WrapError};
use crate::model::{AnnotationRequest, CategoryStyle};

/// Tooltip box. The tooltip sits in the page itself where no isolated
/// stylesheet reaches, so its look travels in the style attribute.
const TOOLTIP_CSS: &str = "position: absolute; bottom: 100%; left: 50%; \
transform: translateX(-50%); margin-bottom: 8px; padding: 8px 12px; \
min-width: 200px; max-width: 320px; background: #171717; color: #e5e5e5; \
font: 12px/1.4 system-ui, sans-serif; font-style: normal; font-weight: normal; \
text-align: left; white-space: normal; border-radius: 6px; z-index: 2147483647;";

const TOOLTIP_LINE_CSS: &str = "display: block;";

fn tooltip_css(visible: bool) -> String {
    let display = if visible { "block" } else { "none" };
    format!("{} display: {};", TOOLTIP_CSS, display)
}

/// Show or hide a tooltip built by [`Materializer::materialize`]
pub fn set_tooltip_visible<D: Dom>(
    dom: &mut D,
    tooltip: &D::Node,
    visible: bool,
) -> Result<(), DomError> {
    dom.set_attribute(tooltip, "style", &tooltip_css(visible))
}

/// An element split apart by the secondary strategy. `clone` holds the
/// children that were moved out of `original`.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<N> {
    pub original: N,
    pub clone: N,
}

/// A wrapper placed in the document
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapped<N> {
    pub wrapper: N,
    pub tooltip: N,
    pub splits: Vec<Split<N>>,
    pub matched_text: String,
}

#[derive(Debug, Clone)]
pub struct Materializer {
    class_prefix: String,
}

impl Materializer {
    pub fn new(class_prefix: &str) -> Self {
        Self {
            class_prefix: class_prefix.to_string(),
        }
    }

    /// Wrap `range` for `request`. Nothing is attached to the document
    /// unless wrapping succeeds.
    pub fn materialize<D: Dom>(
        &self,
        dom: &mut D,
        range: &DomRange<D::Node>,
        request: &AnnotationRequest,
        style: &CategoryStyle,
        tooltip_id: &str,
    ) -> Result<Wrapped<D::Node>, WrapError> {
        range.validate(dom)?;
        let matched_text = range.text(dom);
        let wrapper = self.build_wrapper(dom, request, style, tooltip_id)?;

        let splits = match surround(dom, range, &wrapper) {
            Ok(()) => Vec::new(),
            Err(primary) => {
                tracing::debug!("Surround failed ({}), extracting range instead", primary);
                extract_and_wrap(dom, range, &wrapper)?
            }
        };

        let tooltip = self.build_tooltip(dom, request, style, tooltip_id, &matched_text)?;
        dom.append_child(&wrapper, &tooltip)?;

        Ok(Wrapped {
            wrapper,
            tooltip,
            splits,
            matched_text,
        })
    }

    fn build_wrapper<D: Dom>(
        &self,
        dom: &mut D,
        request: &AnnotationRequest,
        style: &CategoryStyle,
        tooltip_id: &str,
    ) -> Result<D::Node, DomError> {
        let wrapper = dom.create_element("span")?;
        let css = format!(
            "background-color: {}; border-bottom: 2px solid {}; cursor: pointer; position: relative;",
            style.background, style.border
        );
        let label = format!("{}: {}", style.label, request.explanation);
        let class = format!("{}-highlight", self.class_prefix);

        for (name, value) in [
            ("class", class.as_str()),
            (PART_ATTR, PART_WRAPPER),
            ("data-gloss-id", request.id.as_str()),
            ("data-gloss-category", request.category.as_str()),
            ("role", "button"),
            ("tabindex", "0"),
            ("aria-label", label.as_str()),
            ("aria-describedby", tooltip_id),
            ("style", css.as_str()),
        ] {
            dom.set_attribute(&wrapper, name, value)?;
        }
        Ok(wrapper)
    }

    fn build_tooltip<D: Dom>(
        &self,
        dom: &mut D,
        request: &AnnotationRequest,
        style: &CategoryStyle,
        tooltip_id: &str,
        matched_text: &str,
    ) -> Result<D::Node, DomError> {
        let tooltip = dom.create_element("span")?;
        dom.set_attribute(&tooltip, "class", &format!("{}-tooltip", self.class_prefix))?;
        dom.set_attribute(&tooltip, PART_ATTR, PART_TOOLTIP)?;
        dom.set_attribute(&tooltip, "role", "tooltip")?;
        dom.set_attribute(&tooltip, "id", tooltip_id)?;
        dom.set_attribute(&tooltip, "style", &tooltip_css(false))?;

        let quoted = format!("\u{201c}{}\u{201d}", matched_text);
        for (part, text) in [
            ("label", style.label.as_str()),
            ("quote", quoted.as_str()),
            ("explanation", request.explanation.as_str()),
        ] {
            let line = dom.create_element("span")?;
            dom.set_attribute(&line, "class", &format!("{}-tooltip-{}", self.class_prefix, part))?;
            dom.set_attribute(&line, "style", TOOLTIP_LINE_CSS)?;
            let text = dom.create_text(text);
            dom.append_child(&line, &text)?;
            dom.append_child(&tooltip, &line)?;
        }
        Ok(tooltip)
    }
}

/// Split the boundary text nodes so the range covers whole nodes. Returns
/// the first and last covered text nodes.
fn split_boundaries<D: Dom>(
    dom: &mut D,
    range: &DomRange<D::Node>,
) -> Result<(D::Node, D::Node), DomError> {
    let end_len = dom.text(&range.end_node).len();
    if range.end_offset < end_len {
        dom.split_text(&range.end_node, range.end_offset)?;
    }

    let first = if range.start_offset > 0 {
        dom.split_text(&range.start_node, range.start_offset)?
    } else {
        range.start_node.clone()
    };

    let last = if range.is_single_node() {
        first.clone()
    } else {
        range.end_node.clone()
    };
    Ok((first, last))
}

/// Siblings of `first` up to and including `last`
fn sibling_run<D: Dom>(
    dom: &D,
    parent: &D::Node,
    first: &D::Node,
    last: &D::Node,
) -> Result<Vec<D::Node>, WrapError> {
    let children = dom.children(parent);
    let from = children.iter().position(|c| c == first);
    let to = children.iter().position(|c| c == last);
    match (from, to) {
        (Some(from), Some(to)) if from <= to => Ok(children[from..=to].to_vec()),
        _ => Err(WrapError::InvalidRange(
            "boundary nodes are not ordered siblings".into(),
        )),
    }
}

fn move_into<D: Dom>(
    dom: &mut D,
    parent: &D::Node,
    run: &[D::Node],
    wrapper: &D::Node,
) -> Result<(), DomError> {
    if let Some(first) = run.first() {
        dom.insert_before(parent, wrapper, Some(first))?;
    }
    for node in run {
        dom.append_child(wrapper, node)?;
    }
    Ok(())
}

/// Primary strategy: wrap a range whose boundaries share a parent
pub fn surround<D: Dom>(
    dom: &mut D,
    range: &DomRange<D::Node>,
    wrapper: &D::Node,
) -> Result<(), WrapError> {
    range.validate(dom)?;
    let parent = dom.parent(&range.start_node);
    if parent.is_none() || parent != dom.parent(&range.end_node) {
        return Err(WrapError::StructuralConflict);
    }
    let parent = parent.ok_or(WrapError::StructuralConflict)?;

    let (first, last) = split_boundaries(dom, range)?;
    let run = sibling_run(dom, &parent, &first, &last)?;
    move_into(dom, &parent, &run, wrapper)?;
    Ok(())
}

/// Secondary strategy: lift the range up to the boundaries' common
/// ancestor, splitting partially covered elements on the way, then move the
/// covered children into the wrapper at the range's position.
pub fn extract_and_wrap<D: Dom>(
    dom: &mut D,
    range: &DomRange<D::Node>,
    wrapper: &D::Node,
) -> Result<Vec<Split<D::Node>>, WrapError> {
    range.validate(dom)?;
    let ancestor = dom::common_ancestor(dom, &range.start_node, &range.end_node)
        .ok_or(WrapError::StructuralConflict)?;

    let (first, last) = split_boundaries(dom, range)?;
    let mut splits = Vec::new();
    let start = lift_start(dom, first, &ancestor, &mut splits)?;
    let end = lift_end(dom, last, &ancestor, &mut splits)?;

    let run = sibling_run(dom, &ancestor, &start, &end)?;
    move_into(dom, &ancestor, &run, wrapper)?;
    Ok(splits)
}

fn lift_start<D: Dom>(
    dom: &mut D,
    mut node: D::Node,
    ancestor: &D::Node,
    splits: &mut Vec<Split<D::Node>>,
) -> Result<D::Node, WrapError> {
    loop {
        let parent = dom.parent(&node).ok_or(WrapError::StructuralConflict)?;
        if &parent == ancestor {
            return Ok(node);
        }

        let siblings = dom.children(&parent);
        let index = siblings.iter().position(|c| *c == node).unwrap_or(0);
        if index == 0 {
            node = parent;
            continue;
        }

        // Move `node` and everything after it into a copy placed after `parent`.
        let grandparent = dom.parent(&parent).ok_or(WrapError::StructuralConflict)?;
        let clone = dom.shallow_clone(&parent)?;
        let next = next_sibling(dom, &grandparent, &parent);
        dom.insert_before(&grandparent, &clone, next.as_ref())?;
        for moved in &siblings[index..] {
            dom.append_child(&clone, moved)?;
        }
        splits.push(Split {
            original: parent,
            clone: clone.clone(),
        });
        node = clone;
    }
}

fn lift_end<D: Dom>(
    dom: &mut D,
    mut node: D::Node,
    ancestor: &D::Node,
    splits: &mut Vec<Split<D::Node>>,
) -> Result<D::Node, WrapError> {
    loop {
        let parent = dom.parent(&node).ok_or(WrapError::StructuralConflict)?;
        if &parent == ancestor {
            return Ok(node);
        }

        let siblings = dom.children(&parent);
        let index = siblings.iter().position(|c| *c == node).unwrap_or(0);
        if index + 1 < siblings.len() {
            // Move everything after `node` into a copy placed after `parent`.
            let grandparent = dom.parent(&parent).ok_or(WrapError::StructuralConflict)?;
            let clone = dom.shallow_clone(&parent)?;
            let next = next_sibling(dom, &grandparent, &parent);
            dom.insert_before(&grandparent, &clone, next.as_ref())?;
            for moved in &siblings[index + 1..] {
                dom.append_child(&clone, moved)?;
            }
            splits.push(Split {
                original: parent.clone(),
                clone,
            });
        }
        node = parent;
    }
}

fn next_sibling<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node) -> Option<D::Node> {
    let children = dom.children(parent);
    let index = children.iter().position(|c| c == node)?;
    children.get(index + 1).cloned()
}

/// Put the wrapper's children back where the wrapper is and discard it.
/// Returns the parent the children landed in, if the wrapper was attached
/// anywhere.
pub fn unwrap<D: Dom>(dom: &mut D, wrapper: &D::Node) -> Result<Option<D::Node>, DomError> {
    let parent = match dom.parent(wrapper) {
        Some(parent) => parent,
        None => return Ok(None),
    };
    for child in dom.children(wrapper) {
        dom.insert_before(&parent, &child, Some(wrapper))?;
    }
    dom.remove(wrapper)?;
    Ok(Some(parent))
}

/// Fold a split copy back into its original element
pub fn merge_split<D: Dom>(dom: &mut D, split: &Split<D::Node>) -> Result<(), DomError> {
    for child in dom.children(&split.clone) {
        dom.append_child(&split.original, &child)?;
    }
    dom.remove(&split.clone)?;
    dom::normalize(dom, &split.original)
}
