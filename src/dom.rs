//! In-memory document model.
//!
//! A [`Document`] is an arena of [`Element`]s addressed by [`NodeId`]. It
//! carries exactly the state the site effects read and write: classes,
//! attributes, inline style properties, text, form values, and a vertical
//! layout box per element. A browser host mirrors this state onto the real
//! DOM; tests and the CLI inspect it directly.
//!
//! Missing targets are never errors here: lookups return `Option`, and
//! callers treat `None` as "nothing to do".

use crate::selector::{Selector, SelectorError};
use crate::types::{NodeId, Rect, Viewport};
use std::collections::BTreeMap;

/// A single element node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    pub id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    pub text: String,
    /// Current value for form controls.
    pub value: String,
    pub disabled: bool,
    pub rect: Rect,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn styles(&self) -> &BTreeMap<String, String> {
        &self.style
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Serialized inline style (`a: b; c: d`), empty when unset.
    pub fn style_attribute(&self) -> String {
        self.style
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Element arena plus viewport state.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    pub viewport: Viewport,
    /// Whether the host can report element visibility. When `false`, the
    /// visibility watcher treats every observed element as visible.
    pub intersection_supported: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document containing only the `body` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Element::new("body")],
            viewport: Viewport::default(),
            intersection_supported: true,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    /// Borrow an element. Handles come from this document, so a miss is a
    /// caller bug.
    pub fn node(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    /// Append a new element under `parent` and return its handle.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut element = Element::new(tag);
        element.parent = Some(parent);
        self.nodes.push(element);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// All descendants of `scope` in document (pre-)order, excluding `scope`.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(scope).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.node(*n).id.as_deref() == Some(id))
    }

    /// `document.querySelectorAll`.
    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.select(self.root(), &selector))
    }

    /// Evaluate an already-parsed selector under `scope`.
    pub fn select(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.node_mut(node).id = Some(id.to_string());
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).has_class(class)
    }

    /// Add a class; no-op if already present (`classList.add`).
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let el = self.node_mut(node);
        if !el.has_class(class) {
            el.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.retain(|c| c != class);
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).attr(name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.node_mut(node)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        self.node_mut(node).attributes.remove(name);
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node).style(property)
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        self.node_mut(node)
            .style
            .insert(property.to_string(), value.to_string());
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.node(node).text
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        self.node_mut(node).text = text.into();
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.node_mut(node).rect = rect;
    }
}
