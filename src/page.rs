//! Page fixtures: a serialized element tree with layout boxes.
//!
//! A fixture describes what a browser host would report for a page: the
//! element tree, each element's vertical box, the viewport height, and
//! whether visibility reporting is available. TOML and JSON are accepted,
//! chosen by file extension.
//!
//! ```toml
//! title = "Home"
//! viewport_height = 800.0
//!
//! [[elements]]
//! tag = "section"
//! id = "aboutSection"
//! classes = ["scroll-animate"]
//! attributes = { "data-animation" = "fade-in" }
//! top = 600.0
//! height = 300.0
//! ```

use crate::dom::Document;
use crate::types::{NodeId, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported page format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("invalid tag name {0:?}")]
    InvalidTag(String),
    #[error("invalid attribute name {0:?}")]
    InvalidAttribute(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSpec {
    pub title: String,
    pub viewport_height: f64,
    pub intersection_supported: bool,
    pub elements: Vec<ElementSpec>,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            title: String::new(),
            viewport_height: 800.0,
            intersection_supported: true,
            elements: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElementSpec {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    pub text: String,
    pub value: String,
    pub disabled: bool,
    pub top: f64,
    pub height: f64,
    pub children: Vec<ElementSpec>,
}

impl Default for ElementSpec {
    fn default() -> Self {
        Self {
            tag: "div".to_string(),
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            disabled: false,
            top: 0.0,
            height: 0.0,
            children: Vec::new(),
        }
    }
}

/// Read a page fixture, picking the parser from the file extension.
pub fn load_page(path: &Path) -> Result<PageSpec, PageError> {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let content = match format.as_deref() {
        Some("toml" | "json") => fs::read_to_string(path)?,
        _ => return Err(PageError::UnsupportedFormat(path.to_path_buf())),
    };
    match format.as_deref() {
        Some("json") => Ok(serde_json::from_str(&content)?),
        _ => Ok(toml::from_str(&content)?),
    }
}

/// Whether `path` looks like a page fixture.
pub fn is_page_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml") || e.eq_ignore_ascii_case("json"))
}

/// Letters, digits and `-`, starting with a letter.
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// HTML attribute name: no whitespace, quotes, `>`, `/`, `=` or control
/// characters.
pub fn is_valid_attr_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            !c.is_whitespace() && !c.is_control() && !matches!(c, '"' | '\'' | '>' | '/' | '=' | '<')
        })
}

impl PageSpec {
    pub fn to_document(&self) -> Result<Document, PageError> {
        let mut doc = Document::new();
        doc.viewport.height = self.viewport_height;
        doc.intersection_supported = self.intersection_supported;
        let root = doc.root();
        for element in &self.elements {
            build(&mut doc, root, element)?;
        }
        Ok(doc)
    }

    /// Number of elements in the tree.
    pub fn element_count(&self) -> usize {
        fn count(elements: &[ElementSpec]) -> usize {
            elements.iter().map(|e| 1 + count(&e.children)).sum()
        }
        count(&self.elements)
    }
}

fn build(doc: &mut Document, parent: NodeId, spec: &ElementSpec) -> Result<NodeId, PageError> {
    if !is_valid_tag(&spec.tag) {
        return Err(PageError::InvalidTag(spec.tag.clone()));
    }
    let node = doc.append(parent, &spec.tag);
    if let Some(id) = &spec.id {
        doc.set_id(node, id);
    }
    for class in &spec.classes {
        doc.add_class(node, class);
    }
    for (name, value) in &spec.attributes {
        if !is_valid_attr_name(name) {
            return Err(PageError::InvalidAttribute(name.clone()));
        }
        doc.set_attr(node, name, value);
    }
    for (property, value) in &spec.style {
        doc.set_style(node, property, value);
    }
    doc.set_rect(node, Rect::new(spec.top, spec.height));
    let el = doc.node_mut(node);
    el.text = spec.text.clone();
    el.value = spec.value.clone();
    el.disabled = spec.disabled;
    for child in &spec.children {
        build(doc, node, child)?;
    }
    Ok(node)
}
