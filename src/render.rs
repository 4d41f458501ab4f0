//! HTML snapshots of a document.
//!
//! The page shell is a Maud template; the element tree is serialized by hand
//! because tag names are data. Every text and attribute value still goes
//! through Maud's escaping.

use crate::dom::{Document, Element};
use crate::types::NodeId;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const VOID_TAGS: [&str; 8] = ["area", "br", "col", "hr", "img", "input", "link", "meta"];

/// Render the whole document, `body` included.
pub fn render_document(doc: &Document, title: &str) -> Markup {
    let mut body = String::new();
    render_element(doc, doc.root(), &mut body);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
            }
            (PreEscaped(body))
        }
    }
}

fn escape(value: &str) -> String {
    html! { (value) }.into_string()
}

fn render_element(doc: &Document, node: NodeId, out: &mut String) {
    let el = doc.node(node);
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in attributes(el) {
        out.push(' ');
        out.push_str(&name);
        if let Some(value) = value {
            out.push_str("=\"");
            out.push_str(&escape(&value));
            out.push('"');
        }
    }
    out.push('>');
    if VOID_TAGS.contains(&el.tag.as_str()) {
        return;
    }
    if el.tag == "textarea" {
        out.push_str(&escape(&el.value));
    } else {
        out.push_str(&escape(&el.text));
    }
    for child in el.children() {
        render_element(doc, *child, out);
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

/// Attributes in output order: id, class, the rest sorted, live form state,
/// then the inline style. `None` marks a boolean attribute.
fn attributes(el: &Element) -> Vec<(String, Option<String>)> {
    let mut attrs = Vec::new();
    if let Some(id) = &el.id {
        attrs.push(("id".to_string(), Some(id.clone())));
    }
    if !el.classes().is_empty() {
        attrs.push(("class".to_string(), Some(el.classes().join(" "))));
    }
    for (name, value) in el.attributes() {
        if matches!(name.as_str(), "id" | "class" | "style" | "disabled") {
            continue;
        }
        if name == "value" && el.tag == "input" {
            continue;
        }
        attrs.push((name.clone(), Some(value.clone())));
    }
    if el.tag == "input" && !el.value.is_empty() {
        attrs.push(("value".to_string(), Some(el.value.clone())));
    }
    if el.disabled {
        attrs.push(("disabled".to_string(), None));
    }
    let style = el.style_attribute();
    if !style.is_empty() {
        attrs.push(("style".to_string(), Some(style)));
    }
    attrs
}
