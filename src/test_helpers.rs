//! Shared test utilities for the syntra-fx test suite.
//!
//! Provides a representative landing page fixture plus lookup helpers that
//! panic with a useful message instead of returning `Option`.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let doc = landing_page();
//! let card = find_by_id(&doc, "cardProjects");
//! let found = doc.query_all(".achievement-card").unwrap();
//! assert_eq!(ids_of(&doc, &found), vec!["cardProjects", "cardSatisfaction"]);
//! ```
//!
//! # Layout (800px viewport)
//!
//! ```text
//!    0  navbar, hero (heroTitle, rotating headline, #contact CTA)
//!  600  aboutSection            visible at scroll 0
//!  700  plainNote               visible at scroll 0
//! 1000  servicesSection         slide-up, 0.4s delay
//! 1500  cardProjects, cardSatisfaction
//! 1800  testimonialAda          0.2s delay, quote +0.3s
//! 2200  timeline2019
//! 2600  contactSection + contactForm
//! ```

use crate::dom::Document;
use crate::types::{NodeId, Rect};

fn add(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    id: Option<&str>,
    classes: &[&str],
) -> NodeId {
    let node = doc.append(parent, tag);
    if let Some(id) = id {
        doc.set_id(node, id);
    }
    for class in classes {
        doc.add_class(node, class);
    }
    node
}

fn add_text(doc: &mut Document, parent: NodeId, tag: &str, classes: &[&str], text: &str) -> NodeId {
    let node = add(doc, parent, tag, None, classes);
    doc.set_text(node, text);
    node
}

fn nav(doc: &mut Document, body: NodeId) {
    let navbar = add(doc, body, "nav", Some("mainNavbar"), &["navbar"]);
    doc.set_rect(navbar, Rect::new(0.0, 80.0));
    let brand = add(doc, navbar, "a", None, &["navbar-brand"]);
    doc.set_attr(brand, "href", "index.html");
    let logo = add(doc, brand, "img", Some("navLogo"), &["main-logo"]);
    doc.set_attr(logo, "alt", "SyntraEdge Global");

    let list = add(doc, navbar, "ul", None, &["navbar-nav"]);
    for (label, href) in [
        ("Home", "index.html"),
        ("Services", "services.html"),
        ("Testimonials", "testimonials.html"),
        ("About", "about.html"),
        ("Careers", "careers.html"),
        ("Contact", "contact.html"),
    ] {
        let item = add(doc, list, "li", None, &["nav-item"]);
        let link = add_text(doc, item, "a", &["nav-link"], label);
        doc.set_attr(link, "href", href);
        if label == "Services" {
            let menu = add(doc, item, "ul", None, &["dropdown-menu"]);
            let entry = add(doc, menu, "li", None, &[]);
            let sub = add_text(doc, entry, "a", &["nav-link", "dropdown-item"], "Consulting");
            doc.set_attr(sub, "href", "services.html#consulting");
        }
    }
}

fn hero(doc: &mut Document, body: NodeId) {
    let section = add(doc, body, "section", None, &["hero-section"]);
    doc.set_rect(section, Rect::new(80.0, 520.0));

    let title = add_text(doc, section, "h1", &["scroll-animate"], "Engineering what comes next");
    doc.set_id(title, "heroTitle");
    doc.set_attr(title, "data-animation", "fade-in");
    doc.set_rect(title, Rect::new(120.0, 100.0));

    let rotating = add(doc, section, "p", None, &["text-rotating"]);
    doc.set_rect(rotating, Rect::new(250.0, 40.0));
    for word in ["Innovate", "Integrate", "Elevate"] {
        let span = add_text(doc, rotating, "span", &[], word);
        doc.set_rect(span, Rect::new(250.0, 40.0));
    }

    let cta = add_text(doc, section, "a", &["btn"], "Talk to us");
    doc.set_attr(cta, "href", "#contactSection");
    doc.set_rect(cta, Rect::new(320.0, 48.0));
}

fn sections(doc: &mut Document, body: NodeId) {
    let about = add(doc, body, "section", Some("aboutSection"), &["scroll-animate"]);
    doc.set_rect(about, Rect::new(600.0, 300.0));

    let note = add_text(doc, body, "p", &["scroll-animate"], "Trusted since 2012.");
    doc.set_id(note, "plainNote");
    doc.set_rect(note, Rect::new(700.0, 50.0));

    let services = add(doc, body, "section", Some("servicesSection"), &["scroll-animate"]);
    doc.set_attr(services, "data-animation", "slide-up");
    doc.set_style(services, "transition-delay", "0.4s");
    doc.set_rect(services, Rect::new(1000.0, 400.0));

    let stats = add(doc, body, "div", None, &["row"]);
    doc.set_rect(stats, Rect::new(1500.0, 200.0));
    for (id, target, shown) in [("cardProjects", "250", "250+"), ("cardSatisfaction", "98", "98%")] {
        let card = add(doc, stats, "div", Some(id), &["achievement-card"]);
        doc.set_rect(card, Rect::new(1500.0, 200.0));
        let number = add_text(doc, card, "span", &["counter-number"], shown);
        doc.set_attr(number, "data-target", target);
        doc.set_rect(number, Rect::new(1520.0, 60.0));
    }

    let card = add(doc, body, "div", Some("testimonialAda"), &["testimonial-card"]);
    doc.set_style(card, "transition-delay", "0.2s");
    doc.set_rect(card, Rect::new(1800.0, 250.0));
    let quote = add_text(
        doc,
        card,
        "blockquote",
        &["testimonial-content"],
        "They shipped on time and under budget.",
    );
    doc.set_id(quote, "quoteAda");
    doc.set_attr(quote, "data-delay", "0.3");
    doc.set_rect(quote, Rect::new(1820.0, 120.0));

    let item = add(doc, body, "div", Some("timeline2019"), &["timeline-item"]);
    doc.set_rect(item, Rect::new(2200.0, 150.0));
}

fn contact(doc: &mut Document, body: NodeId) {
    let section = add(doc, body, "section", Some("contactSection"), &["scroll-animate"]);
    doc.set_rect(section, Rect::new(2600.0, 600.0));

    let form = add(doc, section, "form", Some("contactForm"), &["needs-validation"]);
    doc.set_attr(form, "novalidate", "");

    let name = add(doc, form, "input", Some("contactName"), &["form-control"]);
    doc.set_attr(name, "type", "text");
    doc.set_attr(name, "name", "name");
    doc.set_attr(name, "required", "");

    let email = add(doc, form, "input", Some("contactEmail"), &["form-control"]);
    doc.set_attr(email, "type", "email");
    doc.set_attr(email, "name", "email");
    doc.set_attr(email, "required", "");

    let message = add(doc, form, "textarea", Some("contactMessage"), &["form-control"]);
    doc.set_attr(message, "name", "message");

    let button = add(doc, form, "button", None, &["btn", "btn-primary"]);
    doc.set_attr(button, "type", "submit");
    add_text(doc, button, "span", &["button-text"], "Send Message");
    add(doc, button, "span", None, &["spinner-border", "d-none"]);

    let success = add_text(doc, section, "div", &["alert", "d-none"], "Thanks! We'll be in touch.");
    doc.set_id(success, "successMessage");
    let error = add_text(doc, section, "div", &["alert", "d-none"], "Something went wrong.");
    doc.set_id(error, "errorMessage");
}

/// A landing page with every effect the engine drives: nav, hero, reveal
/// sections, counters, a testimonial cascade, a timeline item, a rotating
/// headline, and the contact form.
pub fn landing_page() -> Document {
    let mut doc = Document::new();
    let body = doc.root();
    nav(&mut doc, body);
    hero(&mut doc, body);
    sections(&mut doc, body);
    contact(&mut doc, body);
    doc
}

/// Find an element by id, panicking if absent.
pub fn find_by_id(doc: &Document, id: &str) -> NodeId {
    doc.by_id(id)
        .unwrap_or_else(|| panic!("element #{id} not found"))
}

/// The ids of `nodes`, in order. Panics if any node has no id.
pub fn ids_of<'a>(doc: &'a Document, nodes: &[NodeId]) -> Vec<&'a str> {
    nodes
        .iter()
        .map(|n| {
            doc.node(*n)
                .id
                .as_deref()
                .unwrap_or_else(|| panic!("node {n} has no id"))
        })
        .collect()
}
