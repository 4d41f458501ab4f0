//! CLI output formatting for `simulate` and `check`.
//!
//! # Element Labels
//!
//! Elements are shown by identity, not position in the arena: the tag, then
//! `#id` when there is one, otherwise the first class (`section#about`,
//! `span.counter-number`). See [`element_label`].
//!
//! # Output Format
//!
//! ## Simulate
//!
//! ```text
//! Page: Home (41 elements)
//!     Active link: a.nav-link
//!     Observed: 8
//!     Revealed on load: section#aboutSection, p#plainNote
//! Scroll 1200px
//!     Revealed: section#servicesSection
//! Ran 5000ms (392 tasks)
//!
//! Revealed (4)
//! 001 h1#heroTitle
//! 002 section#aboutSection
//!
//! Counters
//! 001 span.counter-number → 250+
//!
//! Rotation
//!     Showing: Integrate
//!
//! Form
//!     Outcome: sending → sent
//!     POST https://forms.gle/QjLMWKZg1ES6ZEWL7 (no-cors)
//!         name=Ada&email=ada%40example.com
//! ```
//!
//! ## Check
//!
//! ```text
//! ok      home.toml (41 elements)
//! FAILED  broken.json
//!     JSON parse error: ...
//!
//! Checked 2 pages, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::dom::Document;
use crate::form::{Delivery, FormRequest, RequestMode, SubmitOutcome};
use crate::types::NodeId;
use std::path::PathBuf;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `tag#id`, else `tag.first-class`, else the bare tag.
pub fn element_label(doc: &Document, node: NodeId) -> String {
    let el = doc.node(node);
    match (&el.id, el.classes().first()) {
        (Some(id), _) => format!("{}#{}", el.tag, id),
        (None, Some(class)) => format!("{}.{}", el.tag, class),
        (None, None) => el.tag.clone(),
    }
}

pub fn element_labels(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
    nodes.iter().map(|n| element_label(doc, *n)).collect()
}

fn joined_or_none(labels: &[String]) -> String {
    if labels.is_empty() {
        "none".to_string()
    } else {
        labels.join(", ")
    }
}

// ============================================================================
// Simulate
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollStep {
    pub scroll_y: f64,
    pub revealed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormReport {
    pub outcome: SubmitOutcome,
    pub delivery: Option<Delivery>,
    pub requests: Vec<FormRequest>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    pub title: String,
    pub elements: usize,
    pub active_link: Option<String>,
    pub observed: usize,
    pub revealed_on_load: Vec<String>,
    pub scrolls: Vec<ScrollStep>,
    pub elapsed_ms: u64,
    pub tasks_run: usize,
    pub revealed: Vec<String>,
    /// Counter label and its final text.
    pub counters: Vec<(String, String)>,
    /// Text of the fragment on display, when a rotation is running.
    pub rotation: Option<String>,
    pub form: Option<FormReport>,
    pub location: Option<String>,
    pub html_path: Option<PathBuf>,
}

fn outcome_name(outcome: SubmitOutcome) -> &'static str {
    match outcome {
        SubmitOutcome::Ignored => "ignored",
        SubmitOutcome::Invalid => "invalid",
        SubmitOutcome::Sending => "sending",
    }
}

fn delivery_name(delivery: Option<Delivery>) -> &'static str {
    match delivery {
        Some(Delivery::Sent) => "sent",
        Some(Delivery::Failed) => "failed",
        None => "pending",
    }
}

fn format_form(form: &FormReport) -> Vec<String> {
    let mut lines = vec!["Form".to_string()];
    let outcome = match form.outcome {
        SubmitOutcome::Sending => format!(
            "{} → {}",
            outcome_name(form.outcome),
            delivery_name(form.delivery)
        ),
        other => outcome_name(other).to_string(),
    };
    lines.push(format!("{}Outcome: {}", indent(1), outcome));
    for request in &form.requests {
        let mode = match request.mode {
            RequestMode::NoCors => "no-cors",
        };
        lines.push(format!(
            "{}{} {} ({})",
            indent(1),
            request.method,
            request.url,
            mode
        ));
        if !request.body.is_empty() {
            lines.push(format!("{}{}", indent(2), request.body));
        }
    }
    lines
}

pub fn format_simulation(report: &SimulationReport) -> Vec<String> {
    let mut lines = Vec::new();
    let title = if report.title.is_empty() {
        "(untitled)"
    } else {
        report.title.as_str()
    };
    lines.push(format!("Page: {} ({} elements)", title, report.elements));
    if let Some(link) = &report.active_link {
        lines.push(format!("{}Active link: {}", indent(1), link));
    }
    lines.push(format!("{}Observed: {}", indent(1), report.observed));
    lines.push(format!(
        "{}Revealed on load: {}",
        indent(1),
        joined_or_none(&report.revealed_on_load)
    ));

    for scroll in &report.scrolls {
        lines.push(format!("Scroll {}px", scroll.scroll_y));
        lines.push(format!(
            "{}Revealed: {}",
            indent(1),
            joined_or_none(&scroll.revealed)
        ));
    }
    lines.push(format!(
        "Ran {}ms ({} tasks)",
        report.elapsed_ms, report.tasks_run
    ));

    lines.push(String::new());
    lines.push(format!("Revealed ({})", report.revealed.len()));
    for (i, label) in report.revealed.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), label));
    }

    if !report.counters.is_empty() {
        lines.push(String::new());
        lines.push("Counters".to_string());
        for (i, (label, text)) in report.counters.iter().enumerate() {
            lines.push(format!("{} {} → {}", format_index(i + 1), label, text));
        }
    }

    if let Some(showing) = &report.rotation {
        lines.push(String::new());
        lines.push("Rotation".to_string());
        lines.push(format!("{}Showing: {}", indent(1), showing));
    }

    if let Some(form) = &report.form {
        lines.push(String::new());
        lines.extend(format_form(form));
    }

    if let Some(location) = &report.location {
        lines.push(String::new());
        lines.push(format!("Location: {}", location));
    }
    if let Some(path) = &report.html_path {
        lines.push(format!("HTML: {}", path.display()));
    }
    lines
}

/// Print a simulation report to stdout.
pub fn print_simulation(report: &SimulationReport) {
    for line in format_simulation(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PageCheck {
    /// Path relative to the checked directory.
    pub path: PathBuf,
    /// Element count, or the error message.
    pub result: Result<usize, String>,
}

pub fn format_check(checks: &[PageCheck]) -> Vec<String> {
    let mut lines = Vec::new();
    for check in checks {
        match &check.result {
            Ok(count) => lines.push(format!(
                "ok      {} ({} elements)",
                check.path.display(),
                count
            )),
            Err(message) => {
                lines.push(format!("FAILED  {}", check.path.display()));
                lines.push(format!("{}{}", indent(1), message));
            }
        }
    }
    let failed = checks.iter().filter(|c| c.result.is_err()).count();
    if !checks.is_empty() {
        lines.push(String::new());
    }
    let noun = if checks.len() == 1 { "page" } else { "pages" };
    lines.push(format!("Checked {} {}, {} failed", checks.len(), noun, failed));
    lines
}

/// Print check results to stdout.
pub fn print_check(checks: &[PageCheck]) {
    for line in format_check(checks) {
        println!("{}", line);
    }
}
