//! Contact form submission.
//!
//! [`FormSubmitter::submit`] validates the form, flips the submit button into
//! its busy state, and queues the request. The request itself goes out on
//! the next event-loop turn through a [`Transport`], so the busy state is
//! observable between the two. Delivery then shows the success or error
//! banner for `message_ms` and restores the button either way.
//!
//! Requests are fire-and-forget (`no-cors`): any response counts as success,
//! only a transport error counts as failure.

use crate::config::FormConfig;
use crate::dom::Document;
use crate::engine::{EventLoop, Task};
use crate::scheduler::TimerId;
use crate::types::NodeId;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error};

pub const VALIDATED_CLASS: &str = "was-validated";
pub const HIDDEN_CLASS: &str = "d-none";

/// Ids of the form and its two banners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBinding {
    pub form_id: String,
    pub success_id: String,
    pub error_id: String,
}

impl FormBinding {
    pub fn new(form_id: &str, success_id: &str, error_id: &str) -> Self {
        Self {
            form_id: form_id.to_string(),
            success_id: success_id.to_string(),
            error_id: error_id.to_string(),
        }
    }

    pub fn from_config(config: &FormConfig) -> Self {
        Self::new(&config.form_id, &config.success_id, &config.error_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Opaque response; the page never reads it.
    NoCors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub method: String,
    pub url: String,
    pub content_type: String,
    pub body: String,
    pub mode: RequestMode,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
}

/// Sends form requests on behalf of the page.
pub trait Transport {
    fn send(&mut self, request: &FormRequest) -> Result<(), TransportError>;
}

/// Transport that keeps every request and answers with a fixed outcome.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    requests: Vec<FormRequest>,
    failure: Option<TransportError>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with `error`.
    pub fn failing(error: TransportError) -> Self {
        Self {
            requests: Vec::new(),
            failure: Some(error),
        }
    }

    pub fn requests(&self) -> &[FormRequest] {
        &self.requests
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, request: &FormRequest) -> Result<(), TransportError> {
        self.requests.push(request.clone());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Form or submit button missing, or a submission is already in flight.
    Ignored,
    /// Constraint validation failed; nothing was sent.
    Invalid,
    /// Busy state applied and the request queued.
    Sending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    Send(usize),
    Hide(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed,
}

#[derive(Debug, Clone)]
struct Submission {
    request: FormRequest,
    form: NodeId,
    button: NodeId,
    label: Option<NodeId>,
    spinner: Option<NodeId>,
    success: Option<NodeId>,
    error: Option<NodeId>,
    delivery: Option<Delivery>,
}

#[derive(Debug, Clone)]
pub struct FormSubmitter {
    endpoint: String,
    message_ms: u64,
    sending_label: String,
    idle_label: String,
    submissions: Vec<Submission>,
    /// Pending hide timer per banner.
    hide_timers: HashMap<NodeId, TimerId>,
}

impl FormSubmitter {
    pub fn new(config: &FormConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            message_ms: config.message_ms,
            sending_label: config.sending_label.clone(),
            idle_label: config.idle_label.clone(),
            submissions: Vec::new(),
            hide_timers: HashMap::new(),
        }
    }

    pub fn submit(
        &mut self,
        doc: &mut Document,
        events: &mut EventLoop,
        binding: &FormBinding,
    ) -> SubmitOutcome {
        let Some(form) = doc.by_id(&binding.form_id) else {
            return SubmitOutcome::Ignored;
        };
        let Some(button) = find_descendant(doc, form, |doc, n| {
            doc.node(n).tag == "button" && doc.attr(n, "type") == Some("submit")
        }) else {
            return SubmitOutcome::Ignored;
        };
        if doc.node(button).disabled {
            return SubmitOutcome::Ignored;
        }

        let invalid = check_validity(doc, form);
        if !invalid.is_empty() {
            doc.add_class(form, VALIDATED_CLASS);
            debug!(form = %binding.form_id, invalid = invalid.len(), "form failed validation");
            return SubmitOutcome::Invalid;
        }

        let label = find_descendant(doc, button, |doc, n| doc.has_class(n, "button-text"));
        let spinner = find_descendant(doc, button, |doc, n| doc.has_class(n, "spinner-border"));
        let success = doc.by_id(&binding.success_id);
        let error = doc.by_id(&binding.error_id);

        if let Some(label) = label {
            doc.set_text(label, self.sending_label.as_str());
        }
        if let Some(spinner) = spinner {
            doc.remove_class(spinner, HIDDEN_CLASS);
        }
        doc.node_mut(button).disabled = true;
        for banner in [success, error].into_iter().flatten() {
            doc.add_class(banner, HIDDEN_CLASS);
        }

        let request = FormRequest {
            method: "POST".to_string(),
            url: self.endpoint.clone(),
            content_type: "application/x-www-form-urlencoded".to_string(),
            body: encode_form(doc, form),
            mode: RequestMode::NoCors,
        };
        let index = self.submissions.len();
        self.submissions.push(Submission {
            request,
            form,
            button,
            label,
            spinner,
            success,
            error,
            delivery: None,
        });
        events.set_timeout(0, Task::Form(FormStep::Send(index)));
        debug!(form = %binding.form_id, "form submission queued");
        SubmitOutcome::Sending
    }

    pub fn step<T: Transport + ?Sized>(
        &mut self,
        doc: &mut Document,
        events: &mut EventLoop,
        transport: &mut T,
        step: FormStep,
    ) {
        match step {
            FormStep::Hide(banner) => {
                self.hide_timers.remove(&banner);
                doc.add_class(banner, HIDDEN_CLASS);
            }
            FormStep::Send(index) => {
                let message_ms = self.message_ms;
                let idle_label = self.idle_label.clone();
                let Some(sub) = self.submissions.get_mut(index) else {
                    return;
                };
                if sub.delivery.is_some() {
                    return;
                }
                match transport.send(&sub.request) {
                    Ok(()) => {
                        sub.delivery = Some(Delivery::Sent);
                        if let Some(success) = sub.success {
                            show_banner(&mut self.hide_timers, doc, events, success, message_ms);
                        }
                        reset_form(doc, sub.form);
                        doc.remove_class(sub.form, VALIDATED_CLASS);
                        debug!(url = %sub.request.url, "form submitted");
                    }
                    Err(err) => {
                        sub.delivery = Some(Delivery::Failed);
                        error!(url = %sub.request.url, error = %err, "form submission failed");
                        if let Some(banner) = sub.error {
                            show_banner(&mut self.hide_timers, doc, events, banner, message_ms);
                        }
                    }
                }
                if let Some(label) = sub.label {
                    doc.set_text(label, idle_label);
                }
                if let Some(spinner) = sub.spinner {
                    doc.add_class(spinner, HIDDEN_CLASS);
                }
                doc.node_mut(sub.button).disabled = false;
            }
        }
    }

    /// Delivery result of every submission so far, `None` while in flight.
    pub fn deliveries(&self) -> Vec<Option<Delivery>> {
        self.submissions.iter().map(|s| s.delivery).collect()
    }
}

/// Show `banner` for `message_ms`. A hide still pending from an earlier
/// showing is dropped so it cannot cut this one short.
fn show_banner(
    hide_timers: &mut HashMap<NodeId, TimerId>,
    doc: &mut Document,
    events: &mut EventLoop,
    banner: NodeId,
    message_ms: u64,
) {
    if let Some(previous) = hide_timers.remove(&banner) {
        events.clear(previous);
    }
    doc.remove_class(banner, HIDDEN_CLASS);
    let timer = events.set_timeout(message_ms, Task::Form(FormStep::Hide(banner)));
    hide_timers.insert(banner, timer);
}

fn find_descendant(
    doc: &Document,
    scope: NodeId,
    pred: impl Fn(&Document, NodeId) -> bool,
) -> Option<NodeId> {
    doc.descendants(scope).into_iter().find(|n| pred(doc, *n))
}

fn is_field(doc: &Document, node: NodeId) -> bool {
    let el = doc.node(node);
    matches!(el.tag.as_str(), "input" | "textarea" | "select") && !el.disabled
}

fn form_fields(doc: &Document, form: NodeId) -> Vec<NodeId> {
    doc.descendants(form)
        .into_iter()
        .filter(|n| is_field(doc, *n))
        .collect()
}

/// Fields that fail constraint validation, in document order.
///
/// Checks `required` (non-empty value), `type="email"` (contains `@`) and
/// `minlength` (in characters). Empty optional fields always pass.
pub fn check_validity(doc: &Document, form: NodeId) -> Vec<NodeId> {
    form_fields(doc, form)
        .into_iter()
        .filter(|n| !field_is_valid(doc, *n))
        .collect()
}

fn field_is_valid(doc: &Document, node: NodeId) -> bool {
    let el = doc.node(node);
    let value = el.value.as_str();
    if value.is_empty() {
        return el.attr("required").is_none();
    }
    if el.attr("type") == Some("email") && !value.contains('@') {
        return false;
    }
    match el.attr("minlength").and_then(|m| m.trim().parse::<usize>().ok()) {
        Some(min) => value.chars().count() >= min,
        None => true,
    }
}

/// `application/x-www-form-urlencoded` body from the form's named fields.
pub fn encode_form(doc: &Document, form: NodeId) -> String {
    let mut body = url::form_urlencoded::Serializer::new(String::new());
    for field in form_fields(doc, form) {
        let el = doc.node(field);
        let Some(name) = el.attr("name") else {
            continue;
        };
        match el.attr("type") {
            Some("submit" | "button" | "reset") => continue,
            Some("checkbox" | "radio") if el.attr("checked").is_none() => continue,
            _ => {}
        }
        body.append_pair(name, &el.value);
    }
    body.finish()
}

/// Put every field back to its markup default (`value` attribute or empty).
pub fn reset_form(doc: &mut Document, form: NodeId) {
    for field in form_fields(doc, form) {
        let default = doc.attr(field, "value").unwrap_or_default().to_string();
        doc.node_mut(field).value = default;
    }
}
