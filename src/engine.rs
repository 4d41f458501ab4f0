//! The page engine: owns the document, the event loop, and every effect.
//!
//! The host drives it with three kinds of input:
//!
//! ```text
//! Engine::init         page load: nav state, reveal scan, hero, rotation
//! Engine::scroll_to    viewport moved: navbar state + visibility poll
//! Engine::advance      time passed: run due timers and animation frames
//! ```
//!
//! Effects never call each other through closures. Anything deferred is a
//! [`Task`] value queued on the [`EventLoop`]; the engine pops ready work and
//! routes each task back to the effect that owns it.

use crate::config::{ConfigError, EffectsConfig};
use crate::counter::{CounterEffect, CounterId};
use crate::dom::Document;
use crate::form::{FormBinding, FormStep, FormSubmitter, RecordingTransport, SubmitOutcome, Transport};
use crate::nav;
use crate::reveal::{RevealAnimator, RevealStep};
use crate::rotator::{RotationHandle, RotatorStep, TextRotator};
use crate::scheduler::{Ready, Scheduler, SchedulerError};
use crate::selector::SelectorError;
use crate::types::NodeId;
use thiserror::Error;
use tracing::{debug, info};

/// Deferred work, routed by the engine to the effect that queued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Reveal(RevealStep),
    Counter(CounterId),
    Rotator(RotatorStep),
    Form(FormStep),
}

pub type EventLoop = Scheduler<Task>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// What page load did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitSummary {
    pub active_link: Option<NodeId>,
    pub observed: usize,
    pub revealed_on_load: Vec<NodeId>,
    pub rotation: Option<RotationHandle>,
}

pub struct Engine<T: Transport = RecordingTransport> {
    doc: Document,
    events: EventLoop,
    config: EffectsConfig,
    reveal: RevealAnimator,
    counters: CounterEffect,
    rotator: TextRotator,
    forms: FormSubmitter,
    transport: T,
    location: Option<String>,
    rotation: Option<RotationHandle>,
    initialized: bool,
    tasks_run: usize,
}

impl<T: Transport> Engine<T> {
    pub fn new(doc: Document, config: EffectsConfig, transport: T) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            events: Scheduler::new(config.scheduler.frame_ms, config.scheduler.step_limit),
            reveal: RevealAnimator::new(&config.reveal)?,
            counters: CounterEffect::new(&config.counter),
            rotator: TextRotator::new(&config.rotator),
            forms: FormSubmitter::new(&config.form),
            doc,
            config,
            transport,
            location: None,
            rotation: None,
            initialized: false,
            tasks_run: 0,
        })
    }

    /// Page load. Runs once; later calls return an empty summary.
    pub fn init(&mut self) -> Result<InitSummary, EngineError> {
        if self.initialized {
            return Ok(InitSummary::default());
        }
        self.initialized = true;

        let nav_config = &self.config.navigation;
        nav::apply_logo(&mut self.doc, &nav_config.logo_path);
        let active_link = if nav_config.current_page.is_empty() {
            None
        } else {
            nav::set_active_page(&mut self.doc, &nav_config.current_page)?
        };
        nav::update_navbar(&mut self.doc, nav_config)?;

        let observed = self.reveal.scan(&mut self.doc);
        let revealed_on_load =
            self.reveal
                .poll(&mut self.doc, &mut self.events, &mut self.counters);

        let rotation = if self
            .doc
            .query_all(&self.config.rotator.container_selector)?
            .is_empty()
        {
            None
        } else {
            let selector = self.config.rotator.selector.clone();
            self.start_text_rotation(&selector)?
        };

        info!(
            observed,
            revealed = revealed_on_load.len(),
            rotating = rotation.is_some(),
            "page initialized"
        );
        Ok(InitSummary {
            active_link,
            observed,
            revealed_on_load,
            rotation,
        })
    }

    /// Move the viewport. Returns the elements revealed by the move.
    pub fn scroll_to(&mut self, scroll_y: f64) -> Result<Vec<NodeId>, EngineError> {
        self.doc.viewport.scroll_y = scroll_y.max(0.0);
        nav::update_navbar(&mut self.doc, &self.config.navigation)?;
        let revealed = self.poll_visibility();
        debug!(scroll_y, revealed = revealed.len(), "scrolled");
        Ok(revealed)
    }

    /// Re-check visibility without scrolling, e.g. after the host changed
    /// layout boxes.
    pub fn poll_visibility(&mut self) -> Vec<NodeId> {
        self.reveal
            .poll(&mut self.doc, &mut self.events, &mut self.counters)
    }

    /// Advance the clock by `ms`, running everything that falls due.
    /// Returns the number of tasks run.
    pub fn advance(&mut self, ms: u64) -> Result<usize, EngineError> {
        let until = self.events.now_ms().saturating_add(ms);
        let limit = self.events.step_limit();
        let mut steps = 0;
        while let Some(ready) = self.events.pop_next(until) {
            match ready {
                Ready::Timer(task) => {
                    let now = self.events.now_ms();
                    self.run_task(task, now);
                    steps += 1;
                }
                Ready::Frames { timestamp, tasks } => {
                    steps += tasks.len();
                    for task in tasks {
                        self.run_task(task, timestamp);
                    }
                }
            }
            if steps > limit {
                self.tasks_run += steps;
                return Err(self.events.step_limit_error().into());
            }
        }
        self.tasks_run += steps;
        Ok(steps)
    }

    /// Advance `ms` in frame-sized slices, polling visibility after each.
    pub fn run_for(&mut self, ms: u64) -> Result<usize, EngineError> {
        let end = self.events.now_ms().saturating_add(ms);
        let slice = self.events.frame_ms();
        let mut steps = 0;
        while self.events.now_ms() < end {
            let remaining = end - self.events.now_ms();
            steps += self.advance(slice.min(remaining))?;
            self.poll_visibility();
        }
        Ok(steps)
    }

    fn run_task(&mut self, task: Task, timestamp: u64) {
        match task {
            Task::Reveal(step) => step.apply(&mut self.doc),
            Task::Counter(id) => {
                self.counters
                    .on_frame(&mut self.doc, &mut self.events, id, timestamp)
            }
            Task::Rotator(step) => self.rotator.step(&mut self.doc, &mut self.events, step),
            Task::Form(step) => {
                self.forms
                    .step(&mut self.doc, &mut self.events, &mut self.transport, step)
            }
        }
    }

    pub fn submit_form(&mut self, binding: &FormBinding) -> SubmitOutcome {
        self.forms.submit(&mut self.doc, &mut self.events, binding)
    }

    /// Submit the form named in the `[form]` config section.
    pub fn submit_contact_form(&mut self) -> SubmitOutcome {
        let binding = FormBinding::from_config(&self.config.form);
        self.submit_form(&binding)
    }

    /// Start rotating the elements matching `selector`. Does nothing when
    /// nothing matches.
    pub fn start_text_rotation(
        &mut self,
        selector: &str,
    ) -> Result<Option<RotationHandle>, EngineError> {
        let fragments = self.doc.query_all(selector)?;
        let handle = self
            .rotator
            .start(&mut self.doc, &mut self.events, fragments);
        if handle.is_some() {
            self.rotation = handle;
        }
        Ok(handle)
    }

    pub fn cancel_rotation(&mut self, handle: RotationHandle) -> bool {
        if self.rotation == Some(handle) {
            self.rotation = None;
        }
        self.rotator.cancel(&mut self.events, handle)
    }

    pub fn set_active_page(&mut self, page: &str) -> Result<Option<NodeId>, EngineError> {
        Ok(nav::set_active_page(&mut self.doc, page)?)
    }

    pub fn navigate_to_home(&mut self) -> &str {
        let url = nav::home_url(&self.config.navigation.base_path);
        self.location.insert(url)
    }

    pub fn navigate_to_page(&mut self, page: &str) -> &str {
        let url = nav::page_url(&self.config.navigation.base_path, page);
        self.location.insert(url)
    }

    /// Last navigation target, if any.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn now_ms(&self) -> u64 {
        self.events.now_ms()
    }

    pub fn events(&self) -> &EventLoop {
        &self.events
    }

    pub fn tasks_run(&self) -> usize {
        self.tasks_run
    }

    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    pub fn reveal(&self) -> &RevealAnimator {
        &self.reveal
    }

    pub fn counters(&self) -> &CounterEffect {
        &self.counters
    }

    pub fn rotator(&self) -> &TextRotator {
        &self.rotator
    }

    pub fn rotation(&self) -> Option<RotationHandle> {
        self.rotation
    }

    pub fn forms(&self) -> &FormSubmitter {
        &self.forms
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Delivery, TransportError, HIDDEN_CLASS};
    use crate::rotator::displayed_fragments;
    use crate::test_helpers::*;

    fn engine() -> Engine {
        Engine::new(landing_page(), EffectsConfig::default(), RecordingTransport::new()).unwrap()
    }

    /// Scroll top to bottom in 400px steps without advancing time.
    fn scroll_through(e: &mut Engine) {
        let mut y = 0.0;
        while y <= 4000.0 {
            e.scroll_to(y).unwrap();
            y += 400.0;
        }
    }

    fn scroll_animate_targets(doc: &Document) -> Vec<NodeId> {
        doc.query_all(".scroll-animate, .achievement-card, .testimonial-card, .timeline-item")
            .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = EffectsConfig::default();
        config.reveal.threshold = 2.0;
        assert!(matches!(
            Engine::new(landing_page(), config, RecordingTransport::new()),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn init_reveals_in_view_and_hides_the_rest() {
        let mut e = engine();
        let summary = e.init().unwrap();
        let doc = e.document();
        let about = find_by_id(doc, "aboutSection");
        let contact = find_by_id(doc, "contactSection");
        assert!(summary.revealed_on_load.contains(&about));
        assert!(!summary.revealed_on_load.contains(&contact));
        assert_eq!(doc.style(contact, "opacity"), Some("0"));
        assert!(summary.rotation.is_some());
        assert!(summary.observed > summary.revealed_on_load.len());
    }

    #[test]
    fn init_runs_once() {
        let mut e = engine();
        e.init().unwrap();
        let counters = e.counters().started();
        assert_eq!(e.init().unwrap(), InitSummary::default());
        assert_eq!(e.counters().started(), counters);
    }

    #[test]
    fn init_highlights_configured_page() {
        let mut config = EffectsConfig::default();
        config.navigation.current_page = "careers".to_string();
        let mut e = Engine::new(landing_page(), config, RecordingTransport::new()).unwrap();
        let link = e.init().unwrap().active_link.unwrap();
        assert_eq!(e.document().text(link), "Careers");
    }

    #[test]
    fn scroll_updates_navbar_and_reveals() {
        let mut e = engine();
        e.init().unwrap();
        let navbar = find_by_id(e.document(), "mainNavbar");
        let contact = find_by_id(e.document(), "contactSection");

        let revealed = e.scroll_to(3000.0).unwrap();
        assert!(revealed.contains(&contact));
        assert!(e.document().has_class(navbar, "scrolled"));

        e.scroll_to(0.0).unwrap();
        assert!(!e.document().has_class(navbar, "scrolled"));
        // Revealed elements stay revealed.
        assert_eq!(e.document().style(contact, "opacity"), Some("1"));
    }

    #[test]
    fn plain_targets_reveal_exactly_once() {
        let mut e = engine();
        e.init().unwrap();
        scroll_through(&mut e);
        e.scroll_to(0.0).unwrap();
        e.advance(5000).unwrap();

        let doc = e.document();
        let plain: Vec<NodeId> = scroll_animate_targets(doc)
            .into_iter()
            .filter(|n| doc.attr(*n, "data-animation").is_none())
            .filter(|n| !doc.has_class(*n, "timeline-item"))
            .collect();
        assert!(!plain.is_empty());
        for node in plain {
            assert_eq!(doc.style(node, "opacity"), Some("1"), "{node}");
            assert!(e.reveal().is_revealed(node));
        }
        assert!(e.reveal().watcher().observed().is_empty());
        assert!(e.scroll_to(2000.0).unwrap().is_empty());
    }

    #[test]
    fn counters_finish_with_suffix() {
        let mut e = engine();
        e.init().unwrap();
        scroll_through(&mut e);
        e.advance(2500).unwrap();

        let doc = e.document();
        let projects = doc.query_all("#cardProjects .counter-number").unwrap()[0];
        let satisfaction = doc.query_all("#cardSatisfaction .counter-number").unwrap()[0];
        assert_eq!(doc.text(projects), "250+");
        assert_eq!(doc.text(satisfaction), "98%");
        assert_eq!(e.counters().finished(), 2);
    }

    #[test]
    fn testimonial_quote_after_combined_delay() {
        let mut e = engine();
        e.init().unwrap();
        let quote = find_by_id(e.document(), "quoteAda");
        scroll_through(&mut e);
        e.advance(499).unwrap();
        assert_ne!(e.document().style(quote, "opacity"), Some("1"));
        e.advance(1).unwrap();
        assert_eq!(e.document().style(quote, "opacity"), Some("1"));
    }

    #[test]
    fn rotation_cycles_and_cancels() {
        let mut e = engine();
        let handle = e.init().unwrap().rotation.unwrap();
        let fragments = e.rotator().fragments(handle).to_vec();
        assert_eq!(fragments.len(), 3);

        for _ in 0..(3 * 3000 + 550) / 10 {
            e.advance(10).unwrap();
            assert_eq!(displayed_fragments(e.document(), &fragments).len(), 1);
        }
        assert_eq!(e.rotator().current_index(handle), Some(0));

        assert!(e.cancel_rotation(handle));
        assert_eq!(e.rotation(), None);
        e.advance(10_000).unwrap();
        assert_eq!(e.rotator().current_index(handle), Some(0));
    }

    #[test]
    fn no_rotation_without_container() {
        let mut doc = Document::new();
        let root = doc.root();
        let span = doc.append(root, "span");
        doc.add_class(span, "headline");
        let mut e = Engine::new(doc, EffectsConfig::default(), RecordingTransport::new()).unwrap();
        assert_eq!(e.init().unwrap().rotation, None);
        assert!(e.events().is_idle());
    }

    #[test]
    fn rejected_submission_restores_button() {
        let transport = RecordingTransport::failing(TransportError::Network("reset".to_string()));
        let mut e = Engine::new(landing_page(), EffectsConfig::default(), transport).unwrap();
        e.init().unwrap();
        let name = find_by_id(e.document(), "contactName");
        let email = find_by_id(e.document(), "contactEmail");
        e.document_mut().node_mut(name).value = "Grace".to_string();
        e.document_mut().node_mut(email).value = "grace@example.com".to_string();

        assert_eq!(e.submit_contact_form(), SubmitOutcome::Sending);
        e.advance(0).unwrap();

        let doc = e.document();
        let button = doc.query_all("#contactForm button[type=submit]").unwrap()[0];
        let label = doc.query_all("#contactForm .button-text").unwrap()[0];
        let error_banner = find_by_id(doc, "errorMessage");
        assert!(!doc.node(button).disabled);
        assert_eq!(doc.text(label), "Send Message");
        assert!(!doc.has_class(error_banner, HIDDEN_CLASS));
        assert_eq!(e.forms().deliveries(), vec![Some(Delivery::Failed)]);
        assert_eq!(e.transport().requests().len(), 1);
    }

    #[test]
    fn intersection_unsupported_reveals_everything() {
        let mut doc = landing_page();
        doc.intersection_supported = false;
        let mut e = Engine::new(doc, EffectsConfig::default(), RecordingTransport::new()).unwrap();
        e.init().unwrap();
        e.advance(5000).unwrap();

        let doc = e.document();
        for node in scroll_animate_targets(doc) {
            assert_eq!(doc.style(node, "opacity"), Some("1"), "{node} left hidden");
        }
    }

    #[test]
    fn run_for_catches_layout_changes() {
        let mut e = engine();
        e.init().unwrap();
        let contact = find_by_id(e.document(), "contactSection");
        assert!(!e.reveal().is_revealed(contact));

        e.document_mut().node_mut(contact).rect = crate::types::Rect::new(100.0, 200.0);
        e.run_for(32).unwrap();
        assert!(e.reveal().is_revealed(contact));
        assert_eq!(e.now_ms(), 32);
    }

    #[test]
    fn runaway_loop_hits_step_limit() {
        let mut config = EffectsConfig::default();
        config.scheduler.step_limit = 3;
        config.rotator.interval_ms = 600;
        let mut e = Engine::new(landing_page(), config, RecordingTransport::new()).unwrap();
        e.init().unwrap();
        assert!(matches!(
            e.advance(60_000),
            Err(EngineError::Scheduler(SchedulerError::StepLimit { limit: 3, .. }))
        ));
        // Tasks run before the limit tripped already changed the page.
        assert!(e.tasks_run() > 3);
    }

    #[test]
    fn navigation_uses_base_path() {
        let mut config = EffectsConfig::default();
        config.navigation.base_path = "../".to_string();
        let mut e = Engine::new(landing_page(), config, RecordingTransport::new()).unwrap();
        assert_eq!(e.location(), None);
        assert_eq!(e.navigate_to_home(), "../index.html");
        assert_eq!(e.navigate_to_page("careers.html"), "../careers.html");
        assert_eq!(e.location(), Some("../careers.html"));
    }
}
