//! Scroll-triggered reveal effects.
//!
//! At page load every element matching the reveal selector is hidden
//! (`opacity: 0`) and handed to a [`VisibilityWatcher`]. Hero elements are
//! revealed on the spot. When an element first comes into view it is
//! revealed once:
//!
//! | `data-animation` | class added | final style |
//! |---|---|---|
//! | `fade-in` | `animate-fade-in-on-scroll` | opacity 1, `translateY(0)` |
//! | `slide-up` | `animate-slide-up-on-scroll` | opacity 1, `translateY(0)` |
//! | anything else | none | opacity 1, `translateY(0)` |
//!
//! The final style lands after the element's delay, read from its inline
//! `transition-delay` or else its `data-delay` attribute (seconds).
//!
//! Role classes add more work on reveal:
//!
//! - `achievement-card` starts the [`CounterEffect`] on its counter.
//! - `testimonial-card` cascades to each `.testimonial-content` child after
//!   `card delay + child data-delay`.
//! - `timeline-item` gets the `show` class.

use crate::config::RevealConfig;
use crate::counter::CounterEffect;
use crate::dom::Document;
use crate::engine::{EventLoop, Task};
use crate::selector::{Selector, SelectorError};
use crate::types::NodeId;
use crate::watcher::VisibilityWatcher;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    FadeIn,
    SlideUp,
    None,
}

impl AnimationKind {
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("fade-in") => Self::FadeIn,
            Some("slide-up") => Self::SlideUp,
            _ => Self::None,
        }
    }

    pub fn class_name(self) -> Option<&'static str> {
        match self {
            Self::FadeIn => Some("animate-fade-in-on-scroll"),
            Self::SlideUp => Some("animate-slide-up-on-scroll"),
            Self::None => None,
        }
    }
}

/// Neutral transform written when an element finishes revealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealTransform {
    /// `translateY(0)`, used by sections and cards.
    Vertical,
    /// `translate(0, 0)`, used by testimonial content.
    Planar,
}

impl RevealTransform {
    pub fn css(self) -> &'static str {
        match self {
            Self::Vertical => "translateY(0)",
            Self::Planar => "translate(0, 0)",
        }
    }
}

/// A deferred "flip to revealed" write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealStep {
    pub node: NodeId,
    pub transform: RevealTransform,
}

impl RevealStep {
    pub fn apply(self, doc: &mut Document) {
        doc.set_style(self.node, "opacity", "1");
        doc.set_style(self.node, "transform", self.transform.css());
    }
}

#[derive(Debug)]
pub struct RevealAnimator {
    watcher: VisibilityWatcher,
    targets: Selector,
    hero: Selector,
    revealed: BTreeSet<NodeId>,
}

impl RevealAnimator {
    pub fn new(config: &RevealConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            watcher: VisibilityWatcher::new(config.threshold),
            targets: Selector::parse(&config.selector)?,
            hero: Selector::parse(&config.hero_selector)?,
            revealed: BTreeSet::new(),
        })
    }

    pub fn watcher(&self) -> &VisibilityWatcher {
        &self.watcher
    }

    pub fn is_revealed(&self, node: NodeId) -> bool {
        self.revealed.contains(&node)
    }

    pub fn revealed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.revealed.iter().copied()
    }

    /// Page-load scan. Hides and observes reveal targets, reveals hero
    /// elements immediately. Returns the number of observed elements.
    pub fn scan(&mut self, doc: &mut Document) -> usize {
        let root = doc.root();
        for node in doc.select(root, &self.targets) {
            if self.revealed.contains(&node) {
                continue;
            }
            if self.hero.matches(doc, node) {
                self.reveal_hero(doc, node);
            } else {
                doc.set_style(node, "opacity", "0");
                self.watcher.observe(node);
            }
        }
        self.watcher.observed().len()
    }

    /// Reveal every watched element that is now in view.
    pub fn poll(
        &mut self,
        doc: &mut Document,
        events: &mut EventLoop,
        counters: &mut CounterEffect,
    ) -> Vec<NodeId> {
        let visible = self.watcher.poll(doc);
        for node in &visible {
            self.reveal(doc, events, counters, *node);
        }
        visible
    }

    /// Reveal one element. A second call for the same element does nothing
    /// and returns `false`.
    pub fn reveal(
        &mut self,
        doc: &mut Document,
        events: &mut EventLoop,
        counters: &mut CounterEffect,
        node: NodeId,
    ) -> bool {
        if !self.revealed.insert(node) {
            return false;
        }
        self.watcher.unobserve(node);

        let kind = AnimationKind::from_attr(doc.attr(node, "data-animation"));
        let delay_ms = element_delay_ms(doc, node);
        if let Some(class) = kind.class_name() {
            doc.add_class(node, class);
            doc.set_style(node, "animation-delay", &format_seconds(delay_ms));
        }
        schedule(
            doc,
            events,
            delay_ms,
            RevealStep {
                node,
                transform: RevealTransform::Vertical,
            },
        );
        debug!(%node, ?kind, delay_ms, "revealing element");

        if doc.has_class(node, "achievement-card") {
            counters.start(doc, events, node);
        }
        if doc.has_class(node, "testimonial-card") {
            cascade_testimonial(doc, events, node, delay_ms);
        }
        if doc.has_class(node, "timeline-item") {
            doc.add_class(node, "show");
        }
        true
    }

    fn reveal_hero(&mut self, doc: &mut Document, node: NodeId) {
        self.revealed.insert(node);
        let kind = AnimationKind::from_attr(doc.attr(node, "data-animation"));
        if let Some(class) = kind.class_name() {
            doc.add_class(node, class);
        }
        RevealStep {
            node,
            transform: RevealTransform::Vertical,
        }
        .apply(doc);
    }
}

/// Apply `step` now when there is no delay, otherwise after `delay_ms`.
fn schedule(doc: &mut Document, events: &mut EventLoop, delay_ms: u64, step: RevealStep) {
    if delay_ms == 0 {
        step.apply(doc);
    } else {
        events.set_timeout(delay_ms, Task::Reveal(step));
    }
}

fn cascade_testimonial(
    doc: &mut Document,
    events: &mut EventLoop,
    card: NodeId,
    parent_delay_ms: u64,
) {
    let contents: Vec<NodeId> = doc
        .descendants(card)
        .into_iter()
        .filter(|n| doc.has_class(*n, "testimonial-content"))
        .collect();
    for content in contents {
        let own = doc.attr(content, "data-delay").map_or(0, parse_delay_ms);
        schedule(
            doc,
            events,
            parent_delay_ms + own,
            RevealStep {
                node: content,
                transform: RevealTransform::Planar,
            },
        );
    }
}

/// Delay configured on an element: inline `transition-delay`, else the
/// `data-delay` attribute.
pub fn element_delay_ms(doc: &Document, node: NodeId) -> u64 {
    doc.style(node, "transition-delay")
        .or_else(|| doc.attr(node, "data-delay"))
        .map_or(0, parse_delay_ms)
}

/// Parse a delay written in seconds (`"0.3"`, `"0.2s"`) or milliseconds
/// (`"150ms"`). Parsing takes the longest numeric prefix, like
/// `parseFloat`; anything unparseable or negative is zero.
pub fn parse_delay_ms(value: &str) -> u64 {
    let value = value.trim();
    let numeric_len = value
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        .count();
    let (number, unit) = value.split_at(numeric_len);
    let Ok(amount) = number.parse::<f64>() else {
        return 0;
    };
    let ms = if unit.trim_start().starts_with("ms") {
        amount
    } else {
        amount * 1000.0
    };
    if ms.is_finite() && ms > 0.0 {
        ms.round() as u64
    } else {
        0
    }
}

fn format_seconds(ms: u64) -> String {
    format!("{}s", ms as f64 / 1000.0)
}
