//! Achievement counter animation.
//!
//! A counter counts from 0 up to its `data-target` over a fixed duration,
//! one update per animation frame:
//!
//! ```text
//! fraction = clamp((frame_ts - first_frame_ts) / duration, 0, 1)
//! shown    = floor(fraction * target)       (+ "%" for percentage counters)
//! ```
//!
//! When the fraction reaches 1 the text snaps to the exact target with its
//! suffix (`%` for percentage counters, `+` otherwise), whatever the frame
//! timing was. The card is tagged `data-counter-ran="true"` on the first
//! trigger and never counts again.
//!
//! A target that does not parse as an integer shows `NaN`. That failure is
//! cosmetic and never stops the page.

use crate::config::CounterConfig;
use crate::dom::Document;
use crate::engine::{EventLoop, Task};
use crate::types::NodeId;
use tracing::debug;

pub const RAN_ATTR: &str = "data-counter-ran";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterSuffix {
    /// `85%`
    Percent,
    /// `250+`
    Plus,
}

#[derive(Debug, Clone)]
struct CounterRun {
    display: NodeId,
    target: Option<i64>,
    suffix: CounterSuffix,
    started_at: Option<u64>,
    finished: bool,
}

#[derive(Debug, Clone)]
pub struct CounterEffect {
    duration_ms: u64,
    runs: Vec<CounterRun>,
}

impl CounterEffect {
    pub fn new(config: &CounterConfig) -> Self {
        Self {
            duration_ms: config.duration_ms,
            runs: Vec::new(),
        }
    }

    /// Start the counter inside `card`.
    ///
    /// Returns `None` when the card has no `.counter-number` or has already
    /// run.
    pub fn start(
        &mut self,
        doc: &mut Document,
        events: &mut EventLoop,
        card: NodeId,
    ) -> Option<CounterId> {
        let display = doc
            .descendants(card)
            .into_iter()
            .find(|n| doc.has_class(*n, "counter-number"))?;
        if doc.attr(card, RAN_ATTR) == Some("true") {
            return None;
        }
        doc.set_attr(card, RAN_ATTR, "true");

        let target = parse_int(doc.attr(display, "data-target"));
        let suffix = if doc.text(display).contains('%') {
            CounterSuffix::Percent
        } else {
            CounterSuffix::Plus
        };
        doc.set_text(display, "0");

        let id = CounterId(self.runs.len());
        self.runs.push(CounterRun {
            display,
            target,
            suffix,
            started_at: None,
            finished: false,
        });
        events.request_frame(Task::Counter(id));
        debug!(%card, ?target, ?suffix, "counter started");
        Some(id)
    }

    /// Advance a counter to the frame at `timestamp`.
    pub fn on_frame(
        &mut self,
        doc: &mut Document,
        events: &mut EventLoop,
        id: CounterId,
        timestamp: u64,
    ) {
        let duration_ms = self.duration_ms;
        let Some(run) = self.runs.get_mut(id.0) else {
            return;
        };
        if run.finished {
            return;
        }
        let started_at = *run.started_at.get_or_insert(timestamp);
        let fraction = progress(timestamp.saturating_sub(started_at), duration_ms);

        if fraction < 1.0 {
            doc.set_text(run.display, progress_text(run.target, fraction, run.suffix));
            events.request_frame(Task::Counter(id));
        } else {
            doc.set_text(run.display, final_text(run.target, run.suffix));
            run.finished = true;
            debug!(display = %run.display, "counter finished");
        }
    }

    pub fn is_finished(&self, id: CounterId) -> bool {
        self.runs.get(id.0).is_some_and(|r| r.finished)
    }

    pub fn started(&self) -> usize {
        self.runs.len()
    }

    pub fn finished(&self) -> usize {
        self.runs.iter().filter(|r| r.finished).count()
    }
}

fn progress(elapsed_ms: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
}

/// Integer prefix of `value`, like `parseInt(value, 10)`.
pub fn parse_int(value: Option<&str>) -> Option<i64> {
    let value = value?.trim_start();
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, value.strip_prefix('+').unwrap_or(value)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn number_text(value: Option<i64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |v| v.to_string())
}

/// Text shown mid-animation: truncated, never rounded.
pub fn progress_text(target: Option<i64>, fraction: f64, suffix: CounterSuffix) -> String {
    let shown = target.map(|t| (fraction * t as f64).floor() as i64);
    let mut text = number_text(shown);
    if suffix == CounterSuffix::Percent {
        text.push('%');
    }
    text
}

/// Text shown once the counter completes.
pub fn final_text(target: Option<i64>, suffix: CounterSuffix) -> String {
    let mut text = number_text(target);
    text.push(match suffix {
        CounterSuffix::Percent => '%',
        CounterSuffix::Plus => '+',
    });
    text
}
