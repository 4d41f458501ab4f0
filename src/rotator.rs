//! Hero text rotation.
//!
//! One fragment of a rotating headline is shown at a time. Each interval:
//!
//! ```text
//! t            current fragment: opacity 0, translateY(10px)   (exit)
//! t + exit     all fragments display:none, next one inline-block
//! t + exit + entrance   next fragment: opacity 1, translateY(0)
//! ```
//!
//! The old fragment keeps `display: inline-block` until the swap, so exactly
//! one fragment is displayed at every instant. Rotation never ends on its
//! own; [`TextRotator::start`] returns a [`RotationHandle`] that cancels it.

use crate::config::RotatorConfig;
use crate::dom::Document;
use crate::engine::{EventLoop, Task};
use crate::scheduler::TimerId;
use crate::types::NodeId;
use tracing::debug;

/// Cancels a running rotation via [`TextRotator::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RotationHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotatorPhase {
    Exit,
    Swap,
    Enter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotatorStep {
    pub rotation: RotationHandle,
    pub phase: RotatorPhase,
}

#[derive(Debug, Clone)]
struct Rotation {
    fragments: Vec<NodeId>,
    index: usize,
    interval: TimerId,
    pending: Vec<TimerId>,
    cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct TextRotator {
    interval_ms: u64,
    exit_ms: u64,
    entrance_ms: u64,
    rotations: Vec<Rotation>,
}

impl TextRotator {
    pub fn new(config: &RotatorConfig) -> Self {
        Self {
            interval_ms: config.interval_ms,
            exit_ms: config.exit_ms,
            entrance_ms: config.entrance_ms,
            rotations: Vec::new(),
        }
    }

    /// Show the first fragment, hide the rest, and start the interval.
    /// Returns `None` for an empty fragment list.
    pub fn start(
        &mut self,
        doc: &mut Document,
        events: &mut EventLoop,
        fragments: Vec<NodeId>,
    ) -> Option<RotationHandle> {
        if fragments.is_empty() {
            return None;
        }
        for (i, fragment) in fragments.iter().enumerate() {
            let display = if i == 0 { "inline-block" } else { "none" };
            doc.set_style(*fragment, "display", display);
        }
        let handle = RotationHandle(self.rotations.len());
        let interval = events.set_interval(
            self.interval_ms,
            Task::Rotator(RotatorStep {
                rotation: handle,
                phase: RotatorPhase::Exit,
            }),
        );
        debug!(fragments = fragments.len(), interval_ms = self.interval_ms, "text rotation started");
        self.rotations.push(Rotation {
            fragments,
            index: 0,
            interval,
            pending: Vec::new(),
            cancelled: false,
        });
        Some(handle)
    }

    pub fn step(&mut self, doc: &mut Document, events: &mut EventLoop, step: RotatorStep) {
        let Some(rotation) = self.rotations.get_mut(step.rotation.0) else {
            return;
        };
        if rotation.cancelled {
            return;
        }
        match step.phase {
            RotatorPhase::Exit => {
                let current = rotation.fragments[rotation.index];
                doc.set_style(current, "opacity", "0");
                doc.set_style(current, "transform", "translateY(10px)");
                rotation.index = (rotation.index + 1) % rotation.fragments.len();
                rotation.pending.retain(|id| events.is_pending(*id));
                rotation.pending.push(events.set_timeout(
                    self.exit_ms,
                    Task::Rotator(RotatorStep {
                        phase: RotatorPhase::Swap,
                        ..step
                    }),
                ));
            }
            RotatorPhase::Swap => {
                for fragment in &rotation.fragments {
                    doc.set_style(*fragment, "display", "none");
                }
                let next = rotation.fragments[rotation.index];
                doc.set_style(next, "display", "inline-block");
                rotation.pending.push(events.set_timeout(
                    self.entrance_ms,
                    Task::Rotator(RotatorStep {
                        phase: RotatorPhase::Enter,
                        ..step
                    }),
                ));
            }
            RotatorPhase::Enter => {
                let next = rotation.fragments[rotation.index];
                doc.set_style(next, "opacity", "1");
                doc.set_style(next, "transform", "translateY(0)");
            }
        }
    }

    /// Stop a rotation: clears its interval and any queued steps. The
    /// fragments keep whatever state they were in. Returns `false` if the
    /// rotation was already cancelled.
    pub fn cancel(&mut self, events: &mut EventLoop, handle: RotationHandle) -> bool {
        let Some(rotation) = self.rotations.get_mut(handle.0) else {
            return false;
        };
        if rotation.cancelled {
            return false;
        }
        rotation.cancelled = true;
        events.clear(rotation.interval);
        for id in rotation.pending.drain(..) {
            events.clear(id);
        }
        debug!(rotation = handle.0, "text rotation cancelled");
        true
    }

    pub fn is_running(&self, handle: RotationHandle) -> bool {
        self.rotations.get(handle.0).is_some_and(|r| !r.cancelled)
    }

    /// Index of the fragment currently being shown (or about to be shown).
    pub fn current_index(&self, handle: RotationHandle) -> Option<usize> {
        self.rotations.get(handle.0).map(|r| r.index)
    }

    pub fn fragments(&self, handle: RotationHandle) -> &[NodeId] {
        self.rotations
            .get(handle.0)
            .map_or(&[], |r| r.fragments.as_slice())
    }
}

/// Fragments whose `display` is not `none`.
pub fn displayed_fragments(doc: &Document, fragments: &[NodeId]) -> Vec<NodeId> {
    fragments
        .iter()
        .copied()
        .filter(|f| doc.style(*f, "display") != Some("none"))
        .collect()
}
