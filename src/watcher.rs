//! Fire-once visibility tracking.
//!
//! [`VisibilityWatcher`] stands in for `IntersectionObserver` with a single
//! threshold and a null root: each observed element is reported the first
//! time the visible fraction of its box reaches the threshold, then it is
//! unobserved.
//!
//! When the document reports that intersection is unsupported, every
//! observed element is reported on the next poll. Elements are never left
//! permanently hidden just because the host lacks the primitive.

use crate::dom::Document;
use crate::types::{NodeId, Rect, Viewport};
use tracing::trace;

pub const DEFAULT_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct VisibilityWatcher {
    threshold: f64,
    observed: Vec<NodeId>,
}

impl Default for VisibilityWatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl VisibilityWatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            observed: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Start watching `node`. Observing twice has no extra effect.
    pub fn observe(&mut self, node: NodeId) {
        if !self.observed.contains(&node) {
            self.observed.push(node);
        }
    }

    pub fn unobserve(&mut self, node: NodeId) -> bool {
        let before = self.observed.len();
        self.observed.retain(|n| *n != node);
        self.observed.len() != before
    }

    pub fn is_observed(&self, node: NodeId) -> bool {
        self.observed.contains(&node)
    }

    pub fn observed(&self) -> &[NodeId] {
        &self.observed
    }

    /// Report every observed element that crossed the threshold, in
    /// registration order, and stop tracking them.
    pub fn poll(&mut self, doc: &Document) -> Vec<NodeId> {
        let (visible, hidden): (Vec<NodeId>, Vec<NodeId>) = if doc.intersection_supported {
            self.observed.iter().partition(|n| {
                is_visible(&doc.viewport, &doc.node(**n).rect, self.threshold)
            })
        } else {
            (std::mem::take(&mut self.observed), Vec::new())
        };
        self.observed = hidden;
        for node in &visible {
            trace!(%node, "element became visible");
        }
        visible
    }
}

/// Fraction of `rect` inside the viewport, in `[0, 1]`.
///
/// Zero-height boxes report 1.0 when their top edge is inside the viewport
/// and 0.0 otherwise.
pub fn intersection_ratio(viewport: &Viewport, rect: &Rect) -> f64 {
    if rect.height <= 0.0 {
        let inside = rect.top >= viewport.scroll_y && rect.top <= viewport.bottom();
        return if inside { 1.0 } else { 0.0 };
    }
    let overlap = rect.bottom().min(viewport.bottom()) - rect.top.max(viewport.scroll_y);
    (overlap.max(0.0) / rect.height).clamp(0.0, 1.0)
}

fn is_visible(viewport: &Viewport, rect: &Rect, threshold: f64) -> bool {
    let ratio = intersection_ratio(viewport, rect);
    ratio > 0.0 && ratio >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(scroll_y: f64) -> Viewport {
        Viewport {
            scroll_y,
            height: 800.0,
        }
    }

    fn doc_with_boxes(boxes: &[(f64, f64)]) -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let root = doc.root();
        let ids = boxes
            .iter()
            .map(|(top, height)| {
                let id = doc.append(root, "div");
                doc.set_rect(id, Rect::new(*top, *height));
                id
            })
            .collect();
        (doc, ids)
    }

    #[test]
    fn ratio_fully_inside() {
        assert_eq!(intersection_ratio(&vp(0.0), &Rect::new(100.0, 200.0)), 1.0);
    }

    #[test]
    fn ratio_partial_overlap() {
        // Box 700..900 against viewport 0..800 => 100/200 visible.
        assert_eq!(intersection_ratio(&vp(0.0), &Rect::new(700.0, 200.0)), 0.5);
    }

    #[test]
    fn ratio_outside() {
        assert_eq!(intersection_ratio(&vp(0.0), &Rect::new(900.0, 200.0)), 0.0);
    }

    #[test]
    fn ratio_zero_height() {
        assert_eq!(intersection_ratio(&vp(0.0), &Rect::new(10.0, 0.0)), 1.0);
        assert_eq!(intersection_ratio(&vp(0.0), &Rect::new(810.0, 0.0)), 0.0);
    }

    #[test]
    fn threshold_is_respected() {
        // 790..990: only 10px of 200 visible (5%) with threshold 10%.
        let (mut doc, ids) = doc_with_boxes(&[(790.0, 200.0)]);
        let mut watcher = VisibilityWatcher::default();
        watcher.observe(ids[0]);
        assert!(watcher.poll(&doc).is_empty());
        doc.viewport.scroll_y = 20.0;
        assert_eq!(watcher.poll(&doc), vec![ids[0]]);
    }

    #[test]
    fn fires_once_then_unobserves() {
        let (mut doc, ids) = doc_with_boxes(&[(100.0, 100.0), (2000.0, 100.0)]);
        let mut watcher = VisibilityWatcher::default();
        watcher.observe(ids[0]);
        watcher.observe(ids[0]);
        watcher.observe(ids[1]);
        assert_eq!(watcher.poll(&doc), vec![ids[0]]);
        assert!(watcher.poll(&doc).is_empty());
        assert!(!watcher.is_observed(ids[0]));
        doc.viewport.scroll_y = 1500.0;
        assert_eq!(watcher.poll(&doc), vec![ids[1]]);
        assert!(watcher.observed().is_empty());
    }

    #[test]
    fn unsupported_intersection_fails_open() {
        let (mut doc, ids) = doc_with_boxes(&[(5000.0, 100.0), (9000.0, 100.0)]);
        doc.intersection_supported = false;
        let mut watcher = VisibilityWatcher::default();
        for id in &ids {
            watcher.observe(*id);
        }
        assert_eq!(watcher.poll(&doc), ids);
        assert!(watcher.observed().is_empty());
    }

    #[test]
    fn unobserve_reports_membership() {
        let (_, ids) = doc_with_boxes(&[(0.0, 10.0)]);
        let mut watcher = VisibilityWatcher::new(0.5);
        watcher.observe(ids[0]);
        assert!(watcher.unobserve(ids[0]));
        assert!(!watcher.unobserve(ids[0]));
        assert_eq!(watcher.threshold(), 0.5);
    }
}
