//! Shared value types used across the document model and every effect.
//!
//! These are small `Copy` types so effects can hold node handles and layout
//! boxes without borrowing the [`Document`](crate::dom::Document).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to an element inside a [`Document`](crate::dom::Document) arena.
///
/// Handles are only meaningful for the document that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Vertical layout box of an element, in CSS pixels from the document top.
///
/// Only the vertical axis matters for scroll-driven visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// The visible window onto the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current vertical scroll offset (`window.scrollY`).
    pub scroll_y: f64,
    /// Viewport height (`window.innerHeight`).
    pub height: f64,
}

impl Viewport {
    pub fn bottom(&self) -> f64 {
        self.scroll_y + self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_y: 0.0,
            height: 800.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_bottom() {
        assert_eq!(Rect::new(100.0, 50.0).bottom(), 150.0);
    }

    #[test]
    fn viewport_bottom_tracks_scroll() {
        let vp = Viewport {
            scroll_y: 400.0,
            height: 800.0,
        };
        assert_eq!(vp.bottom(), 1200.0);
    }

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId(7).to_string(), "#7");
    }
}
