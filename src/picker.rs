//! Map gesture state machine for picking features to link.
//!
//! A gesture is press, zero or more drags, then release or
//! cancellation, and it completes exactly once. A plain click runs a
//! point identify inside a small search box and yields at most one
//! feature; a proper drag yields every feature inside the rectangle; a
//! degenerate drag (zero width or height) yields nothing. Out-of-order
//! input is ignored rather than restarting the gesture.

use std::rc::Rc;

use tracing::debug;

use crate::feature::Feature;
use crate::geometry::{Point, Rect};
use crate::store::FeatureStore;

/// Features delivered by a completed gesture. Empty means "picked
/// nothing", which consumers treat as dismissing the pick.
pub type PickResult = Vec<Feature>;

/// Rectangle/point picking over a spatial store.
pub struct SpatialPicker {
    store: Rc<dyn FeatureStore>,
    search_radius: f64,
    start: Option<Point>,
    end: Option<Point>,
    dragging: bool,
}

impl SpatialPicker {
    /// `search_radius` is the half-width, in map units, of the box
    /// used to identify features under a plain click.
    pub fn new(store: Rc<dyn FeatureStore>, search_radius: f64) -> Self {
        Self {
            store,
            search_radius,
            start: None,
            end: None,
            dragging: false,
        }
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.dragging
    }

    /// Begin a gesture. Returns false when one is already in progress;
    /// the active gesture keeps its anchor.
    pub fn press(&mut self, at: Point) -> bool {
        if self.dragging {
            return false;
        }
        self.start = Some(at);
        self.end = Some(at);
        self.dragging = true;
        true
    }

    /// Extend the current drag. Returns false outside a gesture.
    pub fn drag_to(&mut self, at: Point) -> bool {
        if !self.dragging {
            return false;
        }
        self.end = Some(at);
        true
    }

    /// The rectangle to visualize while dragging. Hidden (`None`) when
    /// no gesture is active or the current rectangle is degenerate.
    pub fn rubber_band(&self) -> Option<Rect> {
        let (start, end) = (self.start?, self.end?);
        if !self.dragging {
            return None;
        }
        let rect = Rect::from_points(start, end);
        (!rect.is_degenerate()).then_some(rect)
    }

    /// Finish the gesture and query the store. Returns `None` when no
    /// gesture is active.
    pub fn release(&mut self) -> Option<PickResult> {
        if !self.dragging {
            return None;
        }
        let (start, end) = match (self.start, self.end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                self.reset();
                return Some(Vec::new());
            }
        };
        let result = if start == end {
            // Plain click: identify the first feature under the cursor.
            let search_box = Rect::around(start, self.search_radius);
            let mut found = self.store.features_in_rect(search_box);
            found.truncate(1);
            found
        } else {
            let rect = Rect::from_points(start, end);
            if rect.is_degenerate() {
                Vec::new()
            } else {
                self.store.features_in_rect(rect)
            }
        };
        debug!(count = result.len(), "map pick completed");
        self.reset();
        Some(result)
    }

    /// Abort the gesture, delivering the empty completion. Returns
    /// `None` when no gesture was active.
    pub fn cancel(&mut self) -> Option<PickResult> {
        if !self.dragging {
            return None;
        }
        debug!("map pick cancelled");
        self.reset();
        Some(Vec::new())
    }

    fn reset(&mut self) {
        self.start = None;
        self.end = None;
        self.dragging = false;
    }
}
