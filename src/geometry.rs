//! Minimal planar geometry used by the spatial picker and the
//! visibility filter.
//!
//! Coordinates are map units. [`Rect`] is always stored normalized
//! (`x_min <= x_max`, `y_min <= y_max`) no matter which corners it was
//! built from, so consumers never have to re-order drag endpoints.

/// A point in map coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in map coordinates, stored normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl Rect {
    /// Build a rectangle from two opposite corners, in any order.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            x_min: a.x.min(b.x),
            y_min: a.y.min(b.y),
            x_max: a.x.max(b.x),
            y_max: a.y.max(b.y),
        }
    }

    /// Build the square search box of half-width `radius` around a point.
    pub fn around(center: Point, radius: f64) -> Self {
        let radius = radius.abs();
        Self {
            x_min: center.x - radius,
            y_min: center.y - radius,
            x_max: center.x + radius,
            y_max: center.y + radius,
        }
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// A rectangle with zero width or zero height selects nothing.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Containment check, inclusive of the boundary.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }
}
