//! Plane geometry primitives and the persistent zoom transform.
//!
//! Canvas coordinates are normalized: the full logical canvas is the unit
//! square with x growing to the right and y growing downward. The
//! [`ViewTransform`] crop is a sub-rectangle of that square; display
//! coordinates are pixels of the raster currently shown.

use float_cmp::approx_eq;
use serde::{Deserialize, Serialize};

/// A point in canvas or display coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a display area in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is not positive.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// The full normalized canvas.
    pub const UNIT: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// True when either dimension is not positive.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Whether the point lies inside the rectangle (edges included).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    /// Overlap of two rectangles; empty rectangles have zero size.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0))
    }

    /// Component-wise comparison within a few ULPs.
    pub fn approx_eq(&self, other: &Rect) -> bool {
        approx_eq!(f64, self.left, other.left, ulps = 4)
            && approx_eq!(f64, self.top, other.top, ulps = 4)
            && approx_eq!(f64, self.width, other.width, ulps = 4)
            && approx_eq!(f64, self.height, other.height, ulps = 4)
    }
}

/// Currently visible sub-rectangle of the logical canvas (the zoom box).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    crop: Rect,
}

impl ViewTransform {
    /// A transform showing the whole canvas.
    pub fn new() -> Self {
        Self { crop: Rect::UNIT }
    }

    /// Visible region in normalized canvas coordinates.
    pub fn crop(&self) -> Rect {
        self.crop
    }

    /// True when the crop is a strict sub-rectangle of the canvas.
    pub fn is_zoomed(&self) -> bool {
        !self.crop.approx_eq(&Rect::UNIT)
    }

    /// Show the whole canvas again. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        let changed = self.is_zoomed();
        self.crop = Rect::UNIT;
        changed
    }

    /// Zoom into `selection`, a rectangle in pixels of the currently displayed
    /// raster of size `display`.
    ///
    /// Zooms compound: the selection is interpreted relative to what is
    /// visible now, not to the full canvas. Returns `false` without changing
    /// anything for an empty selection or display.
    pub fn zoom(&mut self, selection: Rect, display: Size) -> bool {
        if selection.is_empty() || display.is_empty() {
            return false;
        }

        let crop = self.crop;
        let zoomed = Rect::new(
            crop.left + selection.left / display.width * crop.width,
            crop.top + selection.top / display.height * crop.height,
            crop.width * selection.width / display.width,
            crop.height * selection.height / display.height,
        )
        .intersect(&Rect::UNIT);

        if zoomed.is_empty() {
            return false;
        }
        self.crop = zoomed;
        true
    }

    /// The crop mapped onto a concrete canvas rectangle.
    pub fn visible_region(&self, canvas: Rect) -> Rect {
        Rect::new(
            canvas.left + self.crop.left * canvas.width,
            canvas.top + self.crop.top * canvas.height,
            self.crop.width * canvas.width,
            self.crop.height * canvas.height,
        )
    }

    /// Map a normalized canvas point to display pixels.
    pub fn normalized_to_display(&self, p: Point, display: Size) -> Point {
        Point::new(
            (p.x - self.crop.left) / self.crop.width * display.width,
            (p.y - self.crop.top) / self.crop.height * display.height,
        )
    }

    /// Map display pixels back to a normalized canvas point.
    pub fn display_to_normalized(&self, p: Point, display: Size) -> Point {
        Point::new(
            self.crop.left + p.x / display.width * self.crop.width,
            self.crop.top + p.y / display.height * self.crop.height,
        )
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new()
    }
}
