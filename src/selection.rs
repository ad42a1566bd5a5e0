//! Aspect-locked rubber-band selection used to pick a zoom region.

use crate::view::{Point, Rect, Size};

/// Rectangle spanned by a pointer drag, locked to the display aspect ratio.
///
/// The rectangle is anchored at `origin` and only ever grows to reach the
/// display aspect ratio. When growing would cross a display edge, the
/// overflowing dimension is clamped to that edge and the other one re-derived
/// from the aspect ratio. The horizontal axis is resolved before the vertical
/// one. Returns `None` for an empty display or a rectangle without area.
pub fn selection_rect(origin: Point, pointer: Point, display: Size) -> Option<Rect> {
    if display.is_empty() {
        return None;
    }
    let (dw, dh) = (display.width, display.height);

    let ox = origin.x.clamp(0.0, dw);
    let oy = origin.y.clamp(0.0, dh);
    let x = pointer.x.clamp(0.0, dw);
    let y = pointer.y.clamp(0.0, dh);

    let mut w = (x - ox).abs();
    let mut h = (y - oy).abs();

    let prop = h / w;
    let i_prop = dh / dw;
    if prop < i_prop {
        h = i_prop * w;
    } else if prop > i_prop {
        w = h / i_prop;
    }

    let mut left = ox;
    let mut top = oy;

    if ox <= x {
        if ox + w > dw {
            w = dw - ox;
            h = i_prop * w;
        }
    } else {
        if ox - w < 0.0 {
            w = ox;
            h = i_prop * w;
        }
        left = ox - w;
    }

    if oy <= y {
        if oy + h > dh {
            h = dh - oy;
            w = h / i_prop;
        }
    } else {
        if oy - h < 0.0 {
            h = oy;
            w = h / i_prop;
        }
        top = oy - h;
    }

    (w > 0.0 && h > 0.0).then(|| Rect::new(left, top, w, h))
}

/// Transient state of one press-drag-release zoom gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoomDrag {
    origin: Option<Point>,
    selection: Option<Rect>,
}

impl ZoomDrag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a press is in progress.
    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }

    /// Rectangle currently shown, if any.
    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    /// Start a gesture at `point`.
    pub fn press(&mut self, point: Point) {
        self.origin = Some(point);
        self.selection = None;
    }

    /// Track the pointer. A motion that yields no valid rectangle keeps the
    /// previously shown one.
    pub fn motion(&mut self, point: Point, display: Size) -> Option<Rect> {
        let origin = self.origin?;
        if origin != point
            && let Some(rect) = selection_rect(origin, point, display)
        {
            self.selection = Some(rect);
        }
        self.selection
    }

    /// End the gesture, returning the rectangle to zoom into.
    ///
    /// The gesture state is cleared whether or not a rectangle was produced.
    pub fn release(&mut self) -> Option<Rect> {
        let was_active = self.origin.take().is_some();
        let selection = self.selection.take();
        if was_active { selection } else { None }
    }

    /// Abandon the gesture without producing a rectangle.
    pub fn cancel(&mut self) {
        self.origin = None;
        self.selection = None;
    }
}
