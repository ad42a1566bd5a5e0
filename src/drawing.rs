//! Drawing service seam and a reference vertex plotter.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::debugger::{Debugger, Evaluation};
use crate::raster::Raster;
use crate::render::RenderRequest;
use crate::theme::{Rgba, Theme};
use crate::view::{Point, Size, ViewTransform};

/// Per-row drawing settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawSettings {
    pub color: Rgba,
    pub show_direction: bool,
    pub show_labels: bool,
}

/// A name the drawing service could not draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawFailure {
    pub name: String,
    pub reason: String,
}

/// Result of one drawing pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawOutcome {
    /// Number of request items that produced output
    pub drawn: usize,
    pub failures: Vec<DrawFailure>,
}

/// Paints the values named in a request into a raster.
///
/// Implementations must not fail the pass as a whole: a name that cannot be
/// drawn is reported in [`DrawOutcome::failures`] and the rest still drawn.
pub trait DrawingService<D: Debugger + ?Sized> {
    fn draw(
        &mut self,
        raster: &mut Raster,
        debugger: &D,
        request: &RenderRequest,
        theme: &Theme,
        view: &ViewTransform,
    ) -> DrawOutcome;
}

/// Fraction of the canvas left empty around the plotted extent.
const MARGIN: f64 = 0.05;

/// Plots every coordinate pair found in a value and joins consecutive
/// vertices of a path with lines.
///
/// Coordinates are `[x, y]` arrays or `{ "x": .., "y": .. }` objects, nested
/// at any depth; each array of coordinates is one path. All items share one
/// world-to-canvas mapping so they stay comparable. With `show_direction` the
/// first vertex of every path gets a larger marker. Labels are not rendered.
#[derive(Debug, Clone, Default)]
pub struct VertexPlotter;

impl VertexPlotter {
    pub fn new() -> Self {
        Self
    }
}

struct PlotItem {
    paths: Vec<Vec<Point>>,
    settings: DrawSettings,
}

impl<D> DrawingService<D> for VertexPlotter
where
    D: Debugger<Value = Value> + ?Sized,
{
    fn draw(
        &mut self,
        raster: &mut Raster,
        debugger: &D,
        request: &RenderRequest,
        _theme: &Theme,
        view: &ViewTransform,
    ) -> DrawOutcome {
        let mut outcome = DrawOutcome::default();
        let mut items = Vec::new();

        for item in request.items() {
            match debugger.evaluate(&item.name) {
                Evaluation::Valid { value, .. } => {
                    let paths = extract_paths(&value);
                    if paths.is_empty() {
                        outcome.failures.push(DrawFailure {
                            name: item.name.clone(),
                            reason: "value has no coordinates".to_string(),
                        });
                    } else {
                        items.push(PlotItem {
                            paths,
                            settings: item.settings,
                        });
                    }
                }
                Evaluation::Invalid { reason } => outcome.failures.push(DrawFailure {
                    name: item.name.clone(),
                    reason,
                }),
            }
        }

        let display = Size::new(f64::from(raster.width()), f64::from(raster.height()));
        let Some(mapping) = WorldMapping::fit(&items, display) else {
            return outcome;
        };

        for item in &items {
            for path in &item.paths {
                let pixels: Vec<Point> = path
                    .iter()
                    .map(|&p| view.normalized_to_display(mapping.to_canvas(p), display))
                    .collect();
                plot_path(raster, &pixels, &item.settings);
            }
            outcome.drawn += 1;
        }

        debug!(
            drawn = outcome.drawn,
            failed = outcome.failures.len(),
            "Plotted request"
        );
        outcome
    }
}

/// Collect coordinate paths from a value.
fn extract_paths(value: &Value) -> Vec<Vec<Point>> {
    let mut paths = Vec::new();
    collect_paths(value, &mut paths);
    paths
}

fn collect_paths(value: &Value, paths: &mut Vec<Vec<Point>>) {
    if let Some(p) = as_point(value) {
        paths.push(vec![p]);
        return;
    }
    match value {
        Value::Array(items) => {
            let points: Option<Vec<Point>> = items.iter().map(as_point).collect();
            match points {
                Some(points) if !points.is_empty() => paths.push(points),
                _ => items.iter().for_each(|v| collect_paths(v, paths)),
            }
        }
        Value::Object(map) => map.values().for_each(|v| collect_paths(v, paths)),
        _ => {}
    }
}

fn as_point(value: &Value) -> Option<Point> {
    match value {
        Value::Array(items) if items.len() == 2 => {
            Some(Point::new(items[0].as_f64()?, items[1].as_f64()?))
        }
        Value::Object(map) => Some(Point::new(map.get("x")?.as_f64()?, map.get("y")?.as_f64()?)),
        _ => None,
    }
}

/// Maps world coordinates (y up) onto the normalized canvas (y down),
/// preserving the display aspect ratio.
#[derive(Debug, Clone, Copy)]
struct WorldMapping {
    center: Point,
    span_x: f64,
    span_y: f64,
}

impl WorldMapping {
    fn fit(items: &[PlotItem], display: Size) -> Option<Self> {
        if display.is_empty() {
            return None;
        }
        let mut points = items.iter().flat_map(|i| i.paths.iter().flatten());
        let first = points.next()?;
        let (mut min, mut max) = (*first, *first);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }

        let mut span_x = (max.x - min.x).max(f64::EPSILON);
        let mut span_y = (max.y - min.y).max(f64::EPSILON);
        if max.x - min.x <= f64::EPSILON && max.y - min.y <= f64::EPSILON {
            span_x = 1.0;
            span_y = 1.0;
        }
        span_x *= 1.0 + 2.0 * MARGIN;
        span_y *= 1.0 + 2.0 * MARGIN;

        let aspect = display.width / display.height;
        if span_x / span_y < aspect {
            span_x = span_y * aspect;
        } else {
            span_y = span_x / aspect;
        }

        Some(Self {
            center: Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0),
            span_x,
            span_y,
        })
    }

    fn to_canvas(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.center.x) / self.span_x + 0.5,
            0.5 - (p.y - self.center.y) / self.span_y,
        )
    }
}

fn plot_path(raster: &mut Raster, pixels: &[Point], settings: &DrawSettings) {
    for pair in pixels.windows(2) {
        draw_line(raster, pair[0], pair[1], settings.color);
    }
    for (i, &p) in pixels.iter().enumerate() {
        let radius = if settings.show_direction && i == 0 { 2 } else { 1 };
        plot_marker(raster, p, radius, settings.color);
    }
}

fn plot_marker(raster: &mut Raster, p: Point, radius: i64, color: Rgba) {
    let reach = radius as f64 + 1.0;
    let (w, h) = (f64::from(raster.width()), f64::from(raster.height()));
    // Far-off vertices of a deep zoom would overflow the integer cast
    if !(p.x > -reach && p.x < w + reach && p.y > -reach && p.y < h + reach) {
        return;
    }
    let (cx, cy) = (p.x.floor() as i64, p.y.floor() as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            raster.plot(cx + dx, cy + dy, color);
        }
    }
}

/// DDA line, clipped to the raster first so deep zooms stay cheap.
fn draw_line(raster: &mut Raster, a: Point, b: Point, color: Rgba) {
    let bounds = (
        -1.0,
        -1.0,
        f64::from(raster.width()) + 1.0,
        f64::from(raster.height()) + 1.0,
    );
    let Some((a, b)) = clip_segment(a, b, bounds) else {
        return;
    };
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
    let n = steps as i64;
    for i in 0..=n {
        let t = i as f64 / steps;
        raster.plot(
            (a.x + dx * t).floor() as i64,
            (a.y + dy * t).floor() as i64,
            color,
        );
    }
}

/// Liang-Barsky clipping against `(min_x, min_y, max_x, max_y)`.
fn clip_segment(a: Point, b: Point, bounds: (f64, f64, f64, f64)) -> Option<(Point, Point)> {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return None;
    }
    let (min_x, min_y, max_x, max_y) = bounds;
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-dx, a.x - min_x),
        (dx, max_x - a.x),
        (-dy, a.y - min_y),
        (dy, max_y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    (t0 <= t1).then(|| {
        (
            Point::new(a.x + t0 * dx, a.y + t0 * dy),
            Point::new(a.x + t1 * dx, a.y + t1 * dy),
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::debugger::SessionDebugger;
    use crate::render::RenderItem;

    fn red() -> Rgba {
        Rgba::new(255, 0, 0, 255)
    }

    fn settings(color: Rgba) -> DrawSettings {
        DrawSettings {
            color,
            show_direction: false,
            show_labels: false,
        }
    }

    #[test]
    fn far_off_markers_are_skipped() {
        let mut raster = Raster::filled(8, 8, Rgba::new(0, 0, 0, 255));
        plot_marker(&mut raster, Point::new(6.7e25, 3.0), 1, red());
        plot_marker(&mut raster, Point::new(3.0, -1e30), 2, red());
        plot_marker(&mut raster, Point::new(f64::NAN, 3.0), 1, red());
        assert!(raster.pixels().iter().all(|&p| p != red()));

        // Partly outside still paints the visible part
        plot_marker(&mut raster, Point::new(-0.5, 0.0), 1, red());
        assert_eq!(raster.pixel(0, 0), Some(red()));
    }

    #[test]
    fn extracts_nested_paths() {
        let value = json!({
            "outer": [[0, 0], [4, 0], [4, 3]],
            "inners": [[[1, 1], [2, 1], [2, 2]]],
            "name": "poly"
        });
        let mut paths = extract_paths(&value);
        paths.sort_by_key(|p| p.len());
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.len() == 3));
        assert_eq!(extract_paths(&json!({"x": 1.5, "y": -2})).len(), 1);
        assert!(extract_paths(&json!("text")).is_empty());
    }

    #[test]
    fn clipping_rejects_outside_segments() {
        let bounds = (0.0, 0.0, 10.0, 10.0);
        assert!(clip_segment(Point::new(-5.0, -5.0), Point::new(-1.0, 20.0), bounds).is_none());
        let (a, b) = clip_segment(Point::new(-10.0, 5.0), Point::new(20.0, 5.0), bounds)
            .expect("crosses the box");
        assert_eq!(a, Point::new(0.0, 5.0));
        assert_eq!(b, Point::new(10.0, 5.0));
    }

    #[test]
    fn plots_valid_values_and_reports_failures() {
        let mut dbg = SessionDebugger::default();
        dbg.insert("seg", "segment", json!([[0.0, 0.0], [10.0, 5.0]]));
        dbg.insert("label", "string", json!("hello"));
        let request = RenderRequest::new(vec![
            RenderItem::new("seg", settings(red())),
            RenderItem::new("label", settings(red())),
            RenderItem::new("missing", settings(red())),
        ]);

        let theme = Theme::default();
        let mut raster = Raster::filled(40, 20, theme.background);
        let outcome = VertexPlotter::new().draw(
            &mut raster,
            &dbg,
            &request,
            &theme,
            &ViewTransform::new(),
        );

        assert_eq!(outcome.drawn, 1);
        let failed: Vec<_> = outcome.failures.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, ["label", "missing"]);
        assert!(raster.pixels().contains(&red()));
    }

    #[test]
    fn zoomed_out_region_leaves_raster_untouched() {
        let mut dbg = SessionDebugger::default();
        dbg.insert("pt", "point", json!([1.0, 1.0]));
        let request = RenderRequest::new(vec![RenderItem::new("pt", settings(red()))]);

        let theme = Theme::default();
        let mut view = ViewTransform::new();
        // Top-left corner, away from the centered single point
        view.zoom(
            crate::view::Rect::new(0.0, 0.0, 10.0, 5.0),
            Size::new(40.0, 20.0),
        );
        let mut raster = Raster::filled(40, 20, theme.background);
        let outcome = VertexPlotter::new().draw(&mut raster, &dbg, &request, &theme, &view);

        assert_eq!(outcome.drawn, 1);
        assert!(!raster.pixels().contains(&red()));
    }
}
