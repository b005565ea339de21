//! Geometry helpers shared by the erasers, the recognizer and the renderer.
//!
//! Hit tests in hot per-frame loops compare squared distances; only
//! [`distance`] takes a square root.

use crate::objects::SerializableColor;
use kurbo::{BezPath, Point, Rect};

/// Build a polyline path: `move_to` the first point, `line_to` the rest.
///
/// An empty input yields an empty path.
pub fn path_from_points<I>(points: I) -> BezPath
where
    I: IntoIterator<Item = Point>,
{
    let mut path = BezPath::new();
    let mut points = points.into_iter();
    if let Some(first) = points.next() {
        path.move_to(first);
        for point in points {
            path.line_to(point);
        }
    }
    path
}

/// Axis-aligned bounds of a point sequence, `None` when empty.
pub fn points_bounds<I>(points: I) -> Option<Rect>
where
    I: IntoIterator<Item = Point>,
{
    let mut points = points.into_iter();
    let first = points.next()?;
    let mut rect = Rect::from_points(first, first);
    for point in points {
        rect.x0 = rect.x0.min(point.x);
        rect.y0 = rect.y0.min(point.y);
        rect.x1 = rect.x1.max(point.x);
        rect.y1 = rect.y1.max(point.y);
    }
    Some(rect)
}

/// Inclusive containment test (kurbo's `Rect::contains` excludes the far edges).
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Ray-casting point-in-polygon test.
///
/// The polygon is an ordered point sequence and does not need to repeat its
/// first point at the end. Fewer than three points never contain anything.
pub fn point_in_polygon(polygon: &[Point], x: f64, y: f64) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > y) != (pj.y > y) && x < (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Squared Euclidean distance.
#[inline]
pub fn distance_sq(p1: Point, p2: Point) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    dx * dx + dy * dy
}

/// Euclidean distance.
#[inline]
pub fn distance(p1: Point, p2: Point) -> f64 {
    distance_sq(p1, p2).sqrt()
}

/// Squared distance from a point to the segment `a -> b`.
pub fn segment_distance_sq(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return distance_sq(point, a);
    }
    let t = ((point - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    distance_sq(point, a + seg * t)
}

/// Whether both coordinates are finite numbers.
#[inline]
pub fn is_finite_point(point: Point) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// Convert a hex color to an `rgba(...)` string at the given alpha.
///
/// Malformed input is returned unchanged.
pub fn alpha_blend(color_hex: &str, alpha: f64) -> String {
    match SerializableColor::from_hex(color_hex) {
        Some(c) => {
            let alpha = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 1.0 };
            format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, alpha)
        }
        None => {
            log::warn!("alpha_blend: unparsable color {color_hex:?}, using it as-is");
            color_hex.to_string()
        }
    }
}
