//! Freehand strokes (pen, pencil, highlighter, brush, calligraphy, tape, eraser).

use super::{Drawable, ObjectId};
use crate::geometry::{self, path_from_points, points_bounds};
use crate::tools::{ToolDefaults, ToolKind};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A sampled point of a freehand stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    pub thickness: f64,
    pub stabilization: f64,
}

impl StrokePoint {
    /// Point at `position` carrying the tool's defaults.
    pub fn new(position: Point, defaults: ToolDefaults) -> Self {
        Self {
            x: position.x,
            y: position.y,
            pressure: defaults.pressure,
            thickness: defaults.thickness,
            stabilization: defaults.stabilization,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A freehand drawing (series of points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreehandStroke {
    pub(crate) id: ObjectId,
    pub tool: ToolKind,
    pub color: String,
    /// Points in drawing order.
    pub points: Vec<StrokePoint>,
    /// Nominal stroke width.
    pub width: f64,
    pub opacity: f64,
    /// Fill applied by the fill tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

impl FreehandStroke {
    /// Width used by hit tests when a stroke carries no usable width.
    pub const FALLBACK_WIDTH: f64 = 6.0;

    /// Create a new empty stroke.
    pub fn new(tool: ToolKind, color: impl Into<String>, width: f64) -> Self {
        Self {
            id: ObjectId::generate(),
            tool,
            color: color.into(),
            points: Vec::new(),
            width,
            opacity: 1.0,
            fill: None,
        }
    }

    /// Create from existing points.
    pub fn from_points(tool: ToolKind, color: impl Into<String>, width: f64, points: Vec<StrokePoint>) -> Self {
        Self {
            points,
            ..Self::new(tool, color, width)
        }
    }

    /// Copy of this stroke with another id and point list, all other fields kept.
    pub fn fragment(&self, id: ObjectId, points: Vec<StrokePoint>) -> Self {
        Self {
            id,
            points,
            ..self.clone()
        }
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Width for proximity tests; zero or missing widths use the fallback.
    pub fn effective_width(&self) -> f64 {
        if self.width.is_finite() && self.width > 0.0 {
            self.width
        } else {
            Self::FALLBACK_WIDTH
        }
    }

    /// Iterate the stroke's positions.
    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().map(StrokePoint::position)
    }
}

impl Drawable for FreehandStroke {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn tool(&self) -> ToolKind {
        self.tool
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn bounds(&self) -> Option<Rect> {
        points_bounds(self.positions())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.effective_width() / 2.0;
        let reach_sq = reach * reach;

        if self.points.len() < 2 {
            return self
                .points
                .first()
                .is_some_and(|p| geometry::distance_sq(point, p.position()) <= reach_sq);
        }

        self.points
            .windows(2)
            .any(|w| geometry::segment_distance_sq(point, w[0].position(), w[1].position()) <= reach_sq)
    }

    fn to_path(&self) -> BezPath {
        path_from_points(self.positions())
    }

    fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            point.x += delta.x;
            point.y += delta.y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> StrokePoint {
        StrokePoint::new(Point::new(x, y), ToolDefaults::default())
    }

    #[test]
    fn test_freehand_creation() {
        let stroke = FreehandStroke::new(ToolKind::Pen, "#000000", 4.0);
        assert!(stroke.is_empty());
        assert_eq!(stroke.tool, ToolKind::Pen);
    }

    #[test]
    fn test_bounds() {
        let stroke = FreehandStroke::from_points(
            ToolKind::Pen,
            "#000000",
            4.0,
            vec![pt(0.0, 0.0), pt(100.0, 50.0), pt(50.0, 100.0)],
        );

        let bounds = stroke.bounds().unwrap();
        assert!((bounds.x0).abs() < f64::EPSILON);
        assert!((bounds.y0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 100.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stroke_has_no_bounds() {
        let stroke = FreehandStroke::new(ToolKind::Pen, "#000000", 4.0);
        assert!(stroke.bounds().is_none());
        assert!(!stroke.hit_test(Point::ZERO, 10.0));
    }

    #[test]
    fn test_hit_test() {
        let stroke =
            FreehandStroke::from_points(ToolKind::Pen, "#000000", 2.0, vec![pt(0.0, 0.0), pt(100.0, 0.0)]);

        assert!(stroke.hit_test(Point::new(50.0, 0.0), 5.0));
        assert!(!stroke.hit_test(Point::new(50.0, 20.0), 5.0));
    }

    #[test]
    fn test_fragment_keeps_style() {
        let mut stroke =
            FreehandStroke::from_points(ToolKind::Brush, "#123456", 8.0, vec![pt(0.0, 0.0), pt(5.0, 5.0)]);
        stroke.opacity = 0.4;
        let frag = stroke.fragment(ObjectId::from("x_part0_1"), vec![pt(5.0, 5.0)]);
        assert_eq!(frag.id().as_str(), "x_part0_1");
        assert_eq!(frag.tool, ToolKind::Brush);
        assert_eq!(frag.color, "#123456");
        assert!((frag.width - 8.0).abs() < f64::EPSILON);
        assert!((frag.opacity - 0.4).abs() < f64::EPSILON);
        assert_eq!(frag.len(), 1);
    }

    #[test]
    fn test_effective_width_fallback() {
        let stroke = FreehandStroke::new(ToolKind::Pen, "#000000", 0.0);
        assert!((stroke.effective_width() - FreehandStroke::FALLBACK_WIDTH).abs() < f64::EPSILON);
    }
}
