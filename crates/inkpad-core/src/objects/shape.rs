//! Geometric primitives produced by the shape tools and the recognizer.

use super::{Drawable, ObjectId};
use crate::geometry::{self, path_from_points};
use crate::tools::ToolKind;
use kurbo::{BezPath, Circle, Ellipse, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// Classification of a shape object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Square,
    Rectangle,
    Circle,
    Triangle,
    Oval,
}

impl ShapeKind {
    /// Tool that draws this kind explicitly.
    pub fn tool(self) -> ToolKind {
        match self {
            ShapeKind::Square => ToolKind::Square,
            ShapeKind::Rectangle => ToolKind::Rectangle,
            ShapeKind::Circle => ToolKind::Circle,
            ShapeKind::Triangle => ToolKind::Triangle,
            ShapeKind::Oval => ToolKind::Oval,
        }
    }
}

/// Field sets of the supported primitives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeGeometry {
    Circle { cx: f64, cy: f64, r: f64 },
    Rect { x: f64, y: f64, w: f64, h: f64 },
    Oval { cx: f64, cy: f64, rx: f64, ry: f64 },
    Triangle { x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64 },
}

impl ShapeGeometry {
    /// Bounds derived from the shape fields.
    pub fn bounds(&self) -> Rect {
        match *self {
            ShapeGeometry::Circle { cx, cy, r } => Rect::new(cx - r, cy - r, cx + r, cy + r),
            ShapeGeometry::Rect { x, y, w, h } => Rect::new(x, y, x + w, y + h),
            ShapeGeometry::Oval { cx, cy, rx, ry } => Rect::new(cx - rx, cy - ry, cx + rx, cy + ry),
            ShapeGeometry::Triangle { x1, y1, x2, y2, x3, y3 } => Rect::new(
                x1.min(x2).min(x3),
                y1.min(y2).min(y3),
                x1.max(x2).max(x3),
                y1.max(y2).max(y3),
            ),
        }
    }

    /// Triangle corners in order, if this is a triangle.
    pub fn triangle_vertices(&self) -> Option<[Point; 3]> {
        match *self {
            ShapeGeometry::Triangle { x1, y1, x2, y2, x3, y3 } => {
                Some([Point::new(x1, y1), Point::new(x2, y2), Point::new(x3, y3)])
            }
            _ => None,
        }
    }

    pub fn to_path(&self) -> BezPath {
        match *self {
            ShapeGeometry::Circle { cx, cy, r } => Circle::new((cx, cy), r).to_path(0.1),
            ShapeGeometry::Rect { .. } => self.bounds().to_path(0.1),
            ShapeGeometry::Oval { cx, cy, rx, ry } => Ellipse::new((cx, cy), (rx, ry), 0.0).to_path(0.1),
            ShapeGeometry::Triangle { .. } => {
                let mut path = path_from_points(self.triangle_vertices().unwrap_or_default());
                path.close_path();
                path
            }
        }
    }

    fn translate(&mut self, d: Vec2) {
        match self {
            ShapeGeometry::Circle { cx, cy, .. } | ShapeGeometry::Oval { cx, cy, .. } => {
                *cx += d.x;
                *cy += d.y;
            }
            ShapeGeometry::Rect { x, y, .. } => {
                *x += d.x;
                *y += d.y;
            }
            ShapeGeometry::Triangle { x1, y1, x2, y2, x3, y3 } => {
                *x1 += d.x;
                *x2 += d.x;
                *x3 += d.x;
                *y1 += d.y;
                *y2 += d.y;
                *y3 += d.y;
            }
        }
    }
}

/// A committed geometric primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeObject {
    pub(crate) id: ObjectId,
    /// Tool that produced the shape (an explicit shape tool or auto-shape).
    pub tool: ToolKind,
    pub kind: ShapeKind,
    pub shape: ShapeGeometry,
    /// Outline width.
    pub width: f64,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

impl ShapeObject {
    pub fn new(tool: ToolKind, kind: ShapeKind, shape: ShapeGeometry, width: f64, color: impl Into<String>) -> Self {
        Self {
            id: ObjectId::generate(),
            tool,
            kind,
            shape,
            width,
            color: color.into(),
            fill: None,
        }
    }
}

impl Drawable for ShapeObject {
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
        Some(self.shape.bounds())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.width / 2.0;
        geometry::rect_contains(self.shape.bounds().inflate(reach, reach), point)
    }

    fn to_path(&self) -> BezPath {
        self.shape.to_path()
    }

    fn translate(&mut self, delta: Vec2) {
        self.shape.translate(delta);
    }
}
