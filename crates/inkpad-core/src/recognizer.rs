//! Freehand-to-shape recognition and explicit shape building.
//!
//! [`recognize`] classifies a finished auto-shape stroke with an ordered list
//! of overlapping threshold rules; the first matching rule wins. Because the
//! rectangle rule's upper bound always lies below the circle rule's, any input
//! that reaches the circle rule matches it, so the triangle and oval rules
//! only act as fallbacks in principle. The rules are kept in this order on
//! purpose; reordering them changes classifications.
//!
//! [`build_shape`] derives the canonical primitive for an explicit shape tool
//! from the gesture's bounding box.

use crate::geometry::{is_finite_point, points_bounds};
use crate::objects::{ShapeGeometry, ShapeKind};
use crate::tools::ToolKind;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Strokes whose bounding box is narrower or shorter than this stay freehand.
pub const MIN_RECOGNIZABLE_SIZE: f64 = 10.0;

/// A classified primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecognizedShape {
    pub kind: ShapeKind,
    pub shape: ShapeGeometry,
}

fn finite_bounds(points: &[Point]) -> Option<Rect> {
    points_bounds(points.iter().copied().filter(|p| is_finite_point(*p)))
}

/// Classify a finished point sequence.
///
/// Returns `None` when the stroke is too small to classify; the caller then
/// commits it as a plain freehand stroke.
pub fn recognize(points: &[Point]) -> Option<RecognizedShape> {
    let bounds = finite_bounds(points)?;
    let (w, h) = (bounds.width(), bounds.height());
    if w < MIN_RECOGNIZABLE_SIZE || h < MIN_RECOGNIZABLE_SIZE {
        log::debug!("recognize: {w:.1}x{h:.1} too small, keeping freehand");
        return None;
    }

    let diff = (w - h).abs();
    let min_side = w.min(h);
    let center = bounds.center();

    let recognized = if diff < 15.0_f64.max(0.2 * min_side) {
        let side = w.max(h);
        RecognizedShape {
            kind: ShapeKind::Square,
            shape: ShapeGeometry::Rect { x: bounds.x0, y: bounds.y0, w: side, h: side },
        }
    } else if diff > 20.0_f64.max(0.3 * min_side) {
        RecognizedShape {
            kind: ShapeKind::Rectangle,
            shape: ShapeGeometry::Rect { x: bounds.x0, y: bounds.y0, w, h },
        }
    } else if diff < 30.0_f64.max(0.4 * min_side) {
        RecognizedShape {
            kind: ShapeKind::Circle,
            shape: ShapeGeometry::Circle { cx: center.x, cy: center.y, r: w.max(h) / 2.0 },
        }
    } else if points.len() >= 3 {
        let first = points[0];
        let middle = points[points.len() / 2];
        let last = points[points.len() - 1];
        RecognizedShape {
            kind: ShapeKind::Triangle,
            shape: ShapeGeometry::Triangle {
                x1: first.x,
                y1: first.y,
                x2: middle.x,
                y2: middle.y,
                x3: last.x,
                y3: last.y,
            },
        }
    } else {
        RecognizedShape {
            kind: ShapeKind::Oval,
            shape: ShapeGeometry::Oval { cx: center.x, cy: center.y, rx: w / 2.0, ry: h / 2.0 },
        }
    };

    log::debug!("recognize: {w:.1}x{h:.1} -> {:?}", recognized.kind);
    Some(recognized)
}

/// Canonical primitive for an explicit shape tool.
///
/// Returns `None` for tools that are not explicit shape tools or when there is
/// no usable point.
pub fn build_shape(tool: ToolKind, points: &[Point]) -> Option<RecognizedShape> {
    let bounds = finite_bounds(points)?;
    let (w, h) = (bounds.width(), bounds.height());
    let center = bounds.center();

    let (kind, shape) = match tool {
        ToolKind::Square => {
            let side = w.min(h);
            (ShapeKind::Square, ShapeGeometry::Rect { x: bounds.x0, y: bounds.y0, w: side, h: side })
        }
        ToolKind::Rectangle => (ShapeKind::Rectangle, ShapeGeometry::Rect { x: bounds.x0, y: bounds.y0, w, h }),
        ToolKind::Circle => (
            ShapeKind::Circle,
            ShapeGeometry::Circle { cx: center.x, cy: center.y, r: w.min(h) / 2.0 },
        ),
        ToolKind::Oval => (
            ShapeKind::Oval,
            ShapeGeometry::Oval { cx: center.x, cy: center.y, rx: w / 2.0, ry: h / 2.0 },
        ),
        ToolKind::Triangle => (
            ShapeKind::Triangle,
            ShapeGeometry::Triangle {
                x1: bounds.x0 + w / 2.0,
                y1: bounds.y0,
                x2: bounds.x0,
                y2: bounds.y1,
                x3: bounds.x1,
                y3: bounds.y1,
            },
        ),
        _ => return None,
    };

    Some(RecognizedShape { kind, shape })
}
