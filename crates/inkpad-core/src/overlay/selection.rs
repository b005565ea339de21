//! Selection box and its move/resize handles.

use crate::geometry::{distance_sq, rect_contains};
use crate::objects::{ObjectId, TextObject, TextStyle};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle hit tolerance.
pub const HANDLE_HIT_TOLERANCE: f64 = 12.0;

/// Font-size change per unit of vertical corner drag.
pub const RESIZE_FACTOR: f64 = 0.5;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Sign applied to a vertical drag. Dragging a bottom corner down grows
    /// the text, dragging a top corner up does.
    pub fn vertical_sign(self) -> f64 {
        match self {
            Corner::TopLeft | Corner::TopRight => -1.0,
            Corner::BottomLeft | Corner::BottomRight => 1.0,
        }
    }
}

/// Part of the selection box under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// The box itself: drag to move.
    Body,
    /// A corner: drag to resize.
    Corner(Corner),
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        distance_sq(point, self.position) <= tolerance * tolerance
    }
}

/// The selection box drawn around a selected text-like object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionBox {
    pub target: ObjectId,
    pub rect: Rect,
}

impl SelectionBox {
    pub fn around(object: &TextObject) -> Self {
        Self {
            target: object.id.clone(),
            rect: object.layout_rect(),
        }
    }

    /// Corner handles of the box.
    pub fn handles(&self) -> [Handle; 4] {
        let b = self.rect;
        [
            Handle::new(Point::new(b.x0, b.y0), HandleKind::Corner(Corner::TopLeft)),
            Handle::new(Point::new(b.x1, b.y0), HandleKind::Corner(Corner::TopRight)),
            Handle::new(Point::new(b.x0, b.y1), HandleKind::Corner(Corner::BottomLeft)),
            Handle::new(Point::new(b.x1, b.y1), HandleKind::Corner(Corner::BottomRight)),
        ]
    }

    /// Which part of the box is at `point`. Corners take priority over the body.
    pub fn hit_test(&self, point: Point) -> Option<HandleKind> {
        self.handles()
            .into_iter()
            .find(|h| h.hit_test(point, HANDLE_HIT_TOLERANCE))
            .map(|h| h.kind)
            .or_else(|| rect_contains(self.rect, point).then_some(HandleKind::Body))
    }
}

/// Signed font-size change for a corner drag of `delta`.
pub fn resize_delta(corner: Corner, delta: Vec2) -> f64 {
    delta.y * corner.vertical_sign() * RESIZE_FACTOR
}

/// Apply an incremental drag to a text object.
pub fn apply_manipulation(object: &mut TextObject, handle: HandleKind, delta: Vec2) {
    match handle {
        HandleKind::Body => {
            object.x += delta.x;
            object.y += delta.y;
        }
        HandleKind::Corner(corner) => {
            object.style.font_size = (object.style.font_size + resize_delta(corner, delta))
                .clamp(TextStyle::MIN_FONT_SIZE, TextStyle::MAX_FONT_SIZE);
        }
    }
}

/// An in-progress move or resize of the selected object.
///
/// Pointer deltas accumulate in `pending` and are applied to the store at
/// most once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ManipulationState {
    pub target: ObjectId,
    pub handle: HandleKind,
    pub pending: Vec2,
}

impl ManipulationState {
    pub fn new(target: ObjectId, handle: HandleKind) -> Self {
        Self {
            target,
            handle,
            pending: Vec2::ZERO,
        }
    }

    pub fn accumulate(&mut self, delta: Vec2) {
        self.pending += delta;
    }

    /// Take the accumulated delta, if any.
    pub fn take_pending(&mut self) -> Option<Vec2> {
        if self.pending == Vec2::ZERO {
            return None;
        }
        Some(std::mem::replace(&mut self.pending, Vec2::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolKind;
    use kurbo::Size;

    fn sticky() -> TextObject {
        TextObject::new(ToolKind::Sticky, Point::new(0.0, 100.0), "note".into(), TextStyle::default())
            .with_box(Size::new(100.0, 100.0))
    }

    #[test]
    fn test_hit_test_prefers_corners() {
        let selection = SelectionBox::around(&sticky());
        assert_eq!(selection.hit_test(Point::new(2.0, 2.0)), Some(HandleKind::Corner(Corner::TopLeft)));
        assert_eq!(selection.hit_test(Point::new(99.0, 98.0)), Some(HandleKind::Corner(Corner::BottomRight)));
        assert_eq!(selection.hit_test(Point::new(50.0, 50.0)), Some(HandleKind::Body));
        assert_eq!(selection.hit_test(Point::new(300.0, 50.0)), None);
    }

    #[test]
    fn test_top_corners_invert_vertical_sign() {
        let down = Vec2::new(0.0, 10.0);
        assert!((resize_delta(Corner::BottomRight, down) - 5.0).abs() < f64::EPSILON);
        assert!((resize_delta(Corner::TopLeft, down) + 5.0).abs() < f64::EPSILON);
        // Horizontal motion alone does nothing
        assert!(resize_delta(Corner::TopRight, Vec2::new(30.0, 0.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_clamps_font_size() {
        let mut object = sticky();
        apply_manipulation(&mut object, HandleKind::Corner(Corner::BottomLeft), Vec2::new(0.0, -1000.0));
        assert!((object.style.font_size - TextStyle::MIN_FONT_SIZE).abs() < f64::EPSILON);
        apply_manipulation(&mut object, HandleKind::Corner(Corner::TopLeft), Vec2::new(0.0, -1000.0));
        assert!((object.style.font_size - TextStyle::MAX_FONT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_move_is_incremental() {
        let mut object = sticky();
        apply_manipulation(&mut object, HandleKind::Body, Vec2::new(5.0, 0.0));
        apply_manipulation(&mut object, HandleKind::Body, Vec2::new(5.0, -2.0));
        assert!((object.x - 10.0).abs() < f64::EPSILON);
        assert!((object.y - 98.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pending_delta_is_taken_once() {
        let mut state = ManipulationState::new(ObjectId::from("t"), HandleKind::Body);
        state.accumulate(Vec2::new(1.0, 2.0));
        state.accumulate(Vec2::new(3.0, 4.0));
        assert_eq!(state.take_pending(), Some(Vec2::new(4.0, 6.0)));
        assert_eq!(state.take_pending(), None);
    }
}
