//! Drawable objects stored on a page.

mod freehand;
mod shape;
mod text;

pub use freehand::{FreehandStroke, StrokePoint};
pub use shape::{ShapeGeometry, ShapeKind, ShapeObject};
pub use text::{TextAlign, TextObject, TextStyle};

use crate::tools::ToolKind;
use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        if !digits.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut it = digits.chars().map(|c| c.to_digit(16).map(|v| (v * 17) as u8));
                Some(Self::new(it.next()??, it.next()??, it.next()??, 255))
            }
            6 => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
                channel(&digits[6..8])?,
            )),
            _ => None,
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Identifier of a drawable object.
///
/// Fresh ids are UUID v7 strings, so sorting ids sorts by creation time.
/// Fragments produced by pixel erasing derive their id from the original.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a new unique id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Id of the `n`-th surviving fragment of this object.
    pub fn fragment(&self, n: usize, timestamp_ms: u64) -> Self {
        Self(format!("{}_part{}_{}", self.0, n, timestamp_ms))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Common behaviour of every object variant.
pub trait Drawable {
    /// Get the unique identifier.
    fn id(&self) -> &ObjectId;

    /// Tool that produced this object.
    fn tool(&self) -> ToolKind;

    /// Primary color as a CSS-style string.
    fn color(&self) -> &str;

    /// Bounding box used by bbox-based erasers and the fill tool.
    ///
    /// `None` for objects without declared geometry.
    fn bounds(&self) -> Option<Rect>;

    /// Check if a point hits this object.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Outline path for rendering.
    fn to_path(&self) -> BezPath;

    /// Move the object by `delta`.
    fn translate(&mut self, delta: Vec2);
}

/// A single stroke, shape or text-like entity on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum DrawableObject {
    Freehand(FreehandStroke),
    Shape(ShapeObject),
    Text(TextObject),
}

impl DrawableObject {
    fn inner(&self) -> &dyn Drawable {
        match self {
            DrawableObject::Freehand(s) => s,
            DrawableObject::Shape(s) => s,
            DrawableObject::Text(s) => s,
        }
    }

    pub fn id(&self) -> &ObjectId {
        self.inner().id()
    }

    pub fn tool(&self) -> ToolKind {
        self.inner().tool()
    }

    pub fn color(&self) -> &str {
        self.inner().color()
    }

    /// Bounding box as `{min_x, min_y, max_x, max_y}`.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.inner().bounds()
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.inner().hit_test(point, tolerance)
    }

    pub fn to_path(&self) -> BezPath {
        self.inner().to_path()
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            DrawableObject::Freehand(s) => s.translate(delta),
            DrawableObject::Shape(s) => s.translate(delta),
            DrawableObject::Text(s) => s.translate(delta),
        }
    }

    /// Text, sticky and comment objects.
    pub fn is_text_like(&self) -> bool {
        matches!(self, DrawableObject::Text(_))
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match self {
            DrawableObject::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextObject> {
        match self {
            DrawableObject::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_freehand(&self) -> Option<&FreehandStroke> {
        match self {
            DrawableObject::Freehand(s) => Some(s),
            _ => None,
        }
    }

    /// Replace the id, e.g. when duplicating.
    pub fn set_id(&mut self, id: ObjectId) {
        match self {
            DrawableObject::Freehand(s) => s.id = id,
            DrawableObject::Shape(s) => s.id = id,
            DrawableObject::Text(s) => s.id = id,
        }
    }

    /// Apply the fill tool's color.
    pub fn set_fill(&mut self, color: &str) {
        match self {
            DrawableObject::Freehand(s) => s.fill = Some(color.to_string()),
            DrawableObject::Shape(s) => s.fill = Some(color.to_string()),
            DrawableObject::Text(s) => s.style.background_color = Some(color.to_string()),
        }
    }
}

impl From<FreehandStroke> for DrawableObject {
    fn from(s: FreehandStroke) -> Self {
        DrawableObject::Freehand(s)
    }
}

impl From<ShapeObject> for DrawableObject {
    fn from(s: ShapeObject) -> Self {
        DrawableObject::Shape(s)
    }
}

impl From<TextObject> for DrawableObject {
    fn from(s: TextObject) -> Self {
        DrawableObject::Text(s)
    }
}
