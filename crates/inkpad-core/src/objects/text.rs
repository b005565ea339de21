//! Text-like objects: text, sticky notes and comments.

use super::{Drawable, ObjectId};
use crate::geometry;
use crate::tools::ToolKind;
use kurbo::{BezPath, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Style fields of a text-like object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: TextAlign,
    pub color: String,
    pub font_size: f64,
    pub font_family: String,
    pub padding: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl TextStyle {
    /// Default font size.
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;
    pub const MIN_FONT_SIZE: f64 = 8.0;
    pub const MAX_FONT_SIZE: f64 = 200.0;
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            align: TextAlign::default(),
            color: "#000000".to_string(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: "sans-serif".to_string(),
            padding: 4.0,
            background_color: None,
        }
    }
}

/// A text-like object anchored at its bottom-left baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub(crate) id: ObjectId,
    /// One of `Text`, `Sticky` or `Comment`.
    pub tool: ToolKind,
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(flatten)]
    pub style: TextStyle,
    /// Declared box (stickies, comments). Without it the object has no
    /// bounding box for bbox-based erasers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_size: Option<Size>,
}

impl TextObject {
    /// Create a new text-like object at the given anchor.
    pub fn new(tool: ToolKind, anchor: Point, text: String, style: TextStyle) -> Self {
        Self {
            id: ObjectId::generate(),
            tool,
            x: anchor.x,
            y: anchor.y,
            text,
            style,
            box_size: None,
        }
    }

    /// Declare a fixed box.
    pub fn with_box(mut self, size: Size) -> Self {
        self.box_size = Some(size);
        self
    }

    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether the text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Approximate width based on character count and font size.
    fn approximate_width(&self) -> f64 {
        let max_line_len = self.text.lines().map(|line| line.chars().count()).max().unwrap_or(0);

        // Empirical average glyph width
        let char_width_factor = match (self.style.bold, self.style.italic) {
            (false, false) => 0.55,
            (false, true) => 0.53,
            (true, false) => 0.60,
            (true, true) => 0.58,
        };

        max_line_len as f64 * self.style.font_size * char_width_factor
    }

    /// Approximate height based on font size and number of lines.
    fn approximate_height(&self) -> f64 {
        let line_count = self.text.lines().count().max(1);
        let line_count = if self.text.ends_with('\n') {
            line_count + 1
        } else {
            line_count
        };
        line_count as f64 * self.style.font_size * 1.2
    }

    /// Visual extent used by the selection overlay and for tap hit-testing.
    ///
    /// The declared box wins when present; otherwise the extent is estimated
    /// from the text and padded.
    pub fn layout_rect(&self) -> Rect {
        if let Some(size) = self.box_size {
            return Rect::new(self.x, self.y - size.height, self.x + size.width, self.y);
        }
        let width = self.approximate_width().max(20.0);
        let height = self.approximate_height();
        let pad = self.style.padding;
        Rect::new(self.x - pad, self.y - height - pad, self.x + width + pad, self.y + pad)
    }
}

impl Drawable for TextObject {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn tool(&self) -> ToolKind {
        self.tool
    }

    fn color(&self) -> &str {
        &self.style.color
    }

    fn bounds(&self) -> Option<Rect> {
        self.box_size
            .map(|size| Rect::new(self.x, self.y - size.height, self.x + size.width, self.y))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        geometry::rect_contains(self.layout_rect().inflate(tolerance, tolerance), point)
    }

    fn to_path(&self) -> BezPath {
        // Text has no outline; its layout box stands in for it.
        let bounds = self.layout_rect();
        let mut path = BezPath::new();
        path.move_to(Point::new(bounds.x0, bounds.y0));
        path.line_to(Point::new(bounds.x1, bounds.y0));
        path.line_to(Point::new(bounds.x1, bounds.y1));
        path.line_to(Point::new(bounds.x0, bounds.y1));
        path.close_path();
        path
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}
