//! Inkpad Core Library
//!
//! Drawing-object engine of the note canvas: strokes, shapes and text objects,
//! the gesture pipeline that creates them, the erasers that remove them and
//! the text overlay that edits them.

pub mod eraser;
pub mod geometry;
pub mod gesture;
pub mod input;
pub mod objects;
pub mod overlay;
pub mod page;
pub mod recognizer;
pub mod render;
pub mod store;
pub mod tools;

pub use eraser::{EraseReport, EraserMode};
pub use gesture::{GesturePipeline, LiveGestureBuffer, PipelineEvent};
pub use input::{GestureEvent, GestureTracker, PointerEvent};
pub use objects::{DrawableObject, FreehandStroke, ObjectId, ShapeGeometry, ShapeKind, ShapeObject, TextObject, TextStyle};
pub use overlay::{TextDraft, TextOverlay};
pub use page::{Notebook, Page, PageDocument, PageId};
pub use recognizer::{RecognizedShape, build_shape, recognize};
pub use render::{DrawCommand, RenderFrame, Renderer};
pub use store::{ErasedEntry, RedoBuffer, StrokeStore};
pub use tools::{ConfigError, ToolDefaults, ToolKind, ToolManager, ToolSettings};
