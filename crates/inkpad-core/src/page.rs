//! Pages and the notebook that owns them.
//!
//! Each page owns its document (Stroke Store and Redo Buffer) and its gesture
//! pipeline. Pages never share mutable state; the notebook only shares the
//! tool selection and the read-only [`ToolSettings`].

use crate::eraser;
use crate::gesture::{GesturePipeline, PipelineEvent};
use crate::input::PointerEvent;
use crate::objects::{DrawableObject, ObjectId};
use crate::render::RenderFrame;
use crate::store::{RedoBuffer, StrokeStore};
use crate::tools::{ToolManager, ToolSettings};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The content of one page: its objects and erase history.
#[derive(Debug, Clone, Default)]
pub struct PageDocument {
    pub store: StrokeStore,
    pub redo: RedoBuffer,
}

impl PageDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Undo the most recent erase. Returns the restored object's id.
    pub fn restore_last_erased(&mut self) -> Option<ObjectId> {
        eraser::restore_last(&mut self.store, &mut self.redo)
    }

    /// Delete an object by id. Missing ids are a no-op.
    pub fn delete_object(&mut self, id: &ObjectId) -> bool {
        self.store.remove_by_id(id).is_some()
    }

    pub fn objects(&self) -> &[DrawableObject] {
        self.store.objects()
    }
}

/// A page: geometry, content and gesture state.
#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    bounds: Rect,
    pub document: PageDocument,
    pipeline: GesturePipeline,
}

impl Page {
    pub fn new(id: PageId, bounds: Rect) -> Self {
        Self {
            id,
            bounds,
            document: PageDocument::new(),
            pipeline: GesturePipeline::new(bounds),
        }
    }

    pub fn id(&self) -> &PageId {
        &self.id
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn pipeline(&self) -> &GesturePipeline {
        &self.pipeline
    }

    /// Feed a pointer event to this page.
    pub fn handle_pointer(&mut self, tools: &ToolManager, event: PointerEvent) {
        self.pipeline.handle_pointer(&mut self.document, tools, event);
    }

    /// Per-frame tick.
    pub fn on_frame(&mut self, tools: &ToolManager, now_ms: u64) {
        self.pipeline.on_frame(&mut self.document, tools, now_ms);
    }

    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        self.pipeline.drain_events()
    }

    /// Edit the open inline editor's draft.
    pub fn edit_text<F>(&mut self, now_ms: u64, f: F) -> bool
    where
        F: FnOnce(&mut crate::overlay::TextDraft),
    {
        self.pipeline.edit_text(now_ms, f)
    }

    pub fn submit_editor(&mut self) -> bool {
        self.pipeline.submit_editor(&mut self.document)
    }

    pub fn copy_selection(&mut self) -> Option<ObjectId> {
        self.pipeline.copy_selection(&mut self.document)
    }

    pub fn cut_selection(&mut self) -> Option<DrawableObject> {
        self.pipeline.cut_selection(&mut self.document)
    }

    pub fn delete_selection(&mut self) -> bool {
        self.pipeline.delete_selection(&mut self.document)
    }

    /// What the renderer reads this frame.
    pub fn render_frame<'a>(&'a self, tools: &'a ToolManager) -> RenderFrame<'a> {
        RenderFrame {
            strokes: self.document.store.snapshot(),
            live_points: self.pipeline.live_points(),
            active_tool: tools.current_tool,
            active_color: &tools.current_color,
            widths: &tools.settings().widths,
        }
    }
}

/// Ordered pages sharing one tool selection.
#[derive(Debug, Clone)]
pub struct Notebook {
    pages: Vec<Page>,
    pub tools: ToolManager,
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new(Arc::new(ToolSettings::default()))
    }
}

impl Notebook {
    pub fn new(settings: Arc<ToolSettings>) -> Self {
        Self {
            pages: Vec::new(),
            tools: ToolManager::new(settings),
        }
    }

    /// Append a page covering `bounds`.
    pub fn add_page(&mut self, bounds: Rect) -> PageId {
        let id = PageId::generate();
        self.insert_page(id.clone(), bounds);
        id
    }

    /// Append a page with a caller-chosen id. An existing page with the same
    /// id is replaced in place.
    pub fn insert_page(&mut self, id: PageId, bounds: Rect) {
        log::debug!("page {id} added");
        let page = Page::new(id.clone(), bounds);
        match self.pages.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = page,
            None => self.pages.push(page),
        }
    }

    /// Remove a page and everything it owns.
    pub fn remove_page(&mut self, id: &PageId) -> Option<Page> {
        let index = self.pages.iter().position(|p| &p.id == id)?;
        log::debug!("page {id} removed");
        Some(self.pages.remove(index))
    }

    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|p| &p.id == id)
    }

    pub fn page_mut(&mut self, id: &PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| &p.id == id)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Route a pointer event to a page. Returns `false` for unknown pages.
    pub fn handle_pointer(&mut self, page: &PageId, event: PointerEvent) -> bool {
        let Some(target) = self.pages.iter_mut().find(|p| &p.id == page) else {
            return false;
        };
        target.handle_pointer(&self.tools, event);
        true
    }

    /// Tick every page.
    pub fn on_frame(&mut self, now_ms: u64) {
        for page in &mut self.pages {
            page.on_frame(&self.tools, now_ms);
        }
    }
}
