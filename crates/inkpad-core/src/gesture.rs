//! Gesture pipeline: routes recognized gestures to the active tool and turns
//! finished gestures into store mutations.
//!
//! Store-visible work driven by pointer motion (live point publication, stroke
//! erasing, text drags) is coalesced and performed in [`GesturePipeline::on_frame`],
//! at most once per tick. Pointer events only update local accumulators.

use crate::eraser::{self, EraseReport, EraserMode};
use crate::geometry::{distance_sq, rect_contains};
use crate::input::{GestureEvent, GestureTracker, PointerEvent};
use crate::objects::{DrawableObject, FreehandStroke, ObjectId, ShapeObject, StrokePoint, TextObject, TextStyle};
use crate::overlay::{self, HandleKind, TextDraft, TextOverlay};
use crate::page::PageDocument;
use crate::recognizer::{self, RecognizedShape};
use crate::tools::{ToolKind, ToolManager};
use kurbo::{Point, Rect, Size, Vec2};
use serde::Serialize;

/// Squared distance a pointer must travel before another live point is kept.
pub const MIN_POINT_DISTANCE_SQ: f64 = 9.0;

/// Declared box of a new sticky note.
pub const STICKY_SIZE: Size = Size::new(160.0, 160.0);

/// Declared box of a new comment.
pub const COMMENT_SIZE: Size = Size::new(200.0, 80.0);

const STICKY_BACKGROUND: &str = "#fff59d";

/// Transient point accumulator of the gesture in progress.
#[derive(Debug, Clone, Default)]
pub struct LiveGestureBuffer {
    points: Vec<Point>,
    dirty: bool,
}

impl LiveGestureBuffer {
    /// Start a new gesture at `point`, dropping anything left over.
    pub fn begin(&mut self, point: Point) {
        self.points.clear();
        self.points.push(point);
        self.dirty = true;
    }

    /// Append `point` if it moved far enough from the last kept point.
    pub fn push(&mut self, point: Point) -> bool {
        let far_enough = self
            .points
            .last()
            .is_none_or(|last| distance_sq(*last, point) > MIN_POINT_DISTANCE_SQ);
        if far_enough {
            self.points.push(point);
            self.dirty = true;
        }
        far_enough
    }

    /// Append the release point unless it duplicates the last one.
    pub fn push_final(&mut self, point: Point) {
        if self.points.last() != Some(&point) {
            self.points.push(point);
            self.dirty = true;
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Copy of the points if they changed since the last frame.
    pub fn take_frame(&mut self) -> Option<Vec<Point>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.points.clone())
    }

    /// Hand over the accumulated points, leaving the buffer empty.
    pub fn finish(&mut self) -> Vec<Point> {
        self.dirty = false;
        std::mem::take(&mut self.points)
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.dirty = false;
    }
}

/// Something the caller may want to react to. Drained with
/// [`GesturePipeline::drain_events`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    SelectionChanged { selected: Option<ObjectId> },
    EditorOpened { target: ObjectId, draft: TextDraft },
    /// Debounced in-progress edit.
    LivePreview { target: ObjectId, draft: TextDraft },
    EditorClosed { target: ObjectId, draft: TextDraft, committed: bool },
    Committed { id: ObjectId },
    Erased { removed: Vec<ObjectId>, fragments: Vec<ObjectId> },
    Pruned { removed: Vec<ObjectId> },
    Filled { id: ObjectId, color: String },
}

/// What the current pan is doing, fixed when it starts.
#[derive(Debug, Clone)]
enum ActivePan {
    Draw { tool: ToolKind },
    Erase { mode: EraserMode, size: f64, path: Vec<Point>, unprocessed: bool },
    Fill { color: String, last: Point },
    /// Moving or resizing the selected text object.
    Manipulate,
    /// Dragging a text object that is not in the store yet.
    PendingText,
}

/// Per-page gesture state machine.
#[derive(Debug, Clone)]
pub struct GesturePipeline {
    tracker: GestureTracker,
    live: LiveGestureBuffer,
    published: Vec<Point>,
    pan: Option<ActivePan>,
    overlay: TextOverlay,
    pending_text: Option<TextObject>,
    events: Vec<PipelineEvent>,
    scratch: Vec<GestureEvent>,
}

impl GesturePipeline {
    /// Create a pipeline for a page covering `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            tracker: GestureTracker::new(Some(bounds)),
            live: LiveGestureBuffer::default(),
            published: Vec::new(),
            pan: None,
            overlay: TextOverlay::new(),
            pending_text: None,
            events: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Live points as of the last frame.
    pub fn live_points(&self) -> &[Point] {
        &self.published
    }

    pub fn overlay(&self) -> &TextOverlay {
        &self.overlay
    }

    /// Text object being created but not committed yet.
    pub fn pending_text(&self) -> Option<&TextObject> {
        self.pending_text.as_ref()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Feed one pointer event.
    pub fn handle_pointer(&mut self, doc: &mut PageDocument, tools: &ToolManager, event: PointerEvent) {
        let mut gestures = std::mem::take(&mut self.scratch);
        self.tracker.handle_pointer_event(event, &mut gestures);
        for gesture in gestures.drain(..) {
            self.dispatch(doc, tools, gesture);
        }
        self.scratch = gestures;
    }

    /// Per-frame tick.
    pub fn on_frame(&mut self, doc: &mut PageDocument, tools: &ToolManager, now_ms: u64) {
        if let Some(frame) = self.live.take_frame() {
            log::trace!("frame {now_ms}: publishing {} live point(s)", frame.len());
            self.published = frame;
        }

        if let Some(ActivePan::Erase { mode: EraserMode::Stroke, path, unprocessed, .. }) = &mut self.pan {
            if *unprocessed {
                let removed = eraser::stroke_erase(&mut doc.store, &mut doc.redo, path);
                // Keep evaluating on later ticks while strokes keep falling
                *unprocessed = removed.is_some();
                if let Some(id) = removed {
                    self.emit_erased(doc, EraseReport { removed: vec![id], fragments: Vec::new() });
                }
            }
        }

        self.overlay.flush(&mut doc.store);

        let mut gestures = std::mem::take(&mut self.scratch);
        self.tracker.poll(now_ms, &mut gestures);
        for gesture in gestures.drain(..) {
            self.dispatch(doc, tools, gesture);
        }
        self.scratch = gestures;

        self.poll_editor(now_ms);
    }

    fn dispatch(&mut self, doc: &mut PageDocument, tools: &ToolManager, gesture: GestureEvent) {
        match gesture {
            GestureEvent::Tap { position, time_ms } => self.on_tap(doc, tools, position, time_ms),
            GestureEvent::DoubleTap { position, time_ms } => self.on_double_tap(doc, tools, position, time_ms),
            GestureEvent::PanStart { position, .. } => self.on_pan_start(doc, tools, position),
            GestureEvent::PanUpdate { position, delta, .. } => self.on_pan_update(position, delta),
            GestureEvent::PanEnd { position, time_ms } => self.on_pan_end(doc, tools, position, time_ms),
            GestureEvent::PanCancel { .. } => self.on_pan_cancel(doc),
        }
    }

    fn on_tap(&mut self, doc: &mut PageDocument, tools: &ToolManager, position: Point, time_ms: u64) {
        log::debug!("tap at ({:.1}, {:.1}) with {:?}", position.x, position.y, tools.current_tool);
        if self.overlay.is_editing() {
            self.submit_editor(doc);
            return;
        }

        match tools.current_tool {
            ToolKind::Eraser => {
                let report = match tools.eraser_mode {
                    EraserMode::Pixel => {
                        eraser::pixel_erase(&mut doc.store, &mut doc.redo, &[position], tools.eraser_size, time_ms)
                    }
                    EraserMode::Stroke => EraseReport {
                        removed: eraser::stroke_erase(&mut doc.store, &mut doc.redo, &[position])
                            .into_iter()
                            .collect(),
                        fragments: Vec::new(),
                    },
                    EraserMode::Object => EraseReport {
                        removed: eraser::object_erase_tap(&mut doc.store, &mut doc.redo, position)
                            .into_iter()
                            .collect(),
                        fragments: Vec::new(),
                    },
                };
                self.emit_erased(doc, report);
            }
            ToolKind::Fill => self.fill_at(doc, position, &tools.current_color),
            tool => match hit_text(doc, position) {
                Some(id) if self.overlay.selected() == Some(&id) => self.open_editor(doc, &id),
                Some(id) => {
                    if self.overlay.select(&doc.store, &id) {
                        self.events.push(PipelineEvent::SelectionChanged { selected: Some(id) });
                    }
                }
                None => {
                    self.clear_selection();
                    if tool.is_text_like() {
                        self.pending_text = Some(new_text_object(tool, position, &tools.current_color));
                        self.open_pending_editor();
                    }
                }
            },
        }
    }

    fn on_double_tap(&mut self, doc: &mut PageDocument, tools: &ToolManager, position: Point, time_ms: u64) {
        if self.overlay.is_editing() {
            self.submit_editor(doc);
            return;
        }
        let erasing_or_filling = matches!(tools.current_tool, ToolKind::Eraser | ToolKind::Fill);
        match hit_text(doc, position) {
            Some(id) if !erasing_or_filling => {
                log::debug!("double tap opens editor on {id}");
                self.open_editor(doc, &id);
            }
            _ => self.on_tap(doc, tools, position, time_ms),
        }
    }

    fn on_pan_start(&mut self, doc: &mut PageDocument, tools: &ToolManager, position: Point) {
        if self.pan.is_some() {
            log::debug!("pan start while a pan is active, cancelling the old one");
            self.on_pan_cancel(doc);
        }
        if self.overlay.is_editing() {
            self.submit_editor(doc);
        }

        let tool = tools.current_tool;
        // Erasers and fill act on whatever is under the pointer, selected or not
        let handle = match tool {
            ToolKind::Eraser | ToolKind::Fill => None,
            _ => self.overlay.hit_selection(position),
        };
        if let Some(handle) = handle {
            self.overlay.begin_manipulation(handle);
            self.pan = Some(ActivePan::Manipulate);
            return;
        }

        log::debug!("pan start with {tool:?}");
        let pan = match tool {
            t if t.is_text_like() => match hit_text(doc, position) {
                Some(id) => {
                    if self.overlay.select(&doc.store, &id) {
                        self.events.push(PipelineEvent::SelectionChanged { selected: Some(id) });
                    }
                    self.overlay.begin_manipulation(HandleKind::Body);
                    ActivePan::Manipulate
                }
                None => {
                    self.clear_selection();
                    self.pending_text = Some(new_text_object(t, position, &tools.current_color));
                    ActivePan::PendingText
                }
            },
            ToolKind::Eraser => {
                self.clear_selection();
                ActivePan::Erase {
                    mode: tools.eraser_mode,
                    size: tools.eraser_size,
                    path: vec![position],
                    unprocessed: true,
                }
            }
            ToolKind::Fill => {
                self.clear_selection();
                ActivePan::Fill { color: tools.current_color.clone(), last: position }
            }
            _ => {
                self.clear_selection();
                self.live.begin(position);
                ActivePan::Draw { tool }
            }
        };
        self.pan = Some(pan);
    }

    fn on_pan_update(&mut self, position: Point, delta: Vec2) {
        match &mut self.pan {
            Some(ActivePan::Draw { .. }) => {
                self.live.push(position);
            }
            Some(ActivePan::Erase { path, unprocessed, .. }) => {
                path.push(position);
                *unprocessed = true;
            }
            Some(ActivePan::Fill { last, .. }) => *last = position,
            Some(ActivePan::Manipulate) => self.overlay.drag(delta),
            Some(ActivePan::PendingText) => {
                if let Some(text) = &mut self.pending_text {
                    text.x += delta.x;
                    text.y += delta.y;
                }
            }
            None => {}
        }
    }

    fn on_pan_end(&mut self, doc: &mut PageDocument, tools: &ToolManager, position: Point, time_ms: u64) {
        let Some(pan) = self.pan.take() else {
            return;
        };
        match pan {
            ActivePan::Draw { tool } => {
                self.live.push_final(position);
                let points = self.live.finish();
                self.published.clear();
                self.commit_drawing(doc, tools, tool, &points);
            }
            ActivePan::Erase { mode, size, path, unprocessed } => {
                let report = match mode {
                    EraserMode::Pixel => eraser::pixel_erase(&mut doc.store, &mut doc.redo, &path, size, time_ms),
                    EraserMode::Stroke if unprocessed => EraseReport {
                        removed: eraser::stroke_erase(&mut doc.store, &mut doc.redo, &path).into_iter().collect(),
                        fragments: Vec::new(),
                    },
                    EraserMode::Stroke => EraseReport::default(),
                    EraserMode::Object => eraser::object_erase_lasso(&mut doc.store, &mut doc.redo, &path),
                };
                self.emit_erased(doc, report);
            }
            ActivePan::Fill { color, last } => self.fill_at(doc, last, &color),
            ActivePan::Manipulate => {
                self.overlay.end_manipulation(&mut doc.store);
            }
            ActivePan::PendingText => self.open_pending_editor(),
        }
    }

    /// Interrupted pan: drag deltas are flushed once, nothing new is committed.
    fn on_pan_cancel(&mut self, doc: &mut PageDocument) {
        let Some(pan) = self.pan.take() else {
            return;
        };
        log::debug!("pan cancelled");
        match pan {
            ActivePan::Draw { .. } => {
                self.live.clear();
                self.published.clear();
            }
            ActivePan::Manipulate => {
                self.overlay.end_manipulation(&mut doc.store);
            }
            ActivePan::PendingText => self.pending_text = None,
            ActivePan::Erase { .. } | ActivePan::Fill { .. } => {}
        }
    }

    fn commit_drawing(&mut self, doc: &mut PageDocument, tools: &ToolManager, tool: ToolKind, points: &[Point]) {
        if points.is_empty() {
            return;
        }
        let settings = tools.settings();
        let width = settings.width_for(tool);
        let color = tools.current_color.as_str();

        let shape = match tool {
            ToolKind::Shape => recognizer::recognize(points),
            t if t.is_explicit_shape() => recognizer::build_shape(t, points),
            _ => None,
        };

        let object: DrawableObject = match shape {
            Some(RecognizedShape { kind, shape }) => ShapeObject::new(kind.tool(), kind, shape, width, color).into(),
            None => {
                let defaults = settings.defaults_for(tool);
                let stroke_points = points.iter().map(|p| StrokePoint::new(*p, defaults)).collect();
                FreehandStroke::from_points(tool, color, width, stroke_points).into()
            }
        };

        let id = object.id().clone();
        log::debug!("commit {id} ({tool:?}, {} point(s))", points.len());
        doc.store.append(object);
        doc.redo.clear();
        self.events.push(PipelineEvent::Committed { id });
    }

    /// Fill the first object, in forward order, whose bounding box contains `position`.
    fn fill_at(&mut self, doc: &mut PageDocument, position: Point, color: &str) {
        let Some(id) = doc
            .store
            .objects()
            .iter()
            .find(|o| o.bounding_box().is_some_and(|b| rect_contains(b, position)))
            .map(|o| o.id().clone())
        else {
            return;
        };
        if doc.store.update_by_id(&id, |o| o.set_fill(color)) {
            log::debug!("filled {id} with {color}");
            self.events.push(PipelineEvent::Filled { id, color: color.to_string() });
        }
    }

    fn emit_erased(&mut self, doc: &PageDocument, report: EraseReport) {
        if report.is_empty() {
            return;
        }
        self.overlay.refresh(&doc.store);
        self.events.push(PipelineEvent::Erased {
            removed: report.removed,
            fragments: report.fragments,
        });
    }

    fn clear_selection(&mut self) {
        if self.overlay.clear_selection() {
            self.events.push(PipelineEvent::SelectionChanged { selected: None });
        }
    }

    fn open_editor(&mut self, doc: &PageDocument, id: &ObjectId) {
        let Some(text) = doc.store.find_by_id(id).and_then(DrawableObject::as_text) else {
            return;
        };
        let had_selection = self.overlay.selected().is_some();
        let draft = self.overlay.open_editor(text).draft().clone();
        if had_selection {
            self.events.push(PipelineEvent::SelectionChanged { selected: None });
        }
        self.events.push(PipelineEvent::EditorOpened { target: id.clone(), draft });
    }

    fn open_pending_editor(&mut self) {
        let Some(text) = &self.pending_text else {
            return;
        };
        let editor = self.overlay.open_editor(text);
        let event = PipelineEvent::EditorOpened {
            target: editor.target().clone(),
            draft: editor.draft().clone(),
        };
        self.events.push(event);
    }

    fn poll_editor(&mut self, now_ms: u64) {
        let Some(editor) = self.overlay.editor_mut() else {
            return;
        };
        let Some(draft) = editor.poll(now_ms) else {
            return;
        };
        let target = editor.target().clone();
        if let Some(pending) = self.pending_text.as_mut().filter(|p| p.id == target) {
            draft.apply_to(pending);
        }
        self.events.push(PipelineEvent::LivePreview { target, draft });
    }

    /// Edit the open editor's draft at `now_ms`. Returns `false` if no editor is open.
    pub fn edit_text<F>(&mut self, now_ms: u64, f: F) -> bool
    where
        F: FnOnce(&mut TextDraft),
    {
        match self.overlay.editor_mut() {
            Some(editor) => {
                editor.edit(now_ms, f);
                true
            }
            None => false,
        }
    }

    /// Close the editor and merge its draft into the store, then prune blank
    /// text objects.
    pub fn submit_editor(&mut self, doc: &mut PageDocument) -> bool {
        let Some((target, draft)) = self.overlay.close_editor() else {
            return false;
        };

        let committed = match self.pending_text.take() {
            Some(mut pending) if pending.id == target => {
                draft.apply_to(&mut pending);
                if pending.is_blank() {
                    log::debug!("discarding blank pending text {target}");
                    false
                } else {
                    doc.store.append(pending.into());
                    doc.redo.clear();
                    self.events.push(PipelineEvent::Committed { id: target.clone() });
                    true
                }
            }
            other => {
                self.pending_text = other;
                overlay::commit_draft(&mut doc.store, &target, &draft)
            }
        };

        let pruned = overlay::prune_blank_text(&mut doc.store);
        if !pruned.is_empty() {
            self.events.push(PipelineEvent::Pruned { removed: pruned });
        }
        self.overlay.refresh(&doc.store);
        self.events.push(PipelineEvent::EditorClosed { target, draft, committed });
        true
    }

    /// Copy the selected text object.
    pub fn copy_selection(&mut self, doc: &mut PageDocument) -> Option<ObjectId> {
        let id = self.overlay.copy(doc)?;
        self.events.push(PipelineEvent::Committed { id: id.clone() });
        self.events.push(PipelineEvent::SelectionChanged { selected: Some(id.clone()) });
        Some(id)
    }

    /// Remove the selected text object and return it.
    pub fn cut_selection(&mut self, doc: &mut PageDocument) -> Option<DrawableObject> {
        let object = self.overlay.cut(doc)?;
        self.events.push(PipelineEvent::SelectionChanged { selected: None });
        Some(object)
    }

    /// Delete the selected text object.
    pub fn delete_selection(&mut self, doc: &mut PageDocument) -> bool {
        self.cut_selection(doc).is_some()
    }
}

/// Topmost text-like object under `position`.
fn hit_text(doc: &PageDocument, position: Point) -> Option<ObjectId> {
    doc.store
        .objects()
        .iter()
        .rev()
        .find(|o| o.is_text_like() && o.hit_test(position, 0.0))
        .map(|o| o.id().clone())
}

fn new_text_object(tool: ToolKind, anchor: Point, color: &str) -> TextObject {
    let style = TextStyle {
        color: color.to_string(),
        ..TextStyle::default()
    };
    let text = TextObject::new(tool, anchor, String::new(), style);
    match tool {
        ToolKind::Sticky => {
            let mut sticky = text.with_box(STICKY_SIZE);
            sticky.style.background_color = Some(STICKY_BACKGROUND.to_string());
            sticky
        }
        ToolKind::Comment => text.with_box(COMMENT_SIZE),
        _ => text,
    }
}
