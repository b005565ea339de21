//! Text object overlay: selection, move/resize, clipboard actions and the
//! inline editor.
//!
//! Only text-like objects can be selected here. Every change goes through
//! the page's [`StrokeStore`](crate::store::StrokeStore) replace operations.

mod editor;
mod selection;

pub use editor::{InlineEditor, LIVE_UPDATE_DEBOUNCE_MS, TextDraft};
pub use selection::{
    Corner, HANDLE_HIT_TOLERANCE, Handle, HandleKind, ManipulationState, RESIZE_FACTOR, SelectionBox,
    apply_manipulation, resize_delta,
};

use crate::objects::{DrawableObject, ObjectId, TextObject};
use crate::page::PageDocument;
use crate::store::StrokeStore;
use kurbo::{Point, Vec2};

/// Offset applied to copies.
pub const COPY_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

/// Selection, drag and edit state of one page.
#[derive(Debug, Clone, Default)]
pub struct TextOverlay {
    selection: Option<SelectionBox>,
    manipulation: Option<ManipulationState>,
    editor: Option<InlineEditor>,
}

impl TextOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&SelectionBox> {
        self.selection.as_ref()
    }

    pub fn selected(&self) -> Option<&ObjectId> {
        self.selection.as_ref().map(|s| &s.target)
    }

    /// Select a text-like object. Returns `false` if `id` is not one.
    pub fn select(&mut self, store: &StrokeStore, id: &ObjectId) -> bool {
        match store.find_by_id(id).and_then(DrawableObject::as_text) {
            Some(text) => {
                self.selection = Some(SelectionBox::around(text));
                true
            }
            None => false,
        }
    }

    /// Clear the selection. Returns whether anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        self.manipulation = None;
        self.selection.take().is_some()
    }

    /// Recompute the box from the store; drops a selection whose object is gone.
    pub fn refresh(&mut self, store: &StrokeStore) {
        if let Some(id) = self.selected().cloned() {
            if !self.select(store, &id) {
                self.clear_selection();
            }
        }
    }

    /// Which part of the selection box is at `point`.
    pub fn hit_selection(&self, point: Point) -> Option<HandleKind> {
        self.selection.as_ref().and_then(|s| s.hit_test(point))
    }

    /// Start moving or resizing the selected object.
    pub fn begin_manipulation(&mut self, handle: HandleKind) -> bool {
        let Some(target) = self.selected().cloned() else {
            return false;
        };
        log::debug!("overlay: {handle:?} drag on {target}");
        self.manipulation = Some(ManipulationState::new(target, handle));
        true
    }

    /// Accumulate a pointer delta for the next flush.
    pub fn drag(&mut self, delta: Vec2) {
        if let Some(state) = &mut self.manipulation {
            state.accumulate(delta);
        }
    }

    /// Apply the accumulated delta to the store. Returns whether the store changed.
    pub fn flush(&mut self, store: &mut StrokeStore) -> bool {
        let Some(state) = &mut self.manipulation else {
            return false;
        };
        let Some(delta) = state.take_pending() else {
            return false;
        };
        let handle = state.handle;
        let changed = store.update_by_id(&state.target, |object| {
            if let Some(text) = object.as_text_mut() {
                apply_manipulation(text, handle, delta);
            }
        });
        self.refresh(store);
        changed
    }

    /// Finish the drag, applying whatever delta is still pending.
    ///
    /// Safe to call more than once; only the first call flushes.
    pub fn end_manipulation(&mut self, store: &mut StrokeStore) -> bool {
        let changed = self.flush(store);
        self.manipulation = None;
        changed
    }

    /// Duplicate the selected object with a fresh id, offset by [`COPY_OFFSET`].
    /// The copy becomes the selection.
    pub fn copy(&mut self, doc: &mut PageDocument) -> Option<ObjectId> {
        let id = self.selected()?;
        let mut copy = doc.store.find_by_id(id)?.clone();
        let new_id = ObjectId::generate();
        copy.set_id(new_id.clone());
        copy.translate(COPY_OFFSET);
        doc.store.append(copy);
        doc.redo.clear();
        self.select(&doc.store, &new_id);
        log::debug!("overlay: copied into {new_id}");
        Some(new_id)
    }

    /// Remove the selected object and hand it to the caller.
    pub fn cut(&mut self, doc: &mut PageDocument) -> Option<DrawableObject> {
        let id = self.selected()?.clone();
        self.clear_selection();
        doc.store.remove_by_id(&id).map(|(_, object)| object)
    }

    /// Remove the selected object.
    pub fn delete(&mut self, doc: &mut PageDocument) -> bool {
        self.cut(doc).is_some()
    }

    pub fn editor(&self) -> Option<&InlineEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut InlineEditor> {
        self.editor.as_mut()
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    /// Open the inline editor on `object`, replacing any selection box.
    pub fn open_editor(&mut self, object: &TextObject) -> &InlineEditor {
        self.clear_selection();
        self.editor.insert(InlineEditor::open(object))
    }

    /// Close the editor, returning the target and final draft.
    pub fn close_editor(&mut self) -> Option<(ObjectId, TextDraft)> {
        self.editor.take().map(InlineEditor::submit)
    }
}

/// Merge an edited draft into a stored text object.
pub fn commit_draft(store: &mut StrokeStore, id: &ObjectId, draft: &TextDraft) -> bool {
    store.update_by_id(id, |object| {
        if let Some(text) = object.as_text_mut() {
            draft.apply_to(text);
        }
    })
}

/// Remove every text-like object whose text is empty or whitespace.
pub fn prune_blank_text(store: &mut StrokeStore) -> Vec<ObjectId> {
    let blank: Vec<ObjectId> = store
        .objects()
        .iter()
        .filter(|o| o.as_text().is_some_and(TextObject::is_blank))
        .map(|o| o.id().clone())
        .collect();
    if !blank.is_empty() {
        log::debug!("pruning {} blank text object(s)", blank.len());
        let kept = store.filter(|o| !blank.contains(o.id()));
        store.replace_all(kept);
    }
    blank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{FreehandStroke, TextStyle};
    use crate::store::ErasedEntry;
    use crate::tools::ToolKind;
    use std::sync::Arc;

    fn text_at(x: f64, y: f64, content: &str) -> DrawableObject {
        TextObject::new(ToolKind::Text, Point::new(x, y), content.into(), TextStyle::default()).into()
    }

    fn doc_with(objects: Vec<DrawableObject>) -> PageDocument {
        let mut doc = PageDocument::new();
        doc.store.replace_all(objects);
        doc
    }

    #[test]
    fn test_only_text_is_selectable() {
        let stroke: DrawableObject = FreehandStroke::new(ToolKind::Pen, "#000", 2.0).into();
        let doc = doc_with(vec![stroke.clone(), text_at(0.0, 50.0, "a")]);
        let mut overlay = TextOverlay::new();
        assert!(!overlay.select(&doc.store, stroke.id()));
        assert!(overlay.select(&doc.store, doc.store.objects()[1].id()));
    }

    #[test]
    fn test_move_flushes_accumulated_delta() {
        let mut doc = doc_with(vec![text_at(0.0, 50.0, "a")]);
        let id = doc.store.objects()[0].id().clone();
        let mut overlay = TextOverlay::new();
        overlay.select(&doc.store, &id);
        overlay.begin_manipulation(HandleKind::Body);
        overlay.drag(Vec2::new(3.0, 1.0));
        overlay.drag(Vec2::new(7.0, 1.0));

        let before = doc.store.snapshot();
        assert!(overlay.flush(&mut doc.store));
        assert!(!Arc::ptr_eq(&before, &doc.store.snapshot()));
        let text = doc.store.objects()[0].as_text().unwrap();
        assert!((text.x - 10.0).abs() < f64::EPSILON);
        assert!((text.y - 52.0).abs() < f64::EPSILON);

        // Nothing pending: no new snapshot
        let before = doc.store.snapshot();
        assert!(!overlay.end_manipulation(&mut doc.store));
        assert!(Arc::ptr_eq(&before, &doc.store.snapshot()));
    }

    #[test]
    fn test_end_flushes_exactly_once() {
        let mut doc = doc_with(vec![text_at(0.0, 50.0, "a")]);
        let id = doc.store.objects()[0].id().clone();
        let mut overlay = TextOverlay::new();
        overlay.select(&doc.store, &id);
        overlay.begin_manipulation(HandleKind::Body);
        overlay.drag(Vec2::new(5.0, 0.0));
        assert!(overlay.end_manipulation(&mut doc.store));
        assert!(!overlay.end_manipulation(&mut doc.store));
        assert!((doc.store.objects()[0].as_text().unwrap().x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_copy_offsets_and_clears_redo() {
        let mut doc = doc_with(vec![text_at(10.0, 50.0, "a")]);
        doc.redo.push(ErasedEntry {
            object: text_at(0.0, 0.0, "gone"),
            original_index: 0,
            replaced_by: Vec::new(),
        });
        let id = doc.store.objects()[0].id().clone();
        let mut overlay = TextOverlay::new();
        overlay.select(&doc.store, &id);

        let copy_id = overlay.copy(&mut doc).unwrap();
        assert_ne!(copy_id, id);
        assert_eq!(doc.store.len(), 2);
        let copy = doc.store.objects()[1].as_text().unwrap();
        assert!((copy.x - 30.0).abs() < f64::EPSILON);
        assert!((copy.y - 70.0).abs() < f64::EPSILON);
        assert!(doc.redo.is_empty());
        assert_eq!(overlay.selected(), Some(&copy_id));
    }

    #[test]
    fn test_cut_returns_object() {
        let mut doc = doc_with(vec![text_at(10.0, 50.0, "a")]);
        let id = doc.store.objects()[0].id().clone();
        let mut overlay = TextOverlay::new();
        overlay.select(&doc.store, &id);
        let cut = overlay.cut(&mut doc).unwrap();
        assert_eq!(cut.id(), &id);
        assert!(doc.store.is_empty());
        assert!(overlay.selected().is_none());
        assert!(!overlay.delete(&mut doc));
    }

    #[test]
    fn test_prune_blank_text() {
        let mut store = StrokeStore::new();
        store.replace_all(vec![text_at(0.0, 0.0, "keep"), text_at(0.0, 0.0, "   ")]);
        let pruned = prune_blank_text(&mut store);
        assert_eq!(pruned.len(), 1);
        assert_eq!(store.len(), 1);

        let before = store.snapshot();
        assert!(prune_blank_text(&mut store).is_empty());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }
}
