//! The per-page ordered collection of drawable objects and the erase-only redo buffer.
//!
//! The store hands out `Arc` snapshots. Every mutation installs a brand new
//! `Arc`, so a renderer holding the previous snapshot keeps drawing a
//! consistent frame, and comparing snapshots with [`Arc::ptr_eq`] tells
//! whether anything changed.

use crate::objects::{DrawableObject, ObjectId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ordered objects of one page. Z-order equals insertion order.
#[derive(Debug, Clone, Default)]
pub struct StrokeStore {
    objects: Arc<Vec<DrawableObject>>,
}

impl StrokeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot (back to front).
    pub fn snapshot(&self) -> Arc<Vec<DrawableObject>> {
        Arc::clone(&self.objects)
    }

    /// Borrow the objects (back to front).
    pub fn objects(&self) -> &[DrawableObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Append an object on top.
    pub fn append(&mut self, object: DrawableObject) {
        let mut next = Vec::with_capacity(self.objects.len() + 1);
        next.extend(self.objects.iter().cloned());
        next.push(object);
        self.objects = Arc::new(next);
    }

    /// Replace the whole collection.
    pub fn replace_all(&mut self, objects: Vec<DrawableObject>) {
        self.objects = Arc::new(objects);
    }

    /// New collection of the objects matching `predicate`; the store is untouched.
    pub fn filter<F>(&self, mut predicate: F) -> Vec<DrawableObject>
    where
        F: FnMut(&DrawableObject) -> bool,
    {
        self.objects.iter().filter(|o| predicate(o)).cloned().collect()
    }

    /// Find an object by id.
    pub fn find_by_id(&self, id: &ObjectId) -> Option<&DrawableObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    /// Array index of an object.
    pub fn index_of(&self, id: &ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    /// Replace one object by id with an edited copy, keeping its position.
    ///
    /// Returns `false` (and leaves the snapshot untouched) if the id is gone.
    pub fn update_by_id<F>(&mut self, id: &ObjectId, edit: F) -> bool
    where
        F: FnOnce(&mut DrawableObject),
    {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let mut next: Vec<DrawableObject> = self.objects.as_ref().clone();
        edit(&mut next[index]);
        self.objects = Arc::new(next);
        true
    }

    /// Remove one object by id, returning it with its former index.
    pub fn remove_by_id(&mut self, id: &ObjectId) -> Option<(usize, DrawableObject)> {
        let index = self.index_of(id)?;
        let mut next: Vec<DrawableObject> = self.objects.as_ref().clone();
        let removed = next.remove(index);
        self.objects = Arc::new(next);
        Some((index, removed))
    }

    /// Insert at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, object: DrawableObject) {
        let mut next: Vec<DrawableObject> = self.objects.as_ref().clone();
        next.insert(index.min(next.len()), object);
        self.objects = Arc::new(next);
    }
}

/// An erased object eligible for restoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErasedEntry {
    pub object: DrawableObject,
    pub original_index: usize,
    /// Fragments that took the object's place (pixel erase only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replaced_by: Vec<ObjectId>,
}

/// Stack of erased objects. Only erasers push; creating objects clears it.
#[derive(Debug, Clone, Default)]
pub struct RedoBuffer {
    entries: Vec<ErasedEntry>,
}

impl RedoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ErasedEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<ErasedEntry> {
        self.entries.pop()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("redo buffer cleared ({} entries)", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ErasedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
