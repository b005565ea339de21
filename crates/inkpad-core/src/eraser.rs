//! Eraser algorithms: pixel, stroke and object erase.
//!
//! Every function reads and writes a [`StrokeStore`] and pushes what it took
//! away onto the [`RedoBuffer`]. When nothing is affected the store snapshot
//! is left untouched.
//!
//! [`ErasedEntry::original_index`] is the index the object occupied when it
//! was removed, counting objects removed earlier in the same pass as already
//! gone. Restoring entries in stack order therefore rebuilds the prior
//! array exactly.

use crate::geometry::{distance_sq, point_in_polygon, points_bounds, rect_contains, segment_distance_sq};
use crate::objects::{DrawableObject, FreehandStroke, ObjectId, StrokePoint};
use crate::store::{ErasedEntry, RedoBuffer, StrokeStore};
use crate::tools::ToolKind;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Added to half the eraser size to get the pixel-erase margin.
pub const PIXEL_MARGIN_PADDING: f64 = 2.0;

/// Added to a stroke's width to get the stroke-erase reach.
pub const STROKE_REACH_PADDING: f64 = 4.0;

/// Eraser behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EraserMode {
    /// Cut away the parts of strokes under the eraser.
    #[default]
    Pixel,
    /// Remove whole strokes touched by the eraser.
    Stroke,
    /// Remove objects by tap (bounding box) or lasso (bounding-box center).
    Object,
}

/// What an erase pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EraseReport {
    /// Ids no longer in the store.
    pub removed: Vec<ObjectId>,
    /// Fragments created by pixel erase.
    pub fragments: Vec<ObjectId>,
}

impl EraseReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Pixel erase over the full erase path.
///
/// Freehand points within the margin of any erase point are dropped, and a
/// segment passing within the margin separates its endpoints. Each maximal
/// surviving run of two or more points becomes a new stroke with a derived
/// id; shorter runs are discarded. Text-like objects, shapes and eraser
/// strokes pass through unchanged.
pub fn pixel_erase(
    store: &mut StrokeStore,
    redo: &mut RedoBuffer,
    erase_points: &[Point],
    eraser_size: f64,
    timestamp_ms: u64,
) -> EraseReport {
    let mut report = EraseReport::default();
    if erase_points.is_empty() {
        return report;
    }

    let margin = 0.5 * eraser_size + PIXEL_MARGIN_PADDING;
    let margin_sq = margin * margin;
    let Some(erase_bounds) = points_bounds(erase_points.iter().copied()) else {
        return report;
    };
    let erase_bounds = erase_bounds.inflate(margin, margin);

    let mut next: Vec<DrawableObject> = Vec::with_capacity(store.len());
    let mut entries = Vec::new();

    for object in store.objects() {
        let runs = match object {
            DrawableObject::Freehand(stroke) if stroke.tool != ToolKind::Eraser => {
                if object.bounding_box().is_some_and(|b| overlaps(b, erase_bounds)) {
                    split_runs(stroke, erase_points, margin_sq).map(|runs| (stroke, runs))
                } else {
                    None
                }
            }
            DrawableObject::Freehand(_) | DrawableObject::Shape(_) | DrawableObject::Text(_) => None,
        };

        let Some((stroke, runs)) = runs else {
            next.push(object.clone());
            continue;
        };

        let original_index = next.len();
        let mut replaced_by = Vec::new();
        for (n, run) in runs.into_iter().filter(|run| run.len() >= 2).enumerate() {
            let fragment = stroke.fragment(stroke.id.fragment(n, timestamp_ms), run);
            replaced_by.push(fragment.id.clone());
            next.push(fragment.into());
        }

        log::debug!(
            "pixel erase: {} split into {} fragment(s)",
            stroke.id,
            replaced_by.len()
        );
        report.removed.push(stroke.id.clone());
        report.fragments.extend(replaced_by.iter().cloned());
        entries.push(ErasedEntry {
            object: object.clone(),
            original_index,
            replaced_by,
        });
    }

    if entries.is_empty() {
        return report;
    }

    store.replace_all(next);
    for entry in entries {
        redo.push(entry);
    }
    report
}

/// Inclusive overlap of two rects; degenerate (zero-area) rects count.
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// Split a stroke into the runs that survive the erase points.
///
/// Returns `None` when the stroke is untouched.
fn split_runs(stroke: &FreehandStroke, erase_points: &[Point], margin_sq: f64) -> Option<Vec<Vec<StrokePoint>>> {
    let near = |p: Point| erase_points.iter().any(|e| distance_sq(p, *e) <= margin_sq);
    let cut = |a: Point, b: Point| erase_points.iter().any(|e| segment_distance_sq(*e, a, b) <= margin_sq);

    let mut touched = false;
    let mut runs = Vec::new();
    let mut current: Vec<StrokePoint> = Vec::new();
    let mut previous: Option<Point> = None;

    for point in &stroke.points {
        let position = point.position();
        if near(position) {
            touched = true;
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            previous = None;
            continue;
        }
        if let Some(prev) = previous {
            if cut(prev, position) {
                touched = true;
                runs.push(std::mem::take(&mut current));
            }
        }
        current.push(*point);
        previous = Some(position);
    }
    if !current.is_empty() {
        runs.push(current);
    }

    touched.then_some(runs)
}

/// One stroke-erase evaluation pass.
///
/// Walks the objects from the top down and removes the first freehand stroke
/// with a point within `width + 4` of any erase point. At most one object is
/// removed per pass.
pub fn stroke_erase(store: &mut StrokeStore, redo: &mut RedoBuffer, erase_points: &[Point]) -> Option<ObjectId> {
    if erase_points.is_empty() {
        return None;
    }

    let index = store.objects().iter().rposition(|object| match object {
        DrawableObject::Freehand(stroke) => {
            let reach = stroke.effective_width() + STROKE_REACH_PADDING;
            let reach_sq = reach * reach;
            stroke
                .positions()
                .any(|p| erase_points.iter().any(|e| distance_sq(p, *e) <= reach_sq))
        }
        DrawableObject::Shape(_) | DrawableObject::Text(_) => false,
    })?;

    let id = store.objects()[index].id().clone();
    let (original_index, object) = store.remove_by_id(&id)?;
    log::debug!("stroke erase: removed {id}");
    redo.push(ErasedEntry {
        object,
        original_index,
        replaced_by: Vec::new(),
    });
    Some(id)
}

/// Object-mode tap: remove the topmost non-text object whose bounding box
/// contains `point`.
pub fn object_erase_tap(store: &mut StrokeStore, redo: &mut RedoBuffer, point: Point) -> Option<ObjectId> {
    let index = store.objects().iter().rposition(|object| match object {
        DrawableObject::Text(_) => false,
        DrawableObject::Freehand(_) | DrawableObject::Shape(_) => {
            object.bounding_box().is_some_and(|b| rect_contains(b, point))
        }
    })?;

    let id = store.objects()[index].id().clone();
    let (original_index, object) = store.remove_by_id(&id)?;
    log::debug!("object erase (tap): removed {id}");
    redo.push(ErasedEntry {
        object,
        original_index,
        replaced_by: Vec::new(),
    });
    Some(id)
}

/// Object-mode lasso: remove every object whose bounding-box center lies in
/// the lasso polygon. Lassos of two points or fewer do nothing.
pub fn object_erase_lasso(store: &mut StrokeStore, redo: &mut RedoBuffer, lasso: &[Point]) -> EraseReport {
    let mut report = EraseReport::default();
    if lasso.len() <= 2 {
        return report;
    }

    let mut next = Vec::with_capacity(store.len());
    let mut entries = Vec::new();
    for object in store.objects() {
        let inside = object.bounding_box().is_some_and(|b| {
            let c = b.center();
            point_in_polygon(lasso, c.x, c.y)
        });
        if inside {
            report.removed.push(object.id().clone());
            entries.push(ErasedEntry {
                object: object.clone(),
                original_index: next.len(),
                replaced_by: Vec::new(),
            });
        } else {
            next.push(object.clone());
        }
    }

    if entries.is_empty() {
        return report;
    }

    log::debug!("object erase (lasso): removed {} object(s)", entries.len());
    store.replace_all(next);
    for entry in entries {
        redo.push(entry);
    }
    report
}

/// Undo the most recent erase: drop its fragments and reinsert the object.
pub fn restore_last(store: &mut StrokeStore, redo: &mut RedoBuffer) -> Option<ObjectId> {
    let entry = redo.pop()?;
    let mut next = store.filter(|o| !entry.replaced_by.contains(o.id()));
    let index = entry.original_index.min(next.len());
    let id = entry.object.id().clone();
    next.insert(index, entry.object);
    store.replace_all(next);
    log::debug!("restored {id} at {index}");
    Some(id)
}
