//! Inline text editor with debounced live updates.

use crate::objects::{ObjectId, TextAlign, TextObject, TextStyle};
use serde::{Deserialize, Serialize};

/// Quiet period after the last edit before a live update is emitted.
pub const LIVE_UPDATE_DEBOUNCE_MS: u64 = 300;

/// The editable fields of a text-like object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDraft {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: TextAlign,
    pub color: String,
    pub font_size: f64,
    pub font_family: String,
}

impl TextDraft {
    /// Draft pre-filled from an object's current fields.
    pub fn from_object(object: &TextObject) -> Self {
        Self {
            text: object.text.clone(),
            bold: object.style.bold,
            italic: object.style.italic,
            underline: object.style.underline,
            align: object.style.align,
            color: object.style.color.clone(),
            font_size: object.style.font_size,
            font_family: object.style.font_family.clone(),
        }
    }

    /// Merge the draft into an object. Fields the editor does not own
    /// (position, padding, background) are left alone.
    pub fn apply_to(&self, object: &mut TextObject) {
        object.text.clone_from(&self.text);
        object.style.bold = self.bold;
        object.style.italic = self.italic;
        object.style.underline = self.underline;
        object.style.align = self.align;
        object.style.color.clone_from(&self.color);
        if self.font_size.is_finite() {
            object.style.font_size = self.font_size.clamp(TextStyle::MIN_FONT_SIZE, TextStyle::MAX_FONT_SIZE);
        } else {
            log::warn!("ignoring non-finite font size for {}", object.id);
        }
        object.style.font_family.clone_from(&self.font_family);
    }
}

/// An open edit session on one text-like object.
#[derive(Debug, Clone)]
pub struct InlineEditor {
    target: ObjectId,
    draft: TextDraft,
    /// When the pending live update is due.
    deadline_ms: Option<u64>,
}

impl InlineEditor {
    pub fn open(object: &TextObject) -> Self {
        Self {
            target: object.id.clone(),
            draft: TextDraft::from_object(object),
            deadline_ms: None,
        }
    }

    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn draft(&self) -> &TextDraft {
        &self.draft
    }

    /// Edit the draft at `now_ms`; restarts the debounce window.
    pub fn edit<F>(&mut self, now_ms: u64, f: F)
    where
        F: FnOnce(&mut TextDraft),
    {
        f(&mut self.draft);
        self.deadline_ms = Some(now_ms.saturating_add(LIVE_UPDATE_DEBOUNCE_MS));
    }

    /// The live update, once the debounce window has passed quietly.
    pub fn poll(&mut self, now_ms: u64) -> Option<TextDraft> {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                Some(self.draft.clone())
            }
            _ => None,
        }
    }

    /// Close the session, returning the final draft.
    pub fn submit(self) -> (ObjectId, TextDraft) {
        (self.target, self.draft)
    }
}
