//! Transient user inputs
//!
//! Text the user typed (or files they attached) for a generation action that
//! has not succeeded yet. A successful task clears its draft; a failed one
//! leaves it so the user can retry without re-entering anything.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::constants::input::MAX_IMAGE_BYTES;
use crate::course::NodeId;
use crate::types::{CourseError, Result};

/// Image attached to a solver request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageAttachment {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Pending solver input for one chapter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverDraft {
    pub text: Option<String>,
    pub image: Option<ImageAttachment>,
}

impl SolverDraft {
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.text = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
    }

    /// Attach an image, rejecting anything above 4 MiB.
    ///
    /// A rejected image also clears any previously attached one.
    pub fn attach_image(&mut self, bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<()> {
        if bytes.len() > MAX_IMAGE_BYTES {
            self.image = None;
            return Err(CourseError::ImageTooLarge {
                size: bytes.len(),
                limit: MAX_IMAGE_BYTES,
            });
        }
        self.image = Some(ImageAttachment {
            bytes,
            mime_type: mime_type.into(),
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none()
    }
}

/// All drafts of the session, keyed by the node they target
#[derive(Debug, Clone, Default)]
pub struct Drafts {
    exercise_focus: HashMap<NodeId, String>,
    image_focus: HashMap<NodeId, String>,
    solver: HashMap<NodeId, SolverDraft>,
    exam_focus: Option<String>,
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

impl Drafts {
    pub fn new() -> Self {
        Self::default()
    }

    // Exercise focus (per chapter)

    pub fn set_exercise_focus(&mut self, chapter_id: &NodeId, focus: impl Into<String>) {
        match non_blank(focus.into()) {
            Some(focus) => {
                self.exercise_focus.insert(chapter_id.clone(), focus);
            }
            None => {
                self.exercise_focus.remove(chapter_id);
            }
        }
    }

    pub fn exercise_focus(&self, chapter_id: &NodeId) -> Option<String> {
        self.exercise_focus.get(chapter_id).cloned()
    }

    pub fn clear_exercise_focus(&mut self, chapter_id: &NodeId) {
        self.exercise_focus.remove(chapter_id);
    }

    // Exam focus (course level)

    pub fn set_exam_focus(&mut self, focus: impl Into<String>) {
        self.exam_focus = non_blank(focus.into());
    }

    pub fn exam_focus(&self) -> Option<String> {
        self.exam_focus.clone()
    }

    pub fn clear_exam_focus(&mut self) {
        self.exam_focus = None;
    }

    // Image focus (per section)

    pub fn set_image_focus(&mut self, section_id: &NodeId, focus: impl Into<String>) {
        match non_blank(focus.into()) {
            Some(focus) => {
                self.image_focus.insert(section_id.clone(), focus);
            }
            None => {
                self.image_focus.remove(section_id);
            }
        }
    }

    pub fn image_focus(&self, section_id: &NodeId) -> Option<String> {
        self.image_focus.get(section_id).cloned()
    }

    pub fn clear_image_focus(&mut self, section_id: &NodeId) {
        self.image_focus.remove(section_id);
    }

    // Solver input (per chapter)

    pub fn solver_mut(&mut self, chapter_id: &NodeId) -> &mut SolverDraft {
        self.solver.entry(chapter_id.clone()).or_default()
    }

    pub fn solver(&self, chapter_id: &NodeId) -> Option<SolverDraft> {
        self.solver.get(chapter_id).filter(|d| !d.is_empty()).cloned()
    }

    pub fn clear_solver(&mut self, chapter_id: &NodeId) {
        self.solver.remove(chapter_id);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
