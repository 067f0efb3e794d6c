//! Course tree entities
//!
//! Containers hold their children behind `Arc` so an update can rebuild the
//! path to one node and reuse every untouched subtree as-is.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::id::NodeId;

// =============================================================================
// Course
// =============================================================================

/// Root of the document: title, ordered chapters and course-level exam sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub title: String,
    pub chapters: Vec<Arc<Chapter>>,
    pub exam_sets: Vec<Arc<ExerciseSet>>,
}

impl Course {
    pub fn new(title: impl Into<String>, chapters: Vec<Chapter>) -> Self {
        Self {
            title: title.into(),
            chapters: chapters.into_iter().map(Arc::new).collect(),
            exam_sets: Vec::new(),
        }
    }

    pub fn chapter(&self, id: &NodeId) -> Option<&Arc<Chapter>> {
        self.chapters.iter().find(|c| &c.id == id)
    }

    pub fn section(&self, chapter_id: &NodeId, section_id: &NodeId) -> Option<&Arc<Section>> {
        self.chapter(chapter_id)?.section(section_id)
    }

    /// Context line for exam generation: course title plus every chapter title
    pub fn exam_context(&self) -> String {
        let titles: Vec<&str> = self.chapters.iter().map(|c| c.title.as_str()).collect();
        format!("{}: {}", self.title, titles.join(", "))
    }

    /// Every id in the tree, depth-first in document order
    pub fn node_ids(&self) -> Vec<&NodeId> {
        let mut ids = Vec::new();
        for chapter in &self.chapters {
            ids.push(&chapter.id);
            for section in &chapter.sections {
                ids.push(&section.id);
                ids.extend(section.images.iter().map(|i| &i.id));
            }
            ids.extend(chapter.exercise_sets.iter().map(|s| &s.id));
            ids.extend(chapter.solver_sets.iter().map(|s| &s.id));
        }
        ids.extend(self.exam_sets.iter().map(|s| &s.id));
        ids
    }
}

// =============================================================================
// Chapter
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: NodeId,
    pub title: String,
    pub sections: Vec<Arc<Section>>,
    pub exercise_sets: Vec<Arc<ExerciseSet>>,
    pub solver_sets: Vec<Arc<SolverSet>>,
}

impl Chapter {
    /// New chapter with one empty section per title
    pub fn new<I, S>(title: impl Into<String>, section_titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: NodeId::new(),
            title: title.into(),
            sections: section_titles
                .into_iter()
                .map(|t| Arc::new(Section::new(t)))
                .collect(),
            exercise_sets: Vec::new(),
            solver_sets: Vec::new(),
        }
    }

    pub fn section(&self, id: &NodeId) -> Option<&Arc<Section>> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Context line for exercise generation: chapter title plus section titles
    pub fn exercise_context(&self) -> String {
        let titles: Vec<&str> = self.sections.iter().map(|s| s.title.as_str()).collect();
        format!("{}: {}", self.title, titles.join(", "))
    }
}

// =============================================================================
// Section
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: NodeId,
    pub title: String,
    /// Markdown with LaTeX; `None` until the first successful generation
    pub content: Option<String>,
    pub images: Vec<Arc<GeneratedImage>>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            title: title.into(),
            content: None,
            images: Vec::new(),
        }
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

// =============================================================================
// Exercises
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSet {
    pub id: NodeId,
    pub focused_idea: Option<String>,
    pub exercises: Vec<Exercise>,
}

impl ExerciseSet {
    pub fn new(focused_idea: Option<String>, exercises: Vec<Exercise>) -> Self {
        Self {
            id: NodeId::new(),
            focused_idea,
            exercises,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub problem: String,
    #[serde(default)]
    pub parts: Vec<ExercisePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExercisePart {
    pub part: String,
    #[serde(default)]
    pub solution: String,
}

// =============================================================================
// Solver
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverInputKind {
    Text,
    Image,
}

/// What the user submitted to the solver; image content is base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverInput {
    pub kind: SolverInputKind,
    pub content: String,
    /// Set for image input only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl SolverInput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: SolverInputKind::Text,
            content: content.into(),
            mime_type: None,
        }
    }

    pub fn image(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            kind: SolverInputKind::Image,
            content: base64.into(),
            mime_type: Some(mime_type.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverSet {
    pub id: NodeId,
    pub user_input: SolverInput,
    pub solution: String,
}

impl SolverSet {
    pub fn new(user_input: SolverInput, solution: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            user_input,
            solution: solution.into(),
        }
    }
}

// =============================================================================
// Images
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: NodeId,
    /// Base64-encoded bitmap
    pub image_data: String,
    pub prompt: String,
}

impl GeneratedImage {
    pub fn new(image_data: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            image_data: image_data.into(),
            prompt: prompt.into(),
        }
    }
}
