//! Course Document
//!
//! Session-scoped owner of the single course value. The document is either
//! empty (no course generated yet, or reset) or populated with one course.
//! Every change goes through the id-addressed methods below, which delegate
//! to [`super::mutation`] and swap in the new root.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::id::NodeId;
use super::model::{Chapter, Course, ExerciseSet, GeneratedImage, Section, SolverSet};
use super::mutation;

/// Lifecycle state of the document
#[derive(Debug, Clone, Default)]
enum DocumentState {
    /// No course yet, or the previous one was discarded by a reset
    #[default]
    Empty,
    Populated(Arc<Course>),
}

/// Owner of the course tree for one authoring session
#[derive(Debug, Default)]
pub struct CourseDocument {
    state: DocumentState,
    revision: u64,
}

/// Document shared between concurrently running generation tasks.
///
/// The lock is only held while a transform runs, never across an `.await`.
pub type SharedDocument = Arc<RwLock<CourseDocument>>;

pub fn new_shared_document() -> SharedDocument {
    Arc::new(RwLock::new(CourseDocument::new()))
}

impl CourseDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current course root, if any (cheap handle clone)
    pub fn course(&self) -> Option<Arc<Course>> {
        match &self.state {
            DocumentState::Empty => None,
            DocumentState::Populated(course) => Some(Arc::clone(course)),
        }
    }

    pub fn is_populated(&self) -> bool {
        matches!(self.state, DocumentState::Populated(_))
    }

    /// Counter bumped on every change that produced a new root
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Install a freshly generated course, replacing any previous one
    pub fn populate(&mut self, course: Course) {
        debug!(chapters = course.chapters.len(), "Populating course document");
        self.state = DocumentState::Populated(Arc::new(course));
        self.revision += 1;
    }

    /// Discard the whole tree
    pub fn reset(&mut self) {
        if self.is_populated() {
            debug!("Discarding course document");
            self.state = DocumentState::Empty;
            self.revision += 1;
        }
    }

    /// Swap in `f(root)`; silently does nothing when empty or when `f` returned the same root
    fn apply<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&Arc<Course>) -> Arc<Course>,
    {
        let DocumentState::Populated(current) = &self.state else {
            return false;
        };
        let next = f(current);
        if Arc::ptr_eq(current, &next) {
            return false;
        }
        self.state = DocumentState::Populated(next);
        self.revision += 1;
        true
    }

    // =========================================================================
    // Targeted updates
    // =========================================================================

    /// Root-level transform; a no-op without a course
    pub fn update_course<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&Course) -> Course,
    {
        self.apply(|course| mutation::update_course(course, f))
    }

    pub fn update_chapter<F>(&mut self, chapter_id: &NodeId, f: F) -> bool
    where
        F: FnOnce(&Chapter) -> Chapter,
    {
        self.apply(|course| mutation::update_chapter(course, chapter_id, f))
    }

    pub fn update_section<F>(&mut self, chapter_id: &NodeId, section_id: &NodeId, f: F) -> bool
    where
        F: FnOnce(&Section) -> Section,
    {
        self.apply(|course| mutation::update_section(course, chapter_id, section_id, f))
    }

    pub fn set_section_content(
        &mut self,
        chapter_id: &NodeId,
        section_id: &NodeId,
        content: String,
    ) -> bool {
        self.apply(|course| mutation::set_section_content(course, chapter_id, section_id, content))
    }

    pub fn append_exercise_set(&mut self, chapter_id: &NodeId, set: ExerciseSet) -> bool {
        self.apply(|course| mutation::append_exercise_set(course, chapter_id, set))
    }

    pub fn append_solver_set(&mut self, chapter_id: &NodeId, set: SolverSet) -> bool {
        self.apply(|course| mutation::append_solver_set(course, chapter_id, set))
    }

    pub fn append_image(
        &mut self,
        chapter_id: &NodeId,
        section_id: &NodeId,
        image: GeneratedImage,
    ) -> bool {
        self.apply(|course| mutation::append_image(course, chapter_id, section_id, image))
    }

    pub fn append_exam_set(&mut self, set: ExerciseSet) -> bool {
        self.apply(|course| mutation::append_exam_set(course, set))
    }

    pub fn append_chapters(&mut self, chapters: Vec<Chapter>) -> bool {
        self.apply(|course| mutation::append_chapters(course, chapters))
    }

    pub fn remove_exercise_set(&mut self, chapter_id: &NodeId, set_id: &NodeId) -> bool {
        self.apply(|course| mutation::remove_exercise_set(course, chapter_id, set_id))
    }

    pub fn remove_solver_set(&mut self, chapter_id: &NodeId, set_id: &NodeId) -> bool {
        self.apply(|course| mutation::remove_solver_set(course, chapter_id, set_id))
    }

    pub fn remove_exam_set(&mut self, set_id: &NodeId) -> bool {
        self.apply(|course| mutation::remove_exam_set(course, set_id))
    }
}

// =============================================================================
// Lock helpers
// =============================================================================

/// Read access, recovering from a poisoned lock
pub fn read_document(doc: &SharedDocument) -> RwLockReadGuard<'_, CourseDocument> {
    doc.read().unwrap_or_else(|poisoned| {
        tracing::error!("Course document RwLock poisoned on read, recovering");
        poisoned.into_inner()
    })
}

/// Write access, recovering from a poisoned lock
pub fn write_document(doc: &SharedDocument) -> RwLockWriteGuard<'_, CourseDocument> {
    doc.write().unwrap_or_else(|poisoned| {
        tracing::error!("Course document RwLock poisoned, recovering");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> CourseDocument {
        let mut doc = CourseDocument::new();
        doc.populate(Course::new(
            "Physics",
            vec![Chapter::new("Motion", ["Velocity", "Acceleration"])],
        ));
        doc
    }

    #[test]
    fn test_lifecycle() {
        let mut doc = CourseDocument::new();
        assert!(!doc.is_populated());
        assert!(doc.course().is_none());

        doc.populate(Course::new("A", vec![Chapter::new("One", ["Intro"])]));
        assert!(doc.is_populated());
        assert_eq!(doc.course().unwrap().title, "A");

        doc.populate(Course::new("B", vec![Chapter::new("Two", ["Intro"])]));
        assert_eq!(doc.course().unwrap().title, "B");

        doc.reset();
        assert!(doc.course().is_none());
    }

    #[test]
    fn test_update_course_renames_root() {
        let mut empty = CourseDocument::new();
        assert!(!empty.update_course(|c| c.clone()));

        let mut doc = populated();
        let before = doc.revision();
        assert!(doc.update_course(|c| Course {
            title: "Mechanics".to_string(),
            ..c.clone()
        }));
        assert_eq!(doc.course().unwrap().title, "Mechanics");
        assert_eq!(doc.revision(), before + 1);
    }

    #[test]
    fn test_mutations_on_empty_document_are_noops() {
        let mut doc = CourseDocument::new();
        let id = NodeId::new();
        assert!(!doc.update_chapter(&id, |c| c.clone()));
        assert!(!doc.append_exam_set(ExerciseSet::new(None, Vec::new())));
        assert!(!doc.remove_solver_set(&id, &id));
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_revision_tracks_real_changes() {
        let mut doc = populated();
        let start = doc.revision();
        let course = doc.course().unwrap();
        let chapter_id = course.chapters[0].id.clone();
        let section_id = course.chapters[0].sections[0].id.clone();

        assert!(doc.set_section_content(&chapter_id, &section_id, "v = d/t".to_string()));
        assert_eq!(doc.revision(), start + 1);

        assert!(!doc.set_section_content(&chapter_id, &section_id, "again".to_string()));
        assert!(!doc.remove_exercise_set(&chapter_id, &NodeId::new()));
        assert_eq!(doc.revision(), start + 1);
    }

    #[test]
    fn test_old_snapshot_is_untouched_by_updates() {
        let mut doc = populated();
        let snapshot = doc.course().unwrap();
        let chapter_id = snapshot.chapters[0].id.clone();
        let section_id = snapshot.chapters[0].sections[1].id.clone();

        doc.append_image(&chapter_id, &section_id, GeneratedImage::new("AAAA", "graph"));

        assert!(snapshot.chapters[0].sections[1].images.is_empty());
        let current = doc.course().unwrap();
        assert_eq!(current.chapters[0].sections[1].images.len(), 1);
        assert!(Arc::ptr_eq(
            &snapshot.chapters[0].sections[0],
            &current.chapters[0].sections[0]
        ));
    }

    #[test]
    fn test_shared_document_helpers() {
        let shared = new_shared_document();
        write_document(&shared).populate(Course::new("Shared", vec![]));
        assert_eq!(read_document(&shared).course().unwrap().title, "Shared");
    }
}
