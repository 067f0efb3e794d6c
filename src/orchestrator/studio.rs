//! Course Studio
//!
//! Entry point for every user-triggered generation. Each operation:
//!
//! 1. claims its task key (a second trigger on the same key is dropped)
//! 2. reads its inputs from the current tree, settings and drafts
//! 3. awaits the generator with no lock held
//! 4. applies the result as an id-addressed transform on the tree as it is
//!    when the reply lands
//!
//! Failures never escape an operation: they are logged and reported as
//! [`TaskOutcome::NoResult`]. The outline call additionally records a
//! user-facing message in [`Studio::last_error`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

use super::task::{TaskKey, TaskKind, TaskOutcome, TaskTracker};
use crate::ai::{CourseGenerator, SharedProvider};
use crate::course::{
    Chapter, Course, ExerciseSet, GeneratedImage, NodeId, SharedDocument, SolverInput, SolverSet,
    new_shared_document, read_document, write_document,
};
use crate::export::{PlainTextExtractor, TextExtractor};
use crate::session::{Drafts, Language, SessionSettings, SharedSettings};
use crate::types::CourseError;

/// Session-scoped orchestrator owning the document and all transient state
pub struct Studio {
    generator: CourseGenerator,
    document: SharedDocument,
    settings: SharedSettings,
    drafts: RwLock<Drafts>,
    tasks: TaskTracker,
    last_error: RwLock<Option<String>>,
    extractor: Arc<dyn TextExtractor>,
}

impl Studio {
    pub fn new(provider: SharedProvider, settings: SessionSettings) -> Self {
        Self {
            generator: CourseGenerator::new(provider),
            document: new_shared_document(),
            settings: Arc::new(RwLock::new(settings)),
            drafts: RwLock::new(Drafts::new()),
            tasks: TaskTracker::new(),
            last_error: RwLock::new(None),
            extractor: Arc::new(PlainTextExtractor),
        }
    }

    /// Replace the document text extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    // =========================================================================
    // State access
    // =========================================================================

    /// Current course root, if an outline has been generated
    pub fn course(&self) -> Option<Arc<Course>> {
        read_document(&self.document).course()
    }

    pub fn settings(&self) -> SessionSettings {
        read_lock(&self.settings).clone()
    }

    pub fn update_settings<R>(&self, f: impl FnOnce(&mut SessionSettings) -> R) -> R {
        f(&mut write_lock(&self.settings))
    }

    /// Snapshot of the transient inputs
    pub fn drafts(&self) -> Drafts {
        read_lock(&self.drafts).clone()
    }

    pub fn edit_drafts<R>(&self, f: impl FnOnce(&mut Drafts) -> R) -> R {
        f(&mut write_lock(&self.drafts))
    }

    /// Message of the last failed outline generation, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        read_lock(&self.last_error).clone()
    }

    pub fn is_busy(&self, kind: TaskKind) -> bool {
        self.tasks.is_busy(kind)
    }

    pub fn is_target_busy(&self, kind: TaskKind, target: &NodeId) -> bool {
        self.tasks.is_target_busy(kind, target)
    }

    fn language(&self) -> Language {
        read_lock(&self.settings).language
    }

    fn set_last_error(&self, message: Option<String>) {
        *write_lock(&self.last_error) = message;
    }

    fn failed(&self, key: &TaskKey, err: &CourseError) -> TaskOutcome {
        warn!(
            task = %key,
            category = %err.category(),
            retryable = err.is_recoverable(),
            retry_after_secs = ?err.retry_after().map(|d| d.as_secs()),
            "Generation failed: {}",
            err
        );
        TaskOutcome::NoResult
    }

    fn applied(key: &TaskKey, changed: bool) -> TaskOutcome {
        if changed {
            info!(task = %key, "Generation applied");
            TaskOutcome::Applied
        } else {
            debug!(task = %key, "Target no longer accepts the result");
            TaskOutcome::NoResult
        }
    }

    // =========================================================================
    // Outline
    // =========================================================================

    /// Generate the course outline from the current topic, chapter count and language
    #[instrument(skip(self))]
    pub async fn generate_outline(&self) -> TaskOutcome {
        let key = TaskKey::course(TaskKind::Outline);
        let Some(_guard) = self.tasks.try_begin(key.clone()) else {
            return TaskOutcome::AlreadyRunning;
        };

        let settings = self.settings();
        let topic = settings.topic.trim().to_string();
        if topic.is_empty() {
            self.set_last_error(Some("Please enter a topic for the course.".to_string()));
            return TaskOutcome::NoResult;
        }
        if let Err(e) = crate::session::validate_chapter_count(settings.chapter_count) {
            self.set_last_error(Some(e.to_string()));
            return TaskOutcome::NoResult;
        }

        let result = self
            .generator
            .generate_outline(&topic, settings.chapter_count, settings.language)
            .await;

        match result {
            Ok(course) => {
                write_document(&self.document).populate(course);
                self.edit_drafts(|drafts| drafts.clear());
                self.set_last_error(None);
                info!(task = %key, "Course outline generated");
                TaskOutcome::Applied
            }
            Err(e) => {
                self.set_last_error(Some(format!(
                    "Failed to generate the course outline: {}",
                    e
                )));
                self.failed(&key, &e)
            }
        }
    }

    // =========================================================================
    // Section content and images
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn generate_section_content(
        &self,
        chapter_id: &NodeId,
        section_id: &NodeId,
    ) -> TaskOutcome {
        let key = TaskKey::node(TaskKind::SectionContent, section_id);
        let Some(_guard) = self.tasks.try_begin(key.clone()) else {
            return TaskOutcome::AlreadyRunning;
        };

        let Some((chapter_title, section_title)) = self.course().and_then(|course| {
            let chapter = course.chapter(chapter_id)?;
            let section = chapter.section(section_id)?;
            Some((chapter.title.clone(), section.title.clone()))
        }) else {
            debug!(task = %key, "Section not found");
            return TaskOutcome::NoResult;
        };

        let result = self
            .generator
            .generate_section_content(&chapter_title, &section_title, self.language())
            .await;

        match result {
            Ok(content) => {
                let changed = write_document(&self.document).set_section_content(
                    chapter_id,
                    section_id,
                    content,
                );
                Self::applied(&key, changed)
            }
            Err(e) => self.failed(&key, &e),
        }
    }

    #[instrument(skip(self))]
    pub async fn generate_image(&self, chapter_id: &NodeId, section_id: &NodeId) -> TaskOutcome {
        let key = TaskKey::node(TaskKind::Image, section_id);
        let Some(_guard) = self.tasks.try_begin(key.clone()) else {
            return TaskOutcome::AlreadyRunning;
        };

        let Some(subject) = self
            .course()
            .and_then(|course| Some(course.section(chapter_id, section_id)?.title.clone()))
        else {
            debug!(task = %key, "Section not found");
            return TaskOutcome::NoResult;
        };
        let focus = read_lock(&self.drafts).image_focus(section_id);

        let result = self
            .generator
            .generate_image(&subject, focus.as_deref())
            .await;

        match result {
            Ok(Some(bytes)) => {
                let prompt = CourseGenerator::image_prompt(&subject, focus.as_deref());
                let image = GeneratedImage::new(STANDARD.encode(bytes), prompt);
                let changed =
                    write_document(&self.document).append_image(chapter_id, section_id, image);
                if changed {
                    self.edit_drafts(|drafts| drafts.clear_image_focus(section_id));
                }
                Self::applied(&key, changed)
            }
            Ok(None) => {
                debug!(task = %key, "Model returned no image");
                TaskOutcome::NoResult
            }
            Err(e) => self.failed(&key, &e),
        }
    }

    // =========================================================================
    // Exercises and exams
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn generate_exercises(&self, chapter_id: &NodeId) -> TaskOutcome {
        let key = TaskKey::node(TaskKind::Exercises, chapter_id);
        let Some(_guard) = self.tasks.try_begin(key.clone()) else {
            return TaskOutcome::AlreadyRunning;
        };

        let Some(context) = self
            .course()
            .and_then(|course| Some(course.chapter(chapter_id)?.exercise_context()))
        else {
            debug!(task = %key, "Chapter not found");
            return TaskOutcome::NoResult;
        };
        let focus = read_lock(&self.drafts).exercise_focus(chapter_id);

        let result = self
            .generator
            .generate_exercise_set(&context, self.language(), focus.as_deref())
            .await;

        match result {
            Ok(exercises) if exercises.is_empty() => {
                debug!(task = %key, "Model returned no exercises");
                TaskOutcome::NoResult
            }
            Ok(exercises) => {
                let set = ExerciseSet::new(focus, exercises);
                let changed = write_document(&self.document).append_exercise_set(chapter_id, set);
                if changed {
                    self.edit_drafts(|drafts| drafts.clear_exercise_focus(chapter_id));
                }
                Self::applied(&key, changed)
            }
            Err(e) => self.failed(&key, &e),
        }
    }

    #[instrument(skip(self))]
    pub async fn generate_exam(&self) -> TaskOutcome {
        let key = TaskKey::course(TaskKind::Exam);
        let Some(_guard) = self.tasks.try_begin(key.clone()) else {
            return TaskOutcome::AlreadyRunning;
        };

        let Some(context) = self.course().map(|course| course.exam_context()) else {
            debug!(task = %key, "No course to examine");
            return TaskOutcome::NoResult;
        };
        let focus = read_lock(&self.drafts).exam_focus();

        let result = self
            .generator
            .generate_exercise_set(&context, self.language(), focus.as_deref())
            .await;

        match result {
            Ok(exercises) if exercises.is_empty() => {
                debug!(task = %key, "Model returned no exam exercises");
                TaskOutcome::NoResult
            }
            Ok(exercises) => {
                let set = ExerciseSet::new(focus, exercises);
                let changed = write_document(&self.document).append_exam_set(set);
                if changed {
                    self.edit_drafts(|drafts| drafts.clear_exam_focus());
                }
                Self::applied(&key, changed)
            }
            Err(e) => self.failed(&key, &e),
        }
    }

    // =========================================================================
    // Solver
    // =========================================================================

    /// Solve the chapter's pending solver draft (text, image or both)
    #[instrument(skip(self))]
    pub async fn solve(&self, chapter_id: &NodeId) -> TaskOutcome {
        let key = TaskKey::node(TaskKind::Solver, chapter_id);
        let Some(_guard) = self.tasks.try_begin(key.clone()) else {
            return TaskOutcome::AlreadyRunning;
        };

        let chapter_exists = self
            .course()
            .is_some_and(|course| course.chapter(chapter_id).is_some());
        if !chapter_exists {
            debug!(task = %key, "Chapter not found");
            return TaskOutcome::NoResult;
        }
        let Some(draft) = read_lock(&self.drafts).solver(chapter_id) else {
            debug!(task = %key, "Nothing to solve");
            return TaskOutcome::NoResult;
        };

        let result = self
            .generator
            .solve(self.language(), draft.text.as_deref(), draft.image.as_ref())
            .await;

        match result {
            Ok(solution) => {
                let user_input = match (&draft.image, &draft.text) {
                    (Some(image), _) => {
                        SolverInput::image(image.to_base64(), image.mime_type.as_str())
                    }
                    (None, text) => SolverInput::text(text.clone().unwrap_or_default()),
                };
                let set = SolverSet::new(user_input, solution);
                let changed = write_document(&self.document).append_solver_set(chapter_id, set);
                if changed {
                    self.edit_drafts(|drafts| drafts.clear_solver(chapter_id));
                }
                Self::applied(&key, changed)
            }
            Err(e) => self.failed(&key, &e),
        }
    }

    // =========================================================================
    // Topic extraction
    // =========================================================================

    /// Extract topics from pasted text and append one chapter per topic
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn extract_topics(&self, text: &str) -> TaskOutcome {
        let key = TaskKey::course(TaskKind::TopicExtraction);
        let Some(_guard) = self.tasks.try_begin(key.clone()) else {
            return TaskOutcome::AlreadyRunning;
        };
        self.extract_and_append(&key, text).await
    }

    /// Read a document with the configured extractor, then extract topics from it
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn extract_topics_from_document(&self, path: &Path) -> TaskOutcome {
        let key = TaskKey::course(TaskKind::DocumentExtraction);
        let Some(_guard) = self.tasks.try_begin(key.clone()) else {
            return TaskOutcome::AlreadyRunning;
        };

        let text = match self.extractor.extract_text(path) {
            Ok(text) => text,
            Err(e) => return self.failed(&key, &e),
        };
        self.extract_and_append(&key, &text).await
    }

    async fn extract_and_append(&self, key: &TaskKey, text: &str) -> TaskOutcome {
        if !read_document(&self.document).is_populated() {
            debug!(task = %key, "Topics need an existing course");
            return TaskOutcome::NoResult;
        }

        let topics = match self.generator.extract_topics(text).await {
            Ok(topics) if topics.is_empty() => {
                debug!(task = %key, "No topics found");
                return TaskOutcome::NoResult;
            }
            Ok(topics) => topics,
            Err(e) => return self.failed(key, &e),
        };

        let chapters: Vec<Chapter> = topics
            .into_iter()
            .map(|topic| Chapter::new(topic.clone(), [topic]))
            .collect();
        let changed = write_document(&self.document).append_chapters(chapters);
        Self::applied(key, changed)
    }

    // =========================================================================
    // Direct edits
    // =========================================================================

    pub fn remove_exercise_set(&self, chapter_id: &NodeId, set_id: &NodeId) -> bool {
        write_document(&self.document).remove_exercise_set(chapter_id, set_id)
    }

    pub fn remove_solver_set(&self, chapter_id: &NodeId, set_id: &NodeId) -> bool {
        write_document(&self.document).remove_solver_set(chapter_id, set_id)
    }

    pub fn remove_exam_set(&self, set_id: &NodeId) -> bool {
        write_document(&self.document).remove_exam_set(set_id)
    }

    /// Discard the course, the error message and every draft
    pub fn reset(&self) {
        write_document(&self.document).reset();
        self.set_last_error(None);
        self.edit_drafts(|drafts| drafts.clear());
        info!("Studio reset");
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| {
        tracing::error!("Studio RwLock poisoned on read, recovering");
        poisoned.into_inner()
    })
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| {
        tracing::error!("Studio RwLock poisoned, recovering");
        poisoned.into_inner()
    })
}
