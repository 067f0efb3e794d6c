//! Generate Command
//!
//! Builds a whole course in one run: outline first, then the optional steps
//! in order. Each step fans out over its targets with at most
//! `MAX_CONCURRENT_TASKS` requests in flight; a failed target is skipped and
//! reported in the step tally.
//!
//! Usage:
//!   coursewright generate --topic "Linear Algebra" [--chapters 6] [--language french]
//!                         [--fill] [--exercises] [--exam] [--images] [--output course.md]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::runtime::Runtime;

use crate::cli::{CommandContext, Output};
use crate::constants::generation::MAX_CONCURRENT_TASKS;
use crate::course::{Course, NodeId};
use crate::export::{DocumentRenderer, MarkdownRenderer};
use crate::orchestrator::{Studio, TaskOutcome};
use crate::session::Language;
use crate::types::{CourseError, Result};

/// Generate run options (consolidated parameters)
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub topic: String,
    pub chapters: Option<u8>,
    pub language: Option<Language>,
    /// Write every section
    pub fill: bool,
    /// One exercise set per chapter
    pub exercises: bool,
    pub exam: bool,
    /// One image per section
    pub images: bool,
    /// Markdown destination; stdout when unset
    pub output: Option<PathBuf>,
}

pub fn run(options: GenerateOptions, config_path: Option<&Path>, quiet: bool) -> Result<()> {
    let out = Output::quiet(quiet);
    let ctx = CommandContext::load(config_path)?;
    let settings = ctx.settings(options.language, options.chapters)?;
    let language = settings.language;
    let studio = ctx.studio(settings);

    let rt = Runtime::new()?;
    let course = rt.block_on(build_course(&studio, &options, &out))?;

    let renderer = MarkdownRenderer;
    let rendered = renderer.render(&course, language)?;
    match &options.output {
        Some(path) => {
            let path = output_path(path, &renderer);
            std::fs::write(&path, rendered)?;
            out.success(&format!("Course written to {}", path.display()));
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Destination file; a path without an extension takes the renderer's
fn output_path(path: &Path, renderer: &dyn DocumentRenderer) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(renderer.file_extension())
    }
}

/// Run the outline and every requested step; returns the final course
pub async fn build_course(
    studio: &Studio,
    options: &GenerateOptions,
    out: &Output,
) -> Result<Arc<Course>> {
    studio.update_settings(|settings| settings.set_topic(options.topic.as_str()));

    out.header(&format!("Generating course: {}", options.topic.trim()));
    if studio.generate_outline().await != TaskOutcome::Applied {
        let message = studio
            .last_error()
            .unwrap_or_else(|| "Failed to generate the course outline".to_string());
        out.error(&message);
        return Err(CourseError::Generation(message));
    }
    let course = studio.course().ok_or(CourseError::NoCourse)?;
    out.success(&format!(
        "Outline: {} ({} chapters)",
        course.title,
        course.chapters.len()
    ));

    let sections: Vec<(NodeId, NodeId)> = course
        .chapters
        .iter()
        .flat_map(|chapter| {
            chapter
                .sections
                .iter()
                .map(|section| (chapter.id.clone(), section.id.clone()))
        })
        .collect();
    let chapters: Vec<NodeId> = course.chapters.iter().map(|c| c.id.clone()).collect();

    if options.fill {
        let outcomes: Vec<TaskOutcome> = stream::iter(&sections)
            .map(|(chapter, section)| studio.generate_section_content(chapter, section))
            .buffer_unordered(MAX_CONCURRENT_TASKS)
            .collect()
            .await;
        out.tally("Sections written", applied(&outcomes), sections.len());
    }

    if options.exercises {
        let outcomes: Vec<TaskOutcome> = stream::iter(&chapters)
            .map(|chapter| studio.generate_exercises(chapter))
            .buffer_unordered(MAX_CONCURRENT_TASKS)
            .collect()
            .await;
        out.tally("Exercise sets", applied(&outcomes), chapters.len());
    }

    if options.exam {
        let outcome = studio.generate_exam().await;
        out.tally("Exam", usize::from(outcome.is_applied()), 1);
    }

    if options.images {
        let outcomes: Vec<TaskOutcome> = stream::iter(&sections)
            .map(|(chapter, section)| studio.generate_image(chapter, section))
            .buffer_unordered(MAX_CONCURRENT_TASKS)
            .collect()
            .await;
        out.tally("Images", applied(&outcomes), sections.len());
    }

    studio.course().ok_or(CourseError::NoCourse)
}

fn applied(outcomes: &[TaskOutcome]) -> usize {
    outcomes.iter().filter(|o| o.is_applied()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::{Reply, ScriptedProvider};
    use crate::ai::provider::{LlmProvider, LlmRequest, LlmResponse};
    use crate::session::SessionSettings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const OUTLINE: &str = r#"{"title": "Optics", "chapters": [
        {"title": "Reflection", "sections": [{"title": "Mirrors"}]},
        {"title": "Refraction", "sections": [{"title": "Snell's law"}]}
    ]}"#;

    const EXERCISES: &str = r#"{"exercises": [
        {"problem": "Trace the ray", "parts": [{"part": "a", "solution": "b"}]}
    ]}"#;

    fn studio(replies: Vec<Reply>) -> Studio {
        let mut settings = SessionSettings::default();
        settings.set_chapter_count(2).unwrap();
        Studio::new(Arc::new(ScriptedProvider::new(replies)), settings)
    }

    fn options() -> GenerateOptions {
        GenerateOptions {
            topic: "Optics".to_string(),
            ..GenerateOptions::default()
        }
    }

    #[tokio::test]
    async fn test_outline_only() {
        let studio = studio(vec![Reply::Text(OUTLINE.into())]);
        let course = build_course(&studio, &options(), &Output::quiet(true))
            .await
            .unwrap();

        assert_eq!(course.title, "Optics");
        assert_eq!(course.chapters.len(), 2);
        assert!(course.chapters[0].sections[0].content.is_none());
    }

    #[tokio::test]
    async fn test_outline_failure_is_error() {
        let studio = studio(vec![Reply::Text("no outline here".into())]);
        let err = build_course(&studio, &options(), &Output::quiet(true))
            .await
            .unwrap_err();

        assert!(matches!(err, CourseError::Generation(_)));
        assert!(err.to_string().starts_with("Failed to generate the course outline"));
    }

    #[tokio::test]
    async fn test_all_steps() {
        let studio = studio(vec![
            Reply::Text(OUTLINE.into()),
            Reply::Text("Angle in equals angle out.".into()),
            Reply::Text("n1 sin a = n2 sin b".into()),
            Reply::Text(EXERCISES.into()),
            Reply::Text(EXERCISES.into()),
            Reply::Text(EXERCISES.into()),
        ]);
        let opts = GenerateOptions {
            fill: true,
            exercises: true,
            exam: true,
            ..options()
        };

        let course = build_course(&studio, &opts, &Output::quiet(true))
            .await
            .unwrap();

        assert!(course.chapters.iter().all(|c| c.sections[0].content.is_some()));
        assert!(course.chapters.iter().all(|c| c.exercise_sets.len() == 1));
        assert_eq!(course.exam_sets.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_step_is_skipped() {
        let studio = studio(vec![
            Reply::Text(OUTLINE.into()),
            Reply::Image(Some(vec![1, 2, 3])),
            Reply::Image(None),
        ]);
        let opts = GenerateOptions {
            images: true,
            ..options()
        };

        let course = build_course(&studio, &opts, &Output::quiet(true))
            .await
            .unwrap();

        let images: usize = course
            .chapters
            .iter()
            .map(|c| c.sections[0].images.len())
            .sum();
        assert_eq!(images, 1);
    }

    /// Serves a wide outline and records how many text calls overlap
    struct CountingProvider {
        outline: String,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CountingProvider {
        fn new(chapters: usize, sections: usize) -> Self {
            let chapters: Vec<serde_json::Value> = (0..chapters)
                .map(|c| {
                    let sections: Vec<serde_json::Value> = (0..sections)
                        .map(|s| serde_json::json!({ "title": format!("Section {}.{}", c, s) }))
                        .collect();
                    serde_json::json!({ "title": format!("Chapter {}", c), "sections": sections })
                })
                .collect();
            Self {
                outline: serde_json::json!({ "title": "Optics", "chapters": chapters }).to_string(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
            if request.json_output {
                return Ok(LlmResponse::text_only(self.outline.clone()));
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(LlmResponse::text_only("Light bends."))
        }

        async fn generate_image(&self, _prompt: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn model(&self) -> &str {
            "counting-model"
        }
    }

    #[tokio::test]
    async fn test_fill_respects_concurrency_limit() {
        let provider = Arc::new(CountingProvider::new(12, 5));
        let mut settings = SessionSettings::default();
        settings.set_chapter_count(12).unwrap();
        let studio = Studio::new(provider.clone(), settings);
        let opts = GenerateOptions {
            fill: true,
            ..options()
        };

        let course = build_course(&studio, &opts, &Output::quiet(true))
            .await
            .unwrap();

        let filled = course
            .chapters
            .iter()
            .flat_map(|c| c.sections.iter())
            .filter(|s| s.content.is_some())
            .count();
        assert_eq!(filled, 60);
        let peak = provider.peak.load(Ordering::SeqCst);
        assert!((1..=MAX_CONCURRENT_TASKS).contains(&peak), "peak was {}", peak);
    }

    #[test]
    fn test_output_path_extension() {
        assert_eq!(
            output_path(Path::new("course"), &MarkdownRenderer),
            PathBuf::from("course.md")
        );
        assert_eq!(
            output_path(Path::new("out/course.txt"), &MarkdownRenderer),
            PathBuf::from("out/course.txt")
        );
    }
}
