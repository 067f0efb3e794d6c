//! Course Generator
//!
//! One method per generation call. Each builds its prompt, sends it through
//! the shared provider and turns the reply into model values. Replies that
//! describe tree nodes are parsed into wire structs first and materialized
//! with fresh ids; ids are never taken from model output.

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::prompt::CoursePrompts;
use super::provider::{InlineImage, LlmRequest, LlmResponse, SharedProvider};
use super::validation::parse_json_response;
use crate::course::{Chapter, Course, Exercise};
use crate::session::{ImageAttachment, Language};
use crate::types::{CourseError, Result};

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct OutlineWire {
    #[serde(default)]
    title: String,
    #[serde(default)]
    chapters: Vec<ChapterWire>,
}

#[derive(Debug, Deserialize)]
struct ChapterWire {
    #[serde(default)]
    title: String,
    #[serde(default)]
    sections: Vec<SectionWire>,
}

#[derive(Debug, Deserialize)]
struct SectionWire {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExercisesWire {
    Wrapped { exercises: Vec<Exercise> },
    Bare(Vec<Exercise>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TopicsWire {
    Wrapped { topics: Vec<String> },
    Bare(Vec<String>),
}

impl OutlineWire {
    /// Apply the outline rules and materialize the course with fresh ids.
    ///
    /// Chapters beyond `chapter_count` are dropped, as are blank section
    /// titles and chapters left without sections.
    fn into_course(self, chapter_count: u8) -> Result<Course> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CourseError::EmptyResponse("outline title"));
        }

        let chapters: Vec<Chapter> = self
            .chapters
            .into_iter()
            .take(usize::from(chapter_count))
            .filter_map(|chapter| {
                let sections: Vec<String> = chapter
                    .sections
                    .into_iter()
                    .map(|s| s.title.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                if sections.is_empty() || chapter.title.trim().is_empty() {
                    return None;
                }
                Some(Chapter::new(chapter.title.trim(), sections))
            })
            .collect();

        if chapters.is_empty() {
            return Err(CourseError::EmptyResponse("outline chapters"));
        }

        Ok(Course::new(title, chapters))
    }
}

fn clean_exercises(exercises: Vec<Exercise>) -> Vec<Exercise> {
    exercises
        .into_iter()
        .filter(|e| !e.problem.trim().is_empty())
        .map(|e| Exercise {
            problem: e.problem,
            parts: e
                .parts
                .into_iter()
                .filter(|p| !p.part.trim().is_empty())
                .collect(),
        })
        .collect()
}

// =============================================================================
// CourseGenerator
// =============================================================================

/// Typed front-end over the shared provider
#[derive(Clone)]
pub struct CourseGenerator {
    provider: SharedProvider,
}

impl CourseGenerator {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    pub async fn generate_outline(
        &self,
        topic: &str,
        chapter_count: u8,
        language: Language,
    ) -> Result<Course> {
        info!(topic, chapter_count, %language, "Generating course outline");
        let prompt = CoursePrompts::outline(topic, chapter_count, language);
        let response = self.call("outline", LlmRequest::json(prompt)).await?;
        let wire: OutlineWire = parse_json_response(&response.text)?;
        let course = wire.into_course(chapter_count)?;
        debug!(chapters = course.chapters.len(), "Outline parsed");
        Ok(course)
    }

    pub async fn generate_section_content(
        &self,
        chapter_title: &str,
        section_title: &str,
        language: Language,
    ) -> Result<String> {
        let prompt = CoursePrompts::section_content(chapter_title, section_title, language);
        let response = self.call("section_content", LlmRequest::text(prompt)).await?;
        let text = response.text.trim();
        if text.is_empty() {
            return Err(CourseError::EmptyResponse("section content"));
        }
        Ok(text.to_string())
    }

    /// Exercises for a chapter or exam context; an empty list is a valid reply
    pub async fn generate_exercise_set(
        &self,
        context: &str,
        language: Language,
        focus: Option<&str>,
    ) -> Result<Vec<Exercise>> {
        let prompt = CoursePrompts::exercises(context, language, focus);
        let response = self.call("exercises", LlmRequest::json(prompt)).await?;
        let exercises = match parse_json_response::<ExercisesWire>(&response.text)? {
            ExercisesWire::Wrapped { exercises } | ExercisesWire::Bare(exercises) => exercises,
        };
        Ok(clean_exercises(exercises))
    }

    pub async fn solve(
        &self,
        language: Language,
        text: Option<&str>,
        image: Option<&ImageAttachment>,
    ) -> Result<String> {
        if text.is_none() && image.is_none() {
            return Err(CourseError::Validation(
                "Solver needs a problem text or an image".to_string(),
            ));
        }

        let prompt = CoursePrompts::solver(language, text, image.is_some());
        let mut request = LlmRequest::text(prompt);
        if let Some(image) = image {
            request = request.with_image(InlineImage {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            });
        }

        let response = self.call("solver", request).await?;
        let solution = response.text.trim();
        if solution.is_empty() {
            return Err(CourseError::EmptyResponse("solution"));
        }
        Ok(solution.to_string())
    }

    pub async fn extract_topics(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            warn!("Topic extraction called with empty text");
            return Ok(Vec::new());
        }

        let prompt = CoursePrompts::topics(text);
        let response = self.call("topics", LlmRequest::json(prompt)).await?;
        let topics = match parse_json_response::<TopicsWire>(&response.text)? {
            TopicsWire::Wrapped { topics } | TopicsWire::Bare(topics) => topics,
        };
        Ok(topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }

    /// Generate one illustration; `Ok(None)` when the model returned no image
    pub async fn generate_image(
        &self,
        subject: &str,
        focus: Option<&str>,
    ) -> Result<Option<Vec<u8>>> {
        let prompt = CoursePrompts::image(subject, focus);
        let bytes = self.provider.generate_image(&prompt).await?;
        Ok(bytes.filter(|b| !b.is_empty()))
    }

    /// Send one request and record its usage and latency
    async fn call(&self, call: &'static str, request: LlmRequest) -> Result<LlmResponse> {
        let response = self.provider.generate(&request).await?;
        info!(
            call,
            provider = %response.metadata.provider,
            model = %response.metadata.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total(),
            latency_ms = response.timing.total_ms,
            "Model call finished"
        );
        Ok(response)
    }

    /// Prompt used for an image, recorded alongside the generated bitmap
    pub fn image_prompt(subject: &str, focus: Option<&str>) -> String {
        CoursePrompts::image(subject, focus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::{Reply, ScriptedProvider};
    use crate::types::ErrorCategory;
    use std::sync::Arc;

    fn generator(provider: ScriptedProvider) -> (CourseGenerator, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        (CourseGenerator::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_call_passes_response_through() {
        let (generator, provider) = generator(ScriptedProvider::text("Hello"));

        let response = generator.call("section_content", LlmRequest::text("Hi")).await.unwrap();

        assert_eq!(response.text, "Hello");
        assert_eq!(response.usage.total(), 0);
        assert_eq!(provider.requests()[0].prompt, "Hi");
    }

    #[tokio::test]
    async fn test_outline_two_chapters() {
        let reply = r#"```json
{"title": "Algebra", "chapters": [
  {"title": "Equations", "sections": [{"title": "Linear"}, {"title": "Quadratic"}]},
  {"title": "Functions", "sections": [{"title": "Domain"}]},
]}
```"#;
        let (generator, provider) = generator(ScriptedProvider::text(reply));

        let course = generator
            .generate_outline("Algebra", 2, Language::English)
            .await
            .unwrap();

        assert_eq!(course.title, "Algebra");
        assert_eq!(course.chapters.len(), 2);
        assert_eq!(course.chapters[0].sections.len(), 2);
        assert!(course.chapters[0].sections.iter().all(|s| s.content.is_none()));
        assert!(provider.requests()[0].json_output);
    }

    #[tokio::test]
    async fn test_outline_truncates_and_drops_empty_chapters() {
        let reply = r#"{"title": "Physics", "chapters": [
            {"title": "Empty", "sections": []},
            {"title": "Motion", "sections": [{"title": " "}, {"title": "Velocity"}]},
            {"title": "Energy", "sections": [{"title": "Work"}]},
            {"title": "Waves", "sections": [{"title": "Sound"}]}
        ]}"#;
        let (generator, _) = generator(ScriptedProvider::text(reply));

        let course = generator
            .generate_outline("Physics", 3, Language::English)
            .await
            .unwrap();

        let titles: Vec<&str> = course.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Motion", "Energy"]);
        assert_eq!(course.chapters[0].sections.len(), 1);
    }

    #[tokio::test]
    async fn test_outline_without_chapters_fails() {
        let reply = r#"{"title": "X", "chapters": []}"#;
        let (generator, _) = generator(ScriptedProvider::text(reply));
        let err = generator
            .generate_outline("X", 3, Language::English)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_outline_provider_failure() {
        let (generator, _) = generator(ScriptedProvider::failing());
        let err = generator
            .generate_outline("X", 3, Language::English)
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::RateLimit);
    }

    #[tokio::test]
    async fn test_exercise_set_shape() {
        let part = r#"{"part": "p", "solution": "s"}"#;
        let exercise = format!(r#"{{"problem": "q", "parts": [{part}, {part}, {part}, {part}]}}"#);
        let reply = format!(r#"{{"exercises": [{exercise}, {exercise}, {exercise}]}}"#);
        let (generator, provider) = generator(ScriptedProvider::text(reply));

        let exercises = generator
            .generate_exercise_set("Limits: definition", Language::English, Some("continuity"))
            .await
            .unwrap();

        assert_eq!(exercises.len(), 3);
        assert!(exercises.iter().all(|e| e.parts.len() == 4));
        assert!(provider.requests()[0].prompt.contains("continuity"));
    }

    #[tokio::test]
    async fn test_exercise_set_accepts_bare_array() {
        let (generator, _) = generator(ScriptedProvider::text(
            r#"[{"problem": "q", "parts": []}, {"problem": "  ", "parts": []}]"#,
        ));
        let exercises = generator
            .generate_exercise_set("ctx", Language::English, None)
            .await
            .unwrap();
        assert_eq!(exercises.len(), 1);
    }

    #[tokio::test]
    async fn test_section_content_empty_is_error() {
        let (generator, _) = generator(ScriptedProvider::text("   "));
        let err = generator
            .generate_section_content("Ch", "Sec", Language::English)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_solve_with_image_attaches_inline_data() {
        let (generator, provider) = generator(ScriptedProvider::text("x = 2"));
        let image = ImageAttachment {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".to_string(),
        };

        let solution = generator
            .solve(Language::English, None, Some(&image))
            .await
            .unwrap();

        assert_eq!(solution, "x = 2");
        let request = &provider.requests()[0];
        assert_eq!(request.images.len(), 1);
        assert_eq!(request.images[0].data, "AQID");
    }

    #[tokio::test]
    async fn test_solve_without_input_makes_no_call() {
        let (generator, provider) = generator(ScriptedProvider::text("unused"));
        assert!(generator.solve(Language::English, None, None).await.is_err());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_extract_topics_both_shapes() {
        let (generator, provider) = generator(ScriptedProvider::text(
            r#"{"topics": ["Limits", " ", "Series"]}"#,
        ));
        provider.push(Reply::Text(r#"["Vectors"]"#.to_string()));

        assert_eq!(
            generator.extract_topics("doc").await.unwrap(),
            vec!["Limits", "Series"]
        );
        assert_eq!(generator.extract_topics("doc").await.unwrap(), vec!["Vectors"]);
    }

    #[tokio::test]
    async fn test_generate_image() {
        let (generator, provider) = generator(ScriptedProvider::new([
            Reply::Image(Some(vec![9, 9])),
            Reply::Image(None),
        ]));

        let first = generator.generate_image("Unit circle", None).await.unwrap();
        assert_eq!(first, Some(vec![9, 9]));
        assert!(generator.generate_image("Unit circle", None).await.unwrap().is_none());
        assert_eq!(provider.image_prompts().len(), 2);
    }
}
