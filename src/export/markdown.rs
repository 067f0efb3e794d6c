//! Markdown course rendering
//!
//! Produces one self-contained Markdown document: section content is
//! emitted as-is (it is already Markdown with LaTeX), generated images are
//! inlined as data URLs.

use crate::course::{Chapter, Course, ExerciseSet, Section, SolverInputKind, SolverSet};
use crate::session::Language;
use crate::types::Result;

/// Solver images saved before the mime type was recorded
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Renders a course into a downloadable document
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, course: &Course, language: Language) -> Result<String>;

    /// File extension for the rendered output, without the dot
    fn file_extension(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl DocumentRenderer for MarkdownRenderer {
    fn render(&self, course: &Course, language: Language) -> Result<String> {
        let mut out = String::new();

        if language.is_rtl() {
            out.push_str("<div dir=\"rtl\">\n\n");
        }

        out.push_str(&format!("# {}\n\n", course.title));
        for (index, chapter) in course.chapters.iter().enumerate() {
            render_chapter(&mut out, index + 1, chapter);
        }

        if !course.exam_sets.is_empty() {
            out.push_str("## Exam\n\n");
            for set in &course.exam_sets {
                render_exercise_set(&mut out, set, "###");
            }
        }

        if language.is_rtl() {
            out.push_str("</div>\n");
        }

        Ok(format!("{}\n", out.trim_end()))
    }

    fn file_extension(&self) -> &'static str {
        "md"
    }
}

fn render_chapter(out: &mut String, number: usize, chapter: &Chapter) {
    out.push_str(&format!("## {}. {}\n\n", number, chapter.title));

    for section in &chapter.sections {
        render_section(out, section);
    }

    if !chapter.exercise_sets.is_empty() {
        out.push_str("### Exercises\n\n");
        for set in &chapter.exercise_sets {
            render_exercise_set(out, set, "####");
        }
    }

    if !chapter.solver_sets.is_empty() {
        out.push_str("### Solved Problems\n\n");
        for set in &chapter.solver_sets {
            render_solver_set(out, set);
        }
    }
}

fn render_section(out: &mut String, section: &Section) {
    out.push_str(&format!("### {}\n\n", section.title));

    match &section.content {
        Some(content) => {
            out.push_str(content.trim());
            out.push_str("\n\n");
        }
        None => out.push_str("_Not written yet._\n\n"),
    }

    for image in &section.images {
        out.push_str(&format!(
            "![{}](data:image/png;base64,{})\n\n",
            alt_text(&image.prompt),
            image.image_data
        ));
    }
}

fn render_exercise_set(out: &mut String, set: &ExerciseSet, heading: &str) {
    match &set.focused_idea {
        Some(focus) => out.push_str(&format!("{} Focus: {}\n\n", heading, focus)),
        None => out.push_str(&format!("{} Exercise Set\n\n", heading)),
    }

    for (i, exercise) in set.exercises.iter().enumerate() {
        out.push_str(&format!(
            "**Exercise {}.** {}\n\n",
            i + 1,
            exercise.problem.trim()
        ));
        for (j, part) in exercise.parts.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", part_label(j), part.part.trim()));
            if !part.solution.trim().is_empty() {
                out.push_str(&format!("   - *Solution:* {}\n", part.solution.trim()));
            }
        }
        out.push('\n');
    }
}

fn render_solver_set(out: &mut String, set: &SolverSet) {
    let input = &set.user_input;
    match input.kind {
        SolverInputKind::Text => {
            out.push_str(&format!("**Problem:** {}\n\n", input.content.trim()));
        }
        SolverInputKind::Image => {
            let mime = input.mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
            out.push_str(&format!(
                "**Problem:**\n\n![problem](data:{};base64,{})\n\n",
                mime, input.content
            ));
        }
    }
    out.push_str(&format!("**Solution:**\n\n{}\n\n", set.solution.trim()));
}

/// Part labels a, b, c, ... continuing with aa, ab after z
fn part_label(index: usize) -> String {
    let letter = |i: usize| char::from(b'a' + (i % 26) as u8);
    if index < 26 {
        letter(index).to_string()
    } else {
        format!("{}{}", letter(index / 26 - 1), letter(index))
    }
}

/// Image alt text must stay on one line and must not close the bracket early
fn alt_text(prompt: &str) -> String {
    prompt
        .chars()
        .map(|c| match c {
            '[' | ']' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
