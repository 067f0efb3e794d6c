//! Prompt Builder System
//!
//! Standardized prompt construction for every generation call.
//!
//! ## Structure
//!
//! 1. **Role**: what kind of educator the model plays
//! 2. **Objectives**: numbered goals
//! 3. **Context**: ordered key/value inputs (topic, chapter, language)
//! 4. **Focus**: keeps the model on the requested node
//! 5. **Output**: the exact JSON shape expected back

use crate::session::Language;

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Context with key-value pairs, rendered in insertion order
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Focus enforcement with restrictions
    Focus {
        target: String,
        restrictions: Vec<String>,
    },
    /// Anti-patterns with good/bad examples
    AntiPatterns { bad: Vec<String>, good: Vec<String> },
    /// JSON output contract
    Output { schema: String },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add objectives section
    pub fn objectives(mut self, objectives: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.into_iter().map(String::from).collect(),
        ));
        self
    }

    /// Add a context item, appending to the existing context section if any
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let entry = (key.to_string(), value.to_string());
        let existing = self.sections.iter_mut().find_map(|section| match section {
            PromptSection::Context(ctx) => Some(ctx),
            _ => None,
        });
        match existing {
            Some(ctx) => ctx.push(entry),
            None => self.sections.push(PromptSection::Context(vec![entry])),
        }
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add text section without header
    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add focus enforcement section
    pub fn focus(mut self, target: &str, restrictions: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.into_iter().map(String::from).collect(),
        });
        self
    }

    /// Add anti-patterns section
    pub fn anti_patterns(mut self, bad: Vec<&str>, good: Vec<&str>) -> Self {
        self.sections.push(PromptSection::AntiPatterns {
            bad: bad.into_iter().map(String::from).collect(),
            good: good.into_iter().map(String::from).collect(),
        });
        self
    }

    /// Require a JSON response of the given shape
    pub fn output_json(mut self, schema: &str) -> Self {
        self.sections.push(PromptSection::Output {
            schema: schema.to_string(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(ctx) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in ctx {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Focus {
                    target,
                    restrictions,
                } => {
                    prompt.push_str("<FOCUS>\n");
                    prompt.push_str(&format!("IMPORTANT: Focus EXCLUSIVELY on: {}\n", target));
                    for restriction in restrictions {
                        prompt.push_str(&format!("- {}\n", restriction));
                    }
                    prompt.push_str("</FOCUS>\n\n");
                }
                PromptSection::AntiPatterns { bad, good } => {
                    prompt.push_str("## ANTI-PATTERNS\n\n");
                    prompt.push_str("<what_not_to_do>\n");
                    for example in bad {
                        prompt.push_str(&format!("WRONG: {}\n", example));
                    }
                    prompt.push_str("</what_not_to_do>\n\n");
                    prompt.push_str("<what_to_do>\n");
                    for example in good {
                        prompt.push_str(&format!("CORRECT: {}\n", example));
                    }
                    prompt.push_str("</what_to_do>\n\n");
                }
                PromptSection::Output { schema } => {
                    prompt.push_str("<OUTPUT>\n");
                    prompt.push_str("Respond ONLY with JSON of exactly this shape:\n");
                    prompt.push_str(&schema);
                    prompt.push_str("\n</OUTPUT>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

// =============================================================================
// Course prompts
// =============================================================================

const OUTLINE_SCHEMA: &str = r#"{
  "title": "Course title",
  "chapters": [{"title": "Chapter title", "sections": [{"title": "Section title"}]}]
}"#;

const EXERCISES_SCHEMA: &str = r#"{
  "exercises": [{
    "problem": "Problem statement",
    "parts": [{"part": "Question", "solution": "Worked solution"}]
  }]
}"#;

const TOPICS_SCHEMA: &str = r#"{"topics": ["Topic title"]}"#;

const MATH_NOTATION: &str =
    "Write mathematics in LaTeX: $...$ for inline and $$...$$ for display formulas.";

/// Prompt templates for each generation call
pub struct CoursePrompts;

impl CoursePrompts {
    pub fn outline(topic: &str, chapter_count: u8, language: Language) -> String {
        let count = chapter_count.to_string();
        PromptBuilder::new()
            .role("curriculum designer", "structuring university-level courses")
            .objectives(vec![
                "Design a coherent course outline for the topic",
                "Order chapters from foundations to advanced material",
                "Give every chapter between two and six sections",
            ])
            .context_item("Topic", topic)
            .context_item("Chapters", &count)
            .context_item("Language", language.name())
            .focus(
                topic,
                vec![
                    &format!("Produce EXACTLY {} chapters", chapter_count),
                    "Write every title in the requested language",
                    "Titles only, no descriptions or numbering",
                ],
            )
            .output_json(OUTLINE_SCHEMA)
            .build()
    }

    pub fn section_content(chapter_title: &str, section_title: &str, language: Language) -> String {
        PromptBuilder::new()
            .role("educator", "writing clear course material")
            .objectives(vec![
                "Explain the section topic thoroughly with definitions and intuition",
                "Include worked examples where they help understanding",
                "End with a short summary of the key ideas",
            ])
            .context_item("Chapter", chapter_title)
            .context_item("Section", section_title)
            .context_item("Language", language.name())
            .focus(
                section_title,
                vec![
                    "Do NOT cover other sections of the chapter",
                    "Do NOT repeat the section title as a heading",
                ],
            )
            .section(
                "Format",
                &format!("Markdown with headings, lists and tables. {}", MATH_NOTATION),
            )
            .build()
    }

    pub fn exercises(context: &str, language: Language, focus: Option<&str>) -> String {
        let mut builder = PromptBuilder::new()
            .role("educator", "writing graded exercise sets")
            .objectives(vec![
                "Write exactly 3 exercises covering the material",
                "Split every exercise into exactly 4 parts of rising difficulty",
                "Give a complete worked solution for every part",
            ])
            .context_item("Material", context)
            .context_item("Language", language.name());
        if let Some(focus) = focus {
            builder = builder.focus(focus, vec!["Every exercise must practise this idea"]);
        }
        builder
            .section("Format", MATH_NOTATION)
            .output_json(EXERCISES_SCHEMA)
            .build()
    }

    pub fn solver(language: Language, text: Option<&str>, has_image: bool) -> String {
        let mut builder = PromptBuilder::new()
            .role("tutor", "solving exercises step by step")
            .objectives(vec![
                "Restate the problem briefly",
                "Solve it step by step, justifying each step",
                "State the final answer clearly",
            ])
            .context_item("Language", language.name());
        if has_image {
            builder = builder.text("The problem is shown in the attached image.");
        }
        if let Some(text) = text {
            builder = builder.section("Problem", text);
        }
        builder
            .section("Format", &format!("Markdown. {}", MATH_NOTATION))
            .build()
    }

    pub fn topics(text: &str) -> String {
        PromptBuilder::new()
            .role("curriculum designer", "identifying teachable topics in documents")
            .objectives(vec![
                "List the main topics the document teaches",
                "Use short titles suitable as chapter names",
            ])
            .anti_patterns(
                vec!["Sentences or descriptions", "Duplicate or overlapping topics"],
                vec!["Limits of sequences", "Taylor series"],
            )
            .section("Document", text)
            .output_json(TOPICS_SCHEMA)
            .build()
    }

    pub fn image(subject: &str, focus: Option<&str>) -> String {
        let mut prompt = format!(
            "A clean educational illustration for a course section about \"{}\". \
             Diagram style on a white background, clearly labelled, no decorative text.",
            subject
        );
        if let Some(focus) = focus {
            prompt.push_str(&format!(" Emphasize: {}.", focus));
        }
        prompt
    }
}
