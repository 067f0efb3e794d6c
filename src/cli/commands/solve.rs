//! Solve Command
//!
//! One-off solver call outside any course.
//!
//! Usage:
//!   coursewright solve --text "Solve 2x + 3 = 7" [--language spanish]
//!   coursewright solve --image problem.png [--text "only part b"]

use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;

use crate::cli::{CommandContext, Output, read_image};
use crate::session::Language;
use crate::types::{CourseError, Result};

#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    pub text: Option<String>,
    pub image: Option<PathBuf>,
    pub language: Option<Language>,
}

pub fn run(options: SolveOptions, config_path: Option<&Path>, quiet: bool) -> Result<()> {
    let out = Output::quiet(quiet);

    let text = options.text.filter(|t| !t.trim().is_empty());
    // Image limits apply before any provider is built
    let image = options.image.as_deref().map(read_image).transpose()?;
    if text.is_none() && image.is_none() {
        return Err(CourseError::Validation(
            "Provide a problem with --text, --image or both".to_string(),
        ));
    }

    let ctx = CommandContext::load(config_path)?;
    let language = ctx.settings(options.language, None)?.language;

    let rt = Runtime::new()?;
    let generator = ctx.generator();
    let solution = rt.block_on(generator.solve(language, text.as_deref(), image.as_ref()))?;

    out.success("Solved");
    println!("{}", solution);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_some_input() {
        let options = SolveOptions {
            text: Some("   ".to_string()),
            ..SolveOptions::default()
        };
        assert!(matches!(
            run(options, None, true),
            Err(CourseError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_image_fails_before_any_call() {
        let options = SolveOptions {
            image: Some(PathBuf::from("/nonexistent/problem.png")),
            ..SolveOptions::default()
        };
        assert!(matches!(run(options, None, true), Err(CourseError::Io(_))));
    }
}
