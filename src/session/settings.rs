//! Topic and chapter-count selection
//!
//! Mutated only by direct user input; read by every generation call.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::language::Language;
use crate::constants::outline::{DEFAULT_CHAPTERS, MAX_CHAPTERS, MIN_CHAPTERS};
use crate::types::{CourseError, Result};

/// Settings consumed by every generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub language: Language,
    pub topic: String,
    pub chapter_count: u8,
}

pub type SharedSettings = Arc<RwLock<SessionSettings>>;

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            language: Language::English,
            topic: String::new(),
            chapter_count: DEFAULT_CHAPTERS,
        }
    }
}

impl SessionSettings {
    pub fn new(language: Language, chapter_count: u8) -> Result<Self> {
        validate_chapter_count(chapter_count)?;
        Ok(Self {
            language,
            chapter_count,
            ..Self::default()
        })
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    /// Set the chapter count; values outside 1..=20 are rejected and the old value kept
    pub fn set_chapter_count(&mut self, count: u8) -> Result<()> {
        validate_chapter_count(count)?;
        self.chapter_count = count;
        Ok(())
    }
}

pub fn validate_chapter_count(count: u8) -> Result<()> {
    if !(MIN_CHAPTERS..=MAX_CHAPTERS).contains(&count) {
        return Err(CourseError::Validation(format!(
            "Chapter count must be between {} and {}, got {}",
            MIN_CHAPTERS, MAX_CHAPTERS, count
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SessionSettings::default();
        assert_eq!(settings.language, Language::English);
        assert_eq!(settings.topic, "");
        assert_eq!(settings.chapter_count, 5);
    }

    #[test]
    fn test_chapter_count_bounds() {
        let mut settings = SessionSettings::default();
        assert!(settings.set_chapter_count(0).is_err());
        assert!(settings.set_chapter_count(21).is_err());
        assert_eq!(settings.chapter_count, 5);

        settings.set_chapter_count(20).unwrap();
        assert_eq!(settings.chapter_count, 20);
        settings.set_chapter_count(1).unwrap();
        assert_eq!(settings.chapter_count, 1);
    }

    #[test]
    fn test_new_validates() {
        assert!(SessionSettings::new(Language::German, 0).is_err());
        let settings = SessionSettings::new(Language::German, 8).unwrap();
        assert_eq!(settings.language, Language::German);
        assert_eq!(settings.chapter_count, 8);
    }
}
