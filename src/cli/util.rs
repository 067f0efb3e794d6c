//! CLI Common Utilities
//!
//! Shared initialization for command handlers: configuration, the provider
//! built from it, and the session settings after command-line overrides.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::ai::{CourseGenerator, SharedProvider, create_provider};
use crate::config::{Config, ConfigLoader};
use crate::constants::input::MAX_IMAGE_BYTES;
use crate::orchestrator::Studio;
use crate::session::{ImageAttachment, Language, SessionSettings, SolverDraft};
use crate::types::{CourseError, Result};

/// Command execution context
///
/// Created via `CommandContext::load()` by every command that talks to a model.
#[derive(Clone)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Provider built from `config.llm`
    pub provider: SharedProvider,
}

impl CommandContext {
    /// Load configuration (with an optional explicit file) and create the provider
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = ConfigLoader::load_with(config_path)?;
        let provider = create_provider(&config.provider_config())?;
        info!("Using LLM provider: {} ({})", provider.name(), provider.model());
        Ok(Self { config, provider })
    }

    /// Session settings from configuration, with command-line overrides applied
    pub fn settings(
        &self,
        language: Option<Language>,
        chapters: Option<u8>,
    ) -> Result<SessionSettings> {
        session_settings(&self.config, language, chapters)
    }

    pub fn studio(&self, settings: SessionSettings) -> Studio {
        Studio::new(Arc::clone(&self.provider), settings)
    }

    pub fn generator(&self) -> CourseGenerator {
        CourseGenerator::new(Arc::clone(&self.provider))
    }
}

pub(crate) fn session_settings(
    config: &Config,
    language: Option<Language>,
    chapters: Option<u8>,
) -> Result<SessionSettings> {
    let mut settings = config.session_settings()?;
    if let Some(language) = language {
        settings.set_language(language);
    }
    if let Some(count) = chapters {
        settings.set_chapter_count(count)?;
    }
    Ok(settings)
}

/// Mime type of a problem image, from its extension
pub fn guess_image_mime(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => Ok("image/png"),
        Some("jpg" | "jpeg") => Ok("image/jpeg"),
        Some("webp") => Ok("image/webp"),
        Some("gif") => Ok("image/gif"),
        Some("heic") => Ok("image/heic"),
        _ => Err(CourseError::Validation(format!(
            "Unsupported image type: {} (expected png, jpg, webp, gif or heic)",
            path.display()
        ))),
    }
}

/// Read a problem image, rejecting oversized files before loading them
pub fn read_image(path: &Path) -> Result<ImageAttachment> {
    let mime_type = guess_image_mime(path)?;

    let size = std::fs::metadata(path)?.len();
    if size > MAX_IMAGE_BYTES as u64 {
        return Err(CourseError::ImageTooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            limit: MAX_IMAGE_BYTES,
        });
    }

    let mut draft = SolverDraft::default();
    draft.attach_image(std::fs::read(path)?, mime_type)?;
    draft
        .image
        .ok_or_else(|| CourseError::Validation("Image could not be attached".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_guess_image_mime() {
        assert_eq!(guess_image_mime(Path::new("a.PNG")).unwrap(), "image/png");
        assert_eq!(guess_image_mime(Path::new("b.jpeg")).unwrap(), "image/jpeg");
        assert!(guess_image_mime(Path::new("c.bmp")).is_err());
        assert!(guess_image_mime(Path::new("noext")).is_err());
    }

    #[test]
    fn test_read_image_limits() {
        let dir = TempDir::new().unwrap();

        let small = dir.path().join("problem.png");
        std::fs::write(&small, [0x89, b'P', b'N', b'G']).unwrap();
        let image = read_image(&small).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes.len(), 4);

        let large = dir.path().join("huge.jpg");
        std::fs::write(&large, vec![0u8; MAX_IMAGE_BYTES + 1]).unwrap();
        assert!(matches!(
            read_image(&large),
            Err(CourseError::ImageTooLarge { .. })
        ));
    }

    #[test]
    fn test_settings_overrides() {
        let config = Config::default();

        let settings = session_settings(&config, None, None).unwrap();
        assert_eq!(settings.language, Language::English);
        assert_eq!(settings.chapter_count, 5);

        let settings = session_settings(&config, Some(Language::Arabic), Some(9)).unwrap();
        assert_eq!(settings.language, Language::Arabic);
        assert_eq!(settings.chapter_count, 9);

        assert!(session_settings(&config, None, Some(0)).is_err());
    }
}
