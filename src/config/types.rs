//! Configuration Types
//!
//! All configuration structures with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::ai::ProviderConfig;
use crate::constants::{generation, network, outline};
use crate::session::{Language, SessionSettings, validate_chapter_count};
use crate::types::{CourseError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Generative-AI provider settings
    pub llm: LlmConfig,

    /// Defaults for a new authoring session
    pub session: SessionDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            session: SessionDefaults::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `CourseError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(CourseError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(CourseError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(CourseError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        validate_chapter_count(self.session.chapter_count)
            .map_err(|e| CourseError::Config(format!("session.chapter_count: {}", e)))?;

        Ok(())
    }

    /// Provider settings for `create_provider`
    pub fn provider_config(&self) -> ProviderConfig {
        let non_blank = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
        ProviderConfig {
            provider: self.llm.provider.clone(),
            model: non_blank(&self.llm.model),
            image_model: non_blank(&self.llm.image_model),
            timeout_secs: self.llm.timeout_secs,
            temperature: self.llm.temperature,
            api_key: non_blank(&self.llm.api_key),
            api_base: non_blank(&self.llm.api_base),
            max_tokens: self.llm.max_tokens,
        }
    }

    /// Initial session settings (empty topic)
    pub fn session_settings(&self) -> Result<SessionSettings> {
        SessionSettings::new(self.session.language, self.session.chapter_count)
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: gemini, openai
    pub provider: String,

    /// Text model (provider default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Image model (provider default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_model: Option<String>,

    /// Custom endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub temperature: f32,

    pub max_tokens: usize,

    /// Credential; prefer the environment. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("image_model", &self.image_model)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            image_model: None,
            api_base: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: generation::DEFAULT_TEMPERATURE,
            max_tokens: generation::DEFAULT_MAX_TOKENS,
            api_key: None,
        }
    }
}

// =============================================================================
// Session Defaults
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub language: Language,
    pub chapter_count: u8,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            language: Language::English,
            chapter_count: outline::DEFAULT_CHAPTERS,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.session.chapter_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_ranges() {
        let mut config = Config::default();
        config.llm.temperature = 2.5;
        assert!(matches!(config.validate(), Err(CourseError::Config(_))));

        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.chapter_count = 21;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_config_drops_blank_values() {
        let mut config = Config::default();
        config.llm.model = Some("gemini-2.5-pro".to_string());
        config.llm.api_base = Some("  ".to_string());

        let provider = config.provider_config();
        assert_eq!(provider.model.as_deref(), Some("gemini-2.5-pro"));
        assert!(provider.api_base.is_none());
        assert_eq!(provider.max_tokens, 8192);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("secret-key".to_string());

        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(!toml.contains("secret-key"));
        assert!(!format!("{:?}", config).contains("secret-key"));
    }

    #[test]
    fn test_session_settings_from_defaults() {
        let mut config = Config::default();
        config.session.language = Language::French;
        config.session.chapter_count = 8;

        let settings = config.session_settings().unwrap();
        assert_eq!(settings.language, Language::French);
        assert_eq!(settings.chapter_count, 8);
        assert!(settings.topic.is_empty());
    }
}
