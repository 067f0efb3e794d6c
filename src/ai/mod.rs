//! AI Integration Layer
//!
//! Provider boundary, prompt construction, response repair and the typed
//! per-call generator used by the orchestrator.

pub mod generator;
pub mod prompt;
pub mod provider;
pub mod validation;

pub use generator::CourseGenerator;
pub use prompt::{CoursePrompts, PromptBuilder, PromptSection};
pub use provider::{
    GeminiProvider, InlineImage, LlmProvider, LlmRequest, LlmResponse, OpenAiProvider,
    ProviderConfig, ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage,
    create_provider,
};
pub use validation::{JsonRepairer, clean_json_text, parse_json_response};
