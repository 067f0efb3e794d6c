//! Coursewright - AI-Assisted Course Authoring
//!
//! Builds a structured course from a single topic by driving a generative
//! model: an outline of chapters and sections, then on-demand section
//! content, exercise sets, exams, solved problems and illustrations.
//!
//! ## Quick Start
//!
//! ```ignore
//! use coursewright::{ConfigLoader, Studio, TaskOutcome, create_provider};
//!
//! let config = ConfigLoader::load()?;
//! let provider = create_provider(&config.provider_config())?;
//! let studio = Studio::new(provider, config.session_settings()?);
//!
//! studio.update_settings(|s| s.set_topic("Linear Algebra"));
//! if studio.generate_outline().await == TaskOutcome::Applied {
//!     let course = studio.course();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`course`]: Course tree, node ids and copy-on-write mutations
//! - [`session`]: Language, topic, chapter count and transient drafts
//! - [`ai`]: Providers, prompts, response parsing and the course generator
//! - [`orchestrator`]: Task tracking and the `Studio` that applies results
//! - [`export`]: Text extraction and Markdown rendering
//! - [`config`]: Figment-based configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod course;
pub mod export;
pub mod orchestrator;
pub mod session;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::error::{CourseError, ErrorCategory, LlmError, Result};

pub use ai::{CourseGenerator, LlmProvider, SharedProvider, create_provider};
pub use course::{Chapter, Course, NodeId, Section};
pub use export::{DocumentRenderer, MarkdownRenderer, PlainTextExtractor, TextExtractor};
pub use orchestrator::{Studio, TaskKind, TaskOutcome};
pub use session::{Language, SessionSettings};
