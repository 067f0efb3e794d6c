//! Session State
//!
//! Process-wide authoring settings (language, topic, chapter count) and the
//! transient user inputs that generation tasks consume.

mod drafts;
mod language;
mod settings;

pub use drafts::{Drafts, ImageAttachment, SolverDraft};
pub use language::Language;
pub use settings::{SessionSettings, SharedSettings, validate_chapter_count};
