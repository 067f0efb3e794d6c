//! Command-line embedding
//!
//! Thin clap-facing layer over the library: each command loads
//! configuration, builds a provider and drives a [`crate::orchestrator::Studio`]
//! or a [`crate::ai::CourseGenerator`] directly.

pub mod commands;
pub mod ui;
pub mod util;

pub use ui::Output;
pub use util::{CommandContext, guess_image_mime, read_image};
