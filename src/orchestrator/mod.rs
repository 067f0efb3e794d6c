//! Generation-Task Orchestrator
//!
//! Runs generation calls against arbitrary nodes of the course tree with
//! independent busy state per task key, and applies their results as
//! targeted mutations.

mod studio;
mod task;

pub use studio::Studio;
pub use task::{TaskGuard, TaskKey, TaskKind, TaskOutcome, TaskTracker};
