//! Course Document
//!
//! The in-memory course tree and the only ways to change it.
//!
//! ## Modules
//!
//! - `id`: Opaque node identifiers
//! - `model`: Tree entities (course, chapters, sections, sets, images)
//! - `mutation`: Copy-on-write, id-addressed updates
//! - `document`: Session-scoped owner of the single course value

pub mod document;
pub mod id;
pub mod model;
pub mod mutation;

pub use document::{
    CourseDocument, SharedDocument, new_shared_document, read_document,
    write_document,
};
pub use id::NodeId;
pub use model::{
    Chapter, Course, Exercise, ExercisePart, ExerciseSet, GeneratedImage, Section, SolverInput,
    SolverInputKind, SolverSet,
};
