pub mod error;

pub use error::{CourseError, ErrorCategory, ErrorClassifier, LlmError, Result};
