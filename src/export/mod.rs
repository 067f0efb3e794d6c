//! Export and Extraction Adapters
//!
//! Two collaborator seams around the course document:
//! - `TextExtractor`: pulls plain text out of an uploaded file for topic
//!   extraction
//! - `DocumentRenderer`: turns the course tree into a downloadable document

mod extract;
mod markdown;

pub use extract::{PlainTextExtractor, TextExtractor};
pub use markdown::{DocumentRenderer, MarkdownRenderer};
