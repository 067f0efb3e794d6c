//! AI Response Validation
//!
//! Model output is asked to be JSON but routinely arrives fenced, with
//! trailing commas, truncated, or wrapped in prose. Everything parsed from a
//! model response goes through `JsonRepairer` first.

mod json_repair;

pub use json_repair::{
    JsonRepairer, clean_json_text, extract_json_from_response, parse_json_response,
};
