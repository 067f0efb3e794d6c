//! JSON Repair Mechanism
//!
//! JSON extraction and repair for model responses.
//!
//! Handles common near-JSON output:
//! - Markdown code fence wrapping (```json ... ```)
//! - Trailing commas before `]` or `}`
//! - Missing closing braces/brackets
//! - Truncated strings
//! - JSON embedded in explanatory text

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::generation::ERROR_PREVIEW_CHARS;
use crate::types::{ErrorCategory, LlmError, Result};

// =============================================================================
// Convenience Functions
// =============================================================================

/// Cleanup pass applied before every parse: strip code fences, then strip
/// trailing commas outside string literals.
///
/// Text that is already valid JSON comes back byte-identical.
pub fn clean_json_text(raw: &str) -> String {
    let unfenced = strip_code_fences(raw);
    fix_trailing_commas(unfenced)
}

/// Extract and parse JSON from a model response
pub fn extract_json_from_response(content: &str) -> Result<Value> {
    JsonRepairer::new()
        .parse_or_repair(content)
        .map(|(value, _)| value)
}

/// Extract, repair and deserialize a model response into `T`
pub fn parse_json_response<T: DeserializeOwned>(content: &str) -> Result<T> {
    let value = extract_json_from_response(content)?;
    serde_json::from_value(value).map_err(|e| {
        LlmError::new(
            ErrorCategory::ParseError,
            format!("Response JSON has unexpected shape: {}", e),
        )
        .into()
    })
}

// =============================================================================
// JsonRepairer
// =============================================================================

/// JSON repair strategies
pub struct JsonRepairer {
    max_repair_attempts: usize,
}

impl Default for JsonRepairer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRepairer {
    pub fn new() -> Self {
        Self {
            max_repair_attempts: 2,
        }
    }

    /// Parse JSON, attempting repair if the cleaned text does not parse
    ///
    /// Returns (Value, was_repaired)
    pub fn parse_or_repair(&self, raw: &str) -> Result<(Value, bool)> {
        let cleaned = clean_json_text(raw);

        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            return Ok((value, false));
        }

        debug!("Initial JSON parse failed, attempting repair");

        for attempt in 1..=self.max_repair_attempts {
            let repaired = self.repair_attempt(&cleaned, attempt);

            if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
                warn!("JSON repaired on attempt {}", attempt);
                return Ok((value, true));
            }
        }

        if let Some(extracted) = extract_json_from_mixed(&cleaned)
            && let Ok(value) = serde_json::from_str::<Value>(&fix_trailing_commas(&extracted))
        {
            warn!("JSON extracted from mixed content");
            return Ok((value, true));
        }

        Err(LlmError::new(
            ErrorCategory::ParseError,
            format!(
                "Failed to parse or repair JSON. Content preview: {}...",
                cleaned.chars().take(ERROR_PREVIEW_CHARS).collect::<String>()
            ),
        )
        .into())
    }

    fn repair_attempt(&self, s: &str, level: usize) -> String {
        match level {
            1 => close_open_brackets(s),
            _ => {
                let stripped: String = s
                    .chars()
                    .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
                    .collect();
                close_open_brackets(&fix_truncated_strings(&stripped))
            }
        }
    }
}

// =============================================================================
// Repair passes
// =============================================================================

/// Strip a surrounding markdown code fence; unfenced text is returned untouched
fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if !trimmed.starts_with("```") {
        return s;
    }

    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Drop commas that directly precede `]` or `}` (whitespace allowed), outside strings
fn fix_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escape = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            result.push(ch);
            continue;
        }

        match ch {
            '"' => in_string = true,
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some(']') | Some('}')) {
                    continue;
                }
            }
            _ => {}
        }
        result.push(ch);
    }

    result
}

/// Close an unterminated string and any unclosed brackets, innermost first
fn close_open_brackets(s: &str) -> String {
    let mut result = s.trim_end().to_string();
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for ch in result.chars() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => stack.push('}'),
            '[' if !in_string => stack.push(']'),
            '}' | ']' if !in_string => {
                stack.pop();
            }
            _ => {}
        }
    }

    if in_string {
        result.push('"');
    }
    let trimmed_len = result.trim_end_matches([',', ' ', '\n', '\r', '\t']).len();
    result.truncate(trimmed_len);
    while let Some(closer) = stack.pop() {
        result.push(closer);
    }
    result
}

/// Close strings that run into a raw newline
fn fix_truncated_strings(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 10);
    let mut in_string = false;
    let mut escape = false;

    for ch in s.chars() {
        if escape {
            escape = false;
            result.push(ch);
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape = true;
                result.push(ch);
            }
            '"' => {
                in_string = !in_string;
                result.push(ch);
            }
            '\n' | '\r' if in_string => {
                result.push('"');
                in_string = false;
                result.push(ch);
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Extract the first balanced JSON object or array from surrounding prose
fn extract_json_from_mixed(s: &str) -> Option<String> {
    let start = s.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(s[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
