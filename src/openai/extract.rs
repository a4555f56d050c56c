use crate::errors::AnalysisError;
use serde_json::{Map, Value};

/// Returns the first balanced `{...}` block in `text`. Braces inside JSON
/// string literals do not count towards the nesting depth.
pub fn first_balanced_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extracts the structured payload embedded in the model's reply.
pub fn payload(text: &str) -> Result<Map<String, Value>, AnalysisError> {
    let block = first_balanced_block(text)
        .ok_or_else(|| AnalysisError::Format("no JSON object in response".to_string()))?;
    match serde_json::from_str(block)? {
        Value::Object(map) => Ok(map),
        _ => Err(AnalysisError::Format("payload is not an object".to_string())),
    }
}
