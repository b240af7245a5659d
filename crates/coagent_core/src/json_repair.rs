//! Best-effort recovery of structured JSON from free-form model output.
//!
//! Models asked for "JSON only" still wrap answers in code fences, prepend a
//! sentence, or leave trailing commas. Parsing tries progressively looser
//! candidates and gives up with the raw text wrapped as `{"content": ...}`.

use serde_json::{json, Value};

pub const RAW_CONTENT_FIELD: &str = "content";

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedOutput {
    Structured(Value),
    Raw(String),
}

impl ParsedOutput {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn into_data(self) -> Value {
        match self {
            Self::Structured(value) => value,
            Self::Raw(text) => json!({ RAW_CONTENT_FIELD: text }),
        }
    }
}

pub fn parse_model_output(raw: &str) -> ParsedOutput {
    let trimmed = raw.trim();
    let candidates = [
        Some(trimmed),
        fenced_block(trimmed),
        outermost_object(trimmed),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Some(value) = parse_structured(candidate) {
            return ParsedOutput::Structured(value);
        }
        if let Some(value) = parse_structured(&strip_trailing_commas(candidate)) {
            return ParsedOutput::Structured(value);
        }
    }

    ParsedOutput::Raw(raw.to_string())
}

// Bare strings and numbers are not useful payloads.
fn parse_structured(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let body_start = after_open.find('\n').map(|idx| idx + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn strip_trailing_commas(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = text.chars().collect();

    for (idx, &ch) in chars.iter().enumerate() {
        if in_string {
            output.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                output.push(ch);
            }
            ',' => {
                let next = chars[idx + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    output.push(ch);
                }
            }
            _ => output.push(ch),
        }
    }

    output
}
