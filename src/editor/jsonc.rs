//! Relaxed parsing of JSON-with-comments settings files.
use std::fmt::Write;

use serde_json::{Map, Value};

/// Remove comments and trailing commas outside strings, then drop control
/// characters other than tab, carriage return and newline.
///
/// # Examples
///
/// ```
/// use encfix_cli::editor::strip_relaxed;
///
/// let text = "{\n  // note\n  \"a\": \"http://x\", /* b */\n}";
/// assert_eq!(strip_relaxed(text), "{\n  \n  \"a\": \"http://x\" \n}");
/// ```
#[must_use]
pub fn strip_relaxed(text: &str) -> String {
    let without_comments = strip_comments(text);
    let without_commas = strip_trailing_commas(&without_comments);
    without_commas
        .chars()
        .filter(|&c| !is_stray_control(c))
        .collect()
}

/// Parse `text` as a settings object, tolerating comments, trailing commas
/// and raw control characters inside strings.
///
/// # Errors
///
/// Returns the parser message when the text is not a JSON object even after
/// relaxation.
pub fn parse_relaxed(text: &str) -> Result<Map<String, Value>, String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let value = serde_json::from_str::<Value>(text)
        .or_else(|_| serde_json::from_str(&strip_relaxed(text)))
        .or_else(|_| serde_json::from_str(&escape_string_controls(&strip_relaxed(text))))
        .map_err(|e| e.to_string())?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected an object, found {}", kind(&other))),
    }
}

const fn is_stray_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}')
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Drop `//` and `/* */` comments that are not inside a string. A line
/// comment keeps its terminating newline.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_str = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_str {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_str = false;
            }
            continue;
        }
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => {
                if c == '"' {
                    in_str = true;
                }
                out.push(c);
            }
        }
    }
    out
}

/// Remove a comma that is followed only by whitespace and then `}` or `]`.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_str = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_str {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_str = false;
            }
        } else if c == '"' {
            in_str = true;
        } else if c == ',' {
            let rest = text.get(i + 1..).unwrap_or_default();
            if matches!(rest.trim_start().chars().next(), Some('}' | ']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Escape raw control characters that appear inside strings.
fn escape_string_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_str = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_str && !escaped && u32::from(c) < 0x20 {
            let _ = write!(out, "\\u{:04x}", u32::from(c));
            continue;
        }
        if in_str {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_str = false;
            }
        } else if c == '"' {
            in_str = true;
        }
        out.push(c);
    }
    out
}
