//! Splice the editor block into a settings file while keeping every
//! unrelated key, comment and line ending.
use super::drift::ENV_KEY;
use super::{BLOCK_COMMENTS, EDITOR_END_MARKER, EDITOR_START_MARKER, EditorBlock, MANAGED_KEYS};

/// The settings text has no closing brace to insert before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("settings file has no closing brace")]
pub struct NoClosingBrace;

/// Rewrite `raw` so it carries exactly one current editor block.
///
/// Earlier blocks, orphaned block comments and earlier occurrences of the
/// managed keys are removed first; the block is then inserted before the
/// last line containing `}`.
///
/// # Errors
///
/// Returns [`NoClosingBrace`] when no line contains `}`; nothing should be
/// written in that case.
///
/// # Examples
///
/// ```
/// use encfix_cli::editor::{EditorBlock, inject_block};
///
/// let out = inject_block("{\n    \"editor.fontSize\": 14\n}\n", &EditorBlock::new("C.UTF-8")).unwrap();
/// assert!(out.starts_with("{\n    \"editor.fontSize\": 14,\n    // Code-encoding-fix block"));
/// assert!(out.ends_with("block end\n}\n"));
/// ```
pub fn inject_block(raw: &str, block: &EditorBlock) -> Result<String, NoClosingBrace> {
    let newline = if raw.contains("\r\n") { "\r\n" } else { "\n" };

    let lines = drop_complete_blocks(raw.split_inclusive('\n').collect());
    let lines: Vec<&str> = lines
        .into_iter()
        .filter(|l| !is_orphan_comment(l.trim()))
        .collect();
    let mut lines: Vec<String> = drop_managed_keys(lines)
        .into_iter()
        .map(str::to_string)
        .collect();

    let closing = lines
        .iter()
        .rposition(|l| l.contains('}'))
        .ok_or(NoClosingBrace)?;
    let closing = split_closing_line(&mut lines, closing, newline);
    add_separator_comma(&mut lines, closing);

    let rendered = block.lines().into_iter().map(|l| l + newline);
    lines.splice(closing..closing, rendered);
    Ok(lines.concat())
}

fn is_orphan_comment(trimmed: &str) -> bool {
    trimmed == EDITOR_START_MARKER || trimmed == EDITOR_END_MARKER || BLOCK_COMMENTS.contains(&trimmed)
}

/// Drop every start…end span. A start marker with no end after it is kept
/// for the orphan pass.
fn drop_complete_blocks(lines: Vec<&str>) -> Vec<&str> {
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;
    while let Some(line) = lines.get(i) {
        if line.contains(EDITOR_START_MARKER)
            && let Some(offset) = lines
                .iter()
                .skip(i + 1)
                .position(|l| l.contains(EDITOR_END_MARKER))
        {
            i += offset + 2;
            continue;
        }
        out.push(*line);
        i += 1;
    }
    out
}

/// Drop lines carrying one of the managed keys, including the full body of
/// a multi-line env object.
fn drop_managed_keys(lines: Vec<&str>) -> Vec<&str> {
    let quoted = |k: &str| format!("\"{k}\"");
    let env_key = quoted(ENV_KEY);
    let scalar_keys: Vec<String> = MANAGED_KEYS
        .iter()
        .filter(|k| **k != ENV_KEY)
        .map(|k| quoted(k))
        .collect();

    let mut out = Vec::with_capacity(lines.len());
    let mut depth: Option<i64> = None;
    for line in lines {
        if let Some(d) = depth.as_mut() {
            *d += brace_delta(line);
            if *d <= 0 {
                depth = None;
            }
            continue;
        }
        if scalar_keys.iter().any(|k| line.contains(k.as_str())) {
            continue;
        }
        if line.contains(env_key.as_str()) {
            let d = brace_delta(line);
            if d > 0 {
                depth = Some(d);
            }
            continue;
        }
        out.push(line);
    }
    out
}

fn brace_delta(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// When the closing line also holds content before its last `}` (as in
/// `{}`), split that content onto its own line. Returns the index of the
/// line that now starts with the closing brace.
fn split_closing_line(lines: &mut Vec<String>, idx: usize, newline: &str) -> usize {
    let Some(line) = lines.get(idx) else {
        return idx;
    };
    let Some(pos) = line.rfind('}') else {
        return idx;
    };
    let (head, tail) = line.split_at(pos);
    if head.trim().is_empty() {
        return idx;
    }
    let head = format!("{}{newline}", head.trim_end());
    let tail = tail.to_string();
    lines.splice(idx..=idx, [head, tail]);
    idx + 1
}

/// Ensure the last value before `closing` ends with a comma so the block
/// can follow it. Blank and `//` lines are skipped.
fn add_separator_comma(lines: &mut [String], closing: usize) {
    let Some(line) = lines.iter_mut().take(closing).rev().find(|l| {
        let t = l.trim();
        !t.is_empty() && !t.starts_with("//")
    })
    else {
        return;
    };
    let t = line.trim();
    if t.ends_with(',') || t == "{" || t == "[" {
        return;
    }
    let body_len = line.trim_end().len();
    let ending = line.get(body_len..).unwrap_or_default().to_string();
    line.truncate(body_len);
    line.push(',');
    line.push_str(&ending);
}
