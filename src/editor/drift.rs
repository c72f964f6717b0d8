//! Key-level drift detection for editor settings.
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{EDITOR_END_MARKER, EDITOR_START_MARKER, jsonc::parse_relaxed};
use crate::blocks::{DriftReport, DriftState};

/// Keys owned by the editor block, in block order.
pub const MANAGED_KEYS: [&str; 4] = [
    "files.encoding",
    "files.autoGuessEncoding",
    "terminal.integrated.defaultProfile.windows",
    "terminal.integrated.env.windows",
];

pub(super) const ENV_KEY: &str = "terminal.integrated.env.windows";

/// Issues quoted in a `modified` summary before the rest are elided.
const MAX_LISTED_ISSUES: usize = 3;

static UTF8_VALUE: LazyLock<Regex> = LazyLock::new(utf8_pattern);

#[allow(clippy::expect_used)]
fn utf8_pattern() -> Regex {
    Regex::new(r"(?i)utf-?8").expect("literal pattern compiles")
}

/// Classify a settings file's managed keys.
///
/// `text` is `None` when the file does not exist.
///
/// # Examples
///
/// ```
/// use encfix_cli::blocks::DriftState;
/// use encfix_cli::editor::analyze_settings;
///
/// assert_eq!(analyze_settings(None).state, DriftState::Missing);
/// assert_eq!(analyze_settings(Some("{}")).state, DriftState::Missing);
/// assert_eq!(
///     analyze_settings(Some(r#"{"files.encoding": "gbk"}"#)).state,
///     DriftState::Modified
/// );
/// ```
#[must_use]
pub fn analyze_settings(text: Option<&str>) -> DriftReport {
    let Some(text) = text else {
        return DriftReport::new(DriftState::Missing, "configuration file does not exist");
    };
    let map = match parse_relaxed(text) {
        Ok(map) => map,
        Err(e) => return DriftReport::new(DriftState::Unreadable, format!("cannot parse: {e}")),
    };

    if text.contains(EDITOR_START_MARKER) != text.contains(EDITOR_END_MARKER) {
        return DriftReport::new(
            DriftState::Partial,
            "only one block marker present; the block was cut short",
        );
    }
    if !MANAGED_KEYS.iter().any(|k| map.contains_key(*k)) {
        return DriftReport::new(DriftState::Missing, "no managed keys present");
    }

    let issues = collect_issues(&map);
    if issues.is_empty() {
        return DriftReport::new(DriftState::Ok, "key settings match");
    }
    let mut summary = issues
        .iter()
        .take(MAX_LISTED_ISSUES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ");
    if issues.len() > MAX_LISTED_ISSUES {
        summary.push_str("; ...");
    }
    DriftReport::new(DriftState::Modified, summary)
}

fn collect_issues(map: &Map<String, Value>) -> Vec<String> {
    let mut issues = Vec::new();

    match map.get("files.encoding") {
        None => issues.push("missing `files.encoding`".to_string()),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("utf8") => {}
        Some(other) => issues.push(format!("`files.encoding` is {other}, expected \"utf8\"")),
    }

    match map.get("files.autoGuessEncoding") {
        None => issues.push("missing `files.autoGuessEncoding`".to_string()),
        Some(Value::Bool(true)) => {}
        Some(other) => issues.push(format!(
            "`files.autoGuessEncoding` is {other}, expected true"
        )),
    }

    match map.get("terminal.integrated.defaultProfile.windows") {
        None => issues.push("missing `terminal.integrated.defaultProfile.windows`".to_string()),
        Some(Value::String(s)) if s.to_ascii_lowercase().contains("powershell") => {}
        Some(other) => issues.push(format!(
            "`terminal.integrated.defaultProfile.windows` is {other}, expected PowerShell"
        )),
    }

    match map.get(ENV_KEY) {
        Some(Value::Object(env)) => {
            for var in ["LANG", "LC_ALL"] {
                let value = env.get(var);
                let ok = value
                    .and_then(Value::as_str)
                    .is_some_and(|v| UTF8_VALUE.is_match(v));
                if !ok {
                    let shown = value.map_or_else(|| "unset".to_string(), ToString::to_string);
                    issues.push(format!(
                        "`{ENV_KEY}.{var}` is {shown}, expected a UTF-8 locale"
                    ));
                }
            }
        }
        _ => issues.push(format!("missing `{ENV_KEY}`")),
    }

    issues
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::editor::{EMPTY_SETTINGS, EditorBlock, inject_block};

    const GOOD: &str = r#"{
    "files.encoding": "UTF8",
    "files.autoGuessEncoding": true,
    "terminal.integrated.defaultProfile.windows": "PowerShell 7",
    "terminal.integrated.env.windows": { "LANG": "en_US.utf8", "LC_ALL": "C.UTF-8" }
}"#;

    #[test]
    fn absent_file_is_missing() {
        let report = analyze_settings(None);
        assert_eq!(report.state, DriftState::Missing);
        assert_eq!(report.summary, "configuration file does not exist");
    }

    #[test]
    fn unparseable_file_is_unreadable() {
        let report = analyze_settings(Some("{ \"a\": "));
        assert_eq!(report.state, DriftState::Unreadable);
        assert!(report.summary.starts_with("cannot parse"));
    }

    #[test]
    fn unrelated_settings_are_missing() {
        let report = analyze_settings(Some(r#"{"editor.fontSize": 14}"#));
        assert_eq!(report.state, DriftState::Missing);
    }

    #[test]
    fn equivalent_values_are_ok() {
        let report = analyze_settings(Some(GOOD));
        assert_eq!(report.state, DriftState::Ok);
        assert_eq!(report.summary, "key settings match");
    }

    #[test]
    fn injected_block_is_ok() {
        let text = inject_block(EMPTY_SETTINGS, &EditorBlock::new("zh_CN.UTF-8")).unwrap();
        assert_eq!(analyze_settings(Some(&text)).state, DriftState::Ok);
    }

    #[test]
    fn single_marker_is_partial() {
        let text = format!("{{\n    {EDITOR_START_MARKER}\n    \"files.encoding\": \"utf8\"\n}}");
        assert_eq!(analyze_settings(Some(&text)).state, DriftState::Partial);
    }

    #[test]
    fn summary_lists_three_issues_then_elides() {
        let report = analyze_settings(Some(r#"{"files.encoding": "gbk"}"#));
        assert_eq!(report.state, DriftState::Modified);
        insta::assert_snapshot!(report.summary, @"`files.encoding` is \"gbk\", expected \"utf8\"; missing `files.autoGuessEncoding`; missing `terminal.integrated.defaultProfile.windows`; ...");
    }

    #[test]
    fn single_issue_is_not_elided() {
        let text = GOOD.replace("\"C.UTF-8\"", "\"C\"");
        let report = analyze_settings(Some(&text));
        assert_eq!(report.state, DriftState::Modified);
        assert_eq!(
            report.summary,
            "`terminal.integrated.env.windows.LC_ALL` is \"C\", expected a UTF-8 locale"
        );
    }

    #[test]
    fn non_true_auto_guess_is_reported() {
        let text = GOOD.replace(
            "\"files.autoGuessEncoding\": true",
            "\"files.autoGuessEncoding\": \"yes\"",
        );
        let report = analyze_settings(Some(&text));
        assert_eq!(
            report.summary,
            "`files.autoGuessEncoding` is \"yes\", expected true"
        );
    }
}
