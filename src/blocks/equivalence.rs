//! Heuristics recognizing hand-written UTF-8 setups that carry no markers.
//!
//! Only consulted when a file has neither marker; once markers exist the
//! block comparison always decides.
use std::sync::LazyLock;

use regex::Regex;

/// Outcome of an equivalence heuristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equivalence {
    /// Whether the text already achieves the managed configuration.
    pub matched: bool,
    /// Which signals matched (or why not).
    pub reason: String,
}

impl Equivalence {
    fn matched(reason: impl Into<String>) -> Self {
        Self {
            matched: true,
            reason: reason.into(),
        }
    }

    fn unmatched() -> Self {
        Self {
            matched: false,
            reason: String::new(),
        }
    }
}

/// Signature shared by every per-target heuristic.
pub type EquivalenceCheck = fn(&str) -> Equivalence;

static PS_INPUT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\[console\]::\s*inputencoding\s*=\s*.*utf8"));
static PS_OUTPUT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\[console\]::\s*outputencoding\s*=\s*.*utf8"));
static PS_OUTPUT_VAR: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\$outputencoding\s*=\s*.*utf8"));
static PS_CHCP: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)(?:^|\s)chcp\s+65001\b"));
static SH_LANG: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?im)^\s*export\s+LANG\s*=\s*['"]?.*utf-?8"#));
static SH_LC_ALL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?im)^\s*export\s+LC_ALL\s*=\s*['"]?.*utf-?8"#));

/// Compile one of the literal patterns above.
#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("literal pattern compiles")
}

/// Recognize a PowerShell profile that already switches the console to UTF-8.
///
/// Requires both console encoding assignments plus at least one of the
/// default-parameter overrides, `$OutputEncoding`, or `chcp 65001`.
///
/// # Examples
///
/// ```
/// use encfix_cli::blocks::powershell_equivalent;
///
/// let profile = "[Console]::InputEncoding = [Text.UTF8Encoding]::new()\n\
///                [Console]::OutputEncoding = [Text.UTF8Encoding]::new()\n\
///                chcp 65001 > $null\n";
/// let eq = powershell_equivalent(profile);
/// assert!(eq.matched);
/// assert_eq!(eq.reason, "chcp 65001 detected");
/// ```
#[must_use]
pub fn powershell_equivalent(text: &str) -> Equivalence {
    if !(PS_INPUT.is_match(text) && PS_OUTPUT.is_match(text)) {
        return Equivalence::unmatched();
    }
    let lower = text.to_lowercase();
    let has_defaults = lower.contains("$psdefaultparametervalues")
        && lower.contains(":encoding")
        && lower.contains("utf8");

    let mut reasons = Vec::new();
    if PS_CHCP.is_match(text) {
        reasons.push("chcp 65001 detected");
    }
    if PS_OUTPUT_VAR.is_match(text) {
        reasons.push("$OutputEncoding set to UTF-8");
    }
    if has_defaults {
        reasons.push("PSDefaultParameterValues encoding overrides");
    }
    if reasons.is_empty() {
        return Equivalence::unmatched();
    }
    Equivalence::matched(reasons.join("; "))
}

/// Recognize a Git Bash rc file that already exports a UTF-8 locale.
///
/// Requires `LANG` and `LC_ALL` exports with a UTF-8 suffix plus at least one
/// git encoding option.
#[must_use]
pub fn posix_shell_equivalent(text: &str) -> Equivalence {
    let lower = text.to_lowercase();
    let has_git = ["core.quotepath", "i18n.commitencoding", "i18n.logoutputencoding"]
        .iter()
        .any(|opt| lower.contains(opt));
    if SH_LANG.is_match(text) && SH_LC_ALL.is_match(text) && has_git {
        Equivalence::matched("LANG/LC_ALL use UTF-8 and git encoding options are set")
    } else {
        Equivalence::unmatched()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const CONSOLE_LINES: &str = "[Console]::InputEncoding = [System.Text.Encoding]::UTF8\n\
                                 [Console]::OutputEncoding = [System.Text.Encoding]::UTF8\n";

    #[test]
    fn powershell_needs_both_console_assignments() {
        let only_input = "[Console]::InputEncoding = [System.Text.Encoding]::UTF8\nchcp 65001\n";
        assert!(!powershell_equivalent(only_input).matched);
    }

    #[test]
    fn powershell_needs_a_supporting_signal() {
        assert!(!powershell_equivalent(CONSOLE_LINES).matched);
    }

    #[test]
    fn powershell_reports_every_signal() {
        let text = format!(
            "{CONSOLE_LINES}$OutputEncoding = [System.Text.Encoding]::UTF8\n\
             $PSDefaultParameterValues['*:Encoding'] = 'utf8'\nchcp 65001\n"
        );
        let eq = powershell_equivalent(&text);
        assert!(eq.matched);
        assert_eq!(
            eq.reason,
            "chcp 65001 detected; $OutputEncoding set to UTF-8; PSDefaultParameterValues encoding overrides"
        );
    }

    #[test]
    fn powershell_is_case_insensitive() {
        let text = "[CONSOLE]::INPUTENCODING=[TEXT.UTF8ENCODING]::NEW()\n\
                    [console]::outputencoding = [text.utf8encoding]::new()\n\
                    $OUTPUTENCODING = [TEXT.UTF8ENCODING]::NEW()\n";
        assert!(powershell_equivalent(text).matched);
    }

    #[test]
    fn powershell_chcp_must_be_a_command() {
        let text = format!("{CONSOLE_LINES}# mychcp 65001\n");
        assert!(!powershell_equivalent(&text).matched);
    }

    #[test]
    fn posix_shell_matches_quoted_exports() {
        let text = "export LANG='en_US.UTF-8'\nexport LC_ALL=\"en_US.utf8\"\n\
                    git config --global core.quotepath false\n";
        let eq = posix_shell_equivalent(text);
        assert!(eq.matched);
        assert!(eq.reason.contains("LANG/LC_ALL"));
    }

    #[test]
    fn posix_shell_requires_git_option() {
        let text = "export LANG=en_US.UTF-8\nexport LC_ALL=en_US.UTF-8\n";
        assert!(!posix_shell_equivalent(text).matched);
    }

    #[test]
    fn posix_shell_ignores_non_utf8_locale() {
        let text = "export LANG=C\nexport LC_ALL=C\ngit config --global i18n.commitencoding utf-8\n";
        assert!(!posix_shell_equivalent(text).matched);
    }

    #[test]
    fn posix_shell_export_must_start_a_line() {
        let text = "# export LANG=en_US.UTF-8\n# export LC_ALL=en_US.UTF-8\ncore.quotepath\n";
        assert!(!posix_shell_equivalent(text).matched);
    }
}
