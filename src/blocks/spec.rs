//! Managed block model: markers, canonical bodies and normalization rules.

/// Opening marker shared by the PowerShell profiles and the Git Bash rc file.
///
/// Kept byte-identical to what earlier releases wrote so existing blocks are
/// still recognized.
pub const START_MARKER: &str = "# === Code-encoding-fix 配置（自动生成）开始 ===";

/// Closing marker shared by the PowerShell profiles and the Git Bash rc file.
pub const END_MARKER: &str = "# === Code-encoding-fix 配置（自动生成）结束 ===";

/// Locale written into the managed blocks when settings do not override it.
pub const DEFAULT_LOCALE: &str = "zh_CN.UTF-8";

/// Immutable description of one managed block.
///
/// # Examples
///
/// ```
/// use encfix_cli::blocks::ManagedBlockSpec;
///
/// let spec = ManagedBlockSpec::new("# begin", "# end", ["echo hi"]);
/// assert_eq!(spec.render(), "# begin\necho hi\n# end\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedBlockSpec {
    start_marker: String,
    end_marker: String,
    body: Vec<String>,
}

impl ManagedBlockSpec {
    /// Create a spec from literal marker lines and body lines.
    #[must_use]
    pub fn new<I, S>(start_marker: &str, end_marker: &str, body: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            start_marker: start_marker.to_string(),
            end_marker: end_marker.to_string(),
            body: body.into_iter().map(Into::into).collect(),
        }
    }

    /// Canonical block for Windows PowerShell 5.1 and PowerShell 7 profiles.
    #[must_use]
    pub fn powershell(locale: &str) -> Self {
        let mut body = vec![
            "chcp 65001 | Out-Null".to_string(),
            "[Console]::InputEncoding  = [System.Text.UTF8Encoding]::new()".to_string(),
            "[Console]::OutputEncoding = [System.Text.UTF8Encoding]::new()".to_string(),
            "$OutputEncoding = [System.Text.UTF8Encoding]::new()".to_string(),
        ];
        for cmdlet in [
            "Get-Content",
            "Set-Content",
            "Add-Content",
            "Out-File",
            "Select-String",
            "Import-Csv",
            "Export-Csv",
            "*",
        ] {
            let key = format!("$PSDefaultParameterValues['{cmdlet}:Encoding']");
            body.push(format!("{key:<53}= 'utf8'"));
        }
        body.push(format!("$env:LANG = \"{locale}\""));
        Self::new(START_MARKER, END_MARKER, body)
    }

    /// Canonical block for the Git Bash `~/.bashrc`.
    #[must_use]
    pub fn posix_shell(locale: &str) -> Self {
        Self::new(
            START_MARKER,
            END_MARKER,
            [
                format!("export LANG=\"{locale}\""),
                format!("export LC_ALL=\"{locale}\""),
                format!("export LC_CTYPE=\"{locale}\""),
                format!("export LC_MESSAGES=\"{locale}\""),
                "if command -v chcp >/dev/null 2>&1; then chcp 65001 >/dev/null 2>&1; fi"
                    .to_string(),
                "git config --global core.quotepath false".to_string(),
                "git config --global i18n.commitencoding utf-8".to_string(),
                "git config --global i18n.logoutputencoding utf-8".to_string(),
            ],
        )
    }

    /// The literal opening marker line.
    #[must_use]
    pub fn start_marker(&self) -> &str {
        &self.start_marker
    }

    /// The literal closing marker line.
    #[must_use]
    pub fn end_marker(&self) -> &str {
        &self.end_marker
    }

    /// Body lines written between the markers.
    #[must_use]
    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// All block lines, markers included.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.start_marker.as_str())
            .chain(self.body.iter().map(String::as_str))
            .chain(std::iter::once(self.end_marker.as_str()))
    }

    /// The block as written to disk, newline-terminated.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Whether `text` contains both markers.
    #[must_use]
    pub fn has_both_markers(&self, text: &str) -> bool {
        text.contains(&self.start_marker) && text.contains(&self.end_marker)
    }

    /// Lowercase hex SHA-256 of the rendered block.
    ///
    /// Part of the drift cache key, so a locale change invalidates cached
    /// reports.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        super::cache::fingerprint(&self.render())
    }
}

/// Normalize text for comparison.
///
/// Unifies line endings, strips trailing whitespace per line and drops
/// leading and trailing blank lines.
///
/// # Examples
///
/// ```
/// use encfix_cli::blocks::normalize;
///
/// assert_eq!(normalize("\r\n a  \r\nb\r\r\n"), vec![" a", "b"]);
/// ```
#[must_use]
pub fn normalize(text: &str) -> Vec<String> {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = unified.split('\n').map(str::trim_end).collect();
    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines
            .get(first..=last)
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn powershell_block_renders_in_canonical_order() {
        let spec = ManagedBlockSpec::powershell(DEFAULT_LOCALE);
        insta::assert_snapshot!(spec.render(), @r#"
        # === Code-encoding-fix 配置（自动生成）开始 ===
        chcp 65001 | Out-Null
        [Console]::InputEncoding  = [System.Text.UTF8Encoding]::new()
        [Console]::OutputEncoding = [System.Text.UTF8Encoding]::new()
        $OutputEncoding = [System.Text.UTF8Encoding]::new()
        $PSDefaultParameterValues['Get-Content:Encoding']    = 'utf8'
        $PSDefaultParameterValues['Set-Content:Encoding']    = 'utf8'
        $PSDefaultParameterValues['Add-Content:Encoding']    = 'utf8'
        $PSDefaultParameterValues['Out-File:Encoding']       = 'utf8'
        $PSDefaultParameterValues['Select-String:Encoding']  = 'utf8'
        $PSDefaultParameterValues['Import-Csv:Encoding']     = 'utf8'
        $PSDefaultParameterValues['Export-Csv:Encoding']     = 'utf8'
        $PSDefaultParameterValues['*:Encoding']              = 'utf8'
        $env:LANG = "zh_CN.UTF-8"
        # === Code-encoding-fix 配置（自动生成）结束 ===
        "#);
    }

    #[test]
    fn posix_block_uses_configured_locale() {
        let spec = ManagedBlockSpec::posix_shell("en_US.UTF-8");
        assert_eq!(spec.body()[0], "export LANG=\"en_US.UTF-8\"");
        assert_eq!(spec.body()[1], "export LC_ALL=\"en_US.UTF-8\"");
        assert_eq!(spec.body().len(), 8);
    }

    #[test]
    fn lines_wrap_body_in_markers() {
        let spec = ManagedBlockSpec::new("S", "E", ["a", "b"]);
        let lines: Vec<&str> = spec.lines().collect();
        assert_eq!(lines, vec!["S", "a", "b", "E"]);
    }

    #[test]
    fn fingerprint_tracks_locale() {
        let a = ManagedBlockSpec::posix_shell("zh_CN.UTF-8");
        let b = ManagedBlockSpec::posix_shell("en_US.UTF-8");
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn has_both_markers_requires_both() {
        let spec = ManagedBlockSpec::new("S!", "E!", ["x"]);
        assert!(spec.has_both_markers("S!\nx\nE!"));
        assert!(!spec.has_both_markers("S!\nx"));
        assert!(!spec.has_both_markers("x\nE!"));
    }

    #[test]
    fn normalize_handles_blank_and_empty_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("  \n\t\n\r\n").is_empty());
        assert_eq!(normalize("a\n\n b \n"), vec!["a", "", " b"]);
    }
}
