//! VS Code user settings: relaxed parsing, key drift and block injection.
//!
//! Unlike the shell targets, the managed keys live inside a JSON object, so
//! the block is bounded by two `//` comment lines and spliced in before the
//! closing brace.
mod drift;
mod inject;
mod jsonc;

pub use drift::{MANAGED_KEYS, analyze_settings};
pub use inject::{NoClosingBrace, inject_block};
pub use jsonc::{parse_relaxed, strip_relaxed};

/// First line of the injected block.
pub const EDITOR_START_MARKER: &str = "// Code-encoding-fix block (do not remove)";

/// Last line of the injected block.
pub const EDITOR_END_MARKER: &str = "// Code-encoding-fix block end";

/// Comment lines written inside the block by current and earlier releases.
const BLOCK_COMMENTS: [&str; 4] = [
    "// 自动猜测编码以兼容混合文件",
    "// 终端默认使用 PowerShell",
    "// VS Code 终端环境：统一 UTF-8",
    "// Visual Studio Code 终端环境：统一 UTF-8",
];

/// Content of a settings file that does not exist yet.
pub const EMPTY_SETTINGS: &str = "{\n}\n";

/// Canonical editor block for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorBlock {
    locale: String,
}

impl EditorBlock {
    /// Block exporting `locale` to the integrated terminal.
    #[must_use]
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    /// Lines of the block, indented for a top-level object, without line
    /// terminators.
    ///
    /// ```
    /// use encfix_cli::editor::EditorBlock;
    ///
    /// let lines = EditorBlock::new("en_US.UTF-8").lines();
    /// assert_eq!(lines.first().map(String::as_str), Some("    // Code-encoding-fix block (do not remove)"));
    /// assert!(lines.contains(&r#"        "LANG": "en_US.UTF-8","#.to_string()));
    /// ```
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let locale = serde_json::Value::from(self.locale.as_str()).to_string();
        vec![
            format!("    {EDITOR_START_MARKER}"),
            r#"    "files.encoding": "utf8","#.to_string(),
            format!("    {}", BLOCK_COMMENTS[0]),
            r#"    "files.autoGuessEncoding": true,"#.to_string(),
            format!("    {}", BLOCK_COMMENTS[1]),
            r#"    "terminal.integrated.defaultProfile.windows": "PowerShell","#.to_string(),
            format!("    {}", BLOCK_COMMENTS[3]),
            r#"    "terminal.integrated.env.windows": {"#.to_string(),
            format!(r#"        "LANG": {locale},"#),
            format!(r#"        "LC_ALL": {locale}"#),
            "    }".to_string(),
            format!("    {EDITOR_END_MARKER}"),
        ]
    }

    /// SHA-256 of the rendered block, used as the drift cache key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        crate::blocks::fingerprint(&self.lines().join("\n"))
    }

    /// Whether `text` carries both editor markers.
    #[must_use]
    pub fn has_both_markers(text: &str) -> bool {
        text.contains(EDITOR_START_MARKER) && text.contains(EDITOR_END_MARKER)
    }
}
