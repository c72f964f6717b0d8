//! Closed set of managed targets.
use std::fmt;

/// How a target is analyzed and converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A PowerShell profile script with a marker block.
    PowerShellProfile,
    /// A POSIX shell rc file with a marker block.
    PosixShellRc,
    /// The editor's JSON-with-comments user settings.
    EditorSettings,
    /// The console codepage attribute of each terminal host.
    ConsoleAttribute,
}

/// Identity of a managed target, also used as its backup record name.
///
/// # Examples
///
/// ```
/// use encfix_cli::target::TargetKey;
///
/// assert_eq!(TargetKey::GitBash.as_str(), "git_bash");
/// assert_eq!("ps7".parse::<TargetKey>(), Ok(TargetKey::Ps7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetKey {
    /// Windows PowerShell 5.1 profile.
    Ps5,
    /// PowerShell 7 profile.
    Ps7,
    /// Git Bash `~/.bashrc`.
    GitBash,
    /// VS Code user settings.
    VsCode,
    /// Console codepage of every terminal host.
    Console,
}

impl TargetKey {
    /// Every target in processing order.
    pub const ALL: [Self; 5] = [Self::Ps5, Self::Ps7, Self::GitBash, Self::VsCode, Self::Console];

    /// Stable key; doubles as the backup file stem.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ps5 => "ps5",
            Self::Ps7 => "ps7",
            Self::GitBash => "git_bash",
            Self::VsCode => "vscode",
            Self::Console => "shell_reg",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ps5 => "Windows PowerShell 5.1",
            Self::Ps7 => "PowerShell 7",
            Self::GitBash => "Git Bash",
            Self::VsCode => "VS Code",
            Self::Console => "Console codepage",
        }
    }

    /// How this target is analyzed.
    #[must_use]
    pub const fn kind(self) -> TargetKind {
        match self {
            Self::Ps5 | Self::Ps7 => TargetKind::PowerShellProfile,
            Self::GitBash => TargetKind::PosixShellRc,
            Self::VsCode => TargetKind::EditorSettings,
            Self::Console => TargetKind::ConsoleAttribute,
        }
    }

    /// Whether `filter` (a `--only`/`--skip` entry) selects this target.
    ///
    /// Matches the key, common aliases and label substrings case-insensitively.
    #[must_use]
    pub fn matches(self, filter: &str) -> bool {
        let f = filter.trim().to_lowercase();
        if f.is_empty() {
            return false;
        }
        let aliases: &[&str] = match self {
            Self::Ps5 => &["ps5", "powershell5"],
            Self::Ps7 => &["ps7", "pwsh", "powershell7"],
            Self::GitBash => &["git_bash", "bash", "git"],
            Self::VsCode => &["vscode", "code", "editor"],
            Self::Console => &["shell_reg", "console", "codepage"],
        };
        aliases.contains(&f.as_str()) || self.label().to_lowercase().contains(&f)
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TargetKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown target key '{s}'"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_are_unique_backup_names() {
        let names: HashSet<&str> = TargetKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), TargetKey::ALL.len());
    }

    #[test]
    fn from_str_round_trips_every_key() {
        for key in TargetKey::ALL {
            assert_eq!(key.as_str().parse::<TargetKey>().unwrap(), key);
        }
        assert!("posix".parse::<TargetKey>().is_err());
    }

    #[test]
    fn kinds_follow_file_format() {
        assert_eq!(TargetKey::Ps5.kind(), TargetKind::PowerShellProfile);
        assert_eq!(TargetKey::Ps7.kind(), TargetKind::PowerShellProfile);
        assert_eq!(TargetKey::GitBash.kind(), TargetKind::PosixShellRc);
        assert_eq!(TargetKey::VsCode.kind(), TargetKind::EditorSettings);
        assert_eq!(TargetKey::Console.kind(), TargetKind::ConsoleAttribute);
    }

    #[test]
    fn filters_match_aliases_and_labels() {
        assert!(TargetKey::Ps7.matches("PWSH"));
        assert!(TargetKey::GitBash.matches("bash"));
        assert!(TargetKey::Console.matches("console"));
        assert!(TargetKey::VsCode.matches("vs code"));
        assert!(TargetKey::Ps5.matches("powershell 5"));
        assert!(!TargetKey::Ps5.matches("bash"));
        assert!(!TargetKey::Ps5.matches(""));
    }
}
