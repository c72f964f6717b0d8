//! Terminal hosts whose console codepage is managed.
use std::fmt;
use std::path::{Path, PathBuf};

/// Registry-safe key for an executable path.
///
/// Drive colons are dropped; path separators and spaces become `_`.
///
/// # Examples
///
/// ```
/// use encfix_cli::console::normalize_key;
///
/// assert_eq!(
///     normalize_key(r"C:\Program Files\PowerShell\7\pwsh.exe"),
///     "C_Program_Files_PowerShell_7_pwsh.exe"
/// );
/// ```
#[must_use]
pub fn normalize_key(exe: &str) -> String {
    exe.chars()
        .filter(|&c| c != ':')
        .map(|c| if matches!(c, '\\' | '/' | ' ') { '_' } else { c })
        .collect()
}

/// One console host, identified by its normalized executable path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConsoleTarget {
    exe: PathBuf,
    key: String,
}

impl ConsoleTarget {
    /// Target for the executable at `exe`.
    #[must_use]
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        let exe = exe.into();
        let key = normalize_key(&exe.to_string_lossy());
        Self { exe, key }
    }

    /// Target known only by a recorded key (the host is no longer found).
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        Self {
            exe: PathBuf::from(key),
            key: key.to_string(),
        }
    }

    /// Executable path.
    #[must_use]
    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Normalized key used for the registry and the backup record.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Short display name (the executable's file name).
    #[must_use]
    pub fn name(&self) -> String {
        self.exe.file_name().map_or_else(
            || self.exe.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    }
}

impl fmt::Display for ConsoleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_windows_paths() {
        assert_eq!(
            normalize_key(r"C:\Windows\System32\cmd.exe"),
            "C_Windows_System32_cmd.exe"
        );
        assert_eq!(
            normalize_key(r"C:\Users\a b\AppData\Local\Microsoft\WindowsApps\wt.exe"),
            "C_Users_a_b_AppData_Local_Microsoft_WindowsApps_wt.exe"
        );
    }

    #[test]
    fn normalizes_forward_slashes() {
        assert_eq!(normalize_key("/opt/pwsh"), "_opt_pwsh");
    }

    #[test]
    fn target_exposes_key_and_name() {
        let target = ConsoleTarget::new(r"C:\Windows\System32\cmd.exe");
        assert_eq!(target.key(), "C_Windows_System32_cmd.exe");
        #[cfg(windows)]
        assert_eq!(target.name(), "cmd.exe");
        let unix = ConsoleTarget::new("/usr/bin/pwsh");
        assert_eq!(unix.to_string(), "pwsh");
    }
}
