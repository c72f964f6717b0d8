//! User settings (`settings.toml`) and resolved locations.
pub mod paths;
pub mod toml_loader;
pub mod validation;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::blocks::{DEFAULT_CACHE_CAPACITY, DEFAULT_LOCALE};
use crate::error::ConfigError;

pub use paths::{Environment, TargetPaths};
pub use validation::ValidationWarning;

/// Per-target path overrides from the `[paths]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PathOverrides {
    /// Windows PowerShell 5.1 profile.
    pub ps5_profile: Option<PathBuf>,
    /// PowerShell 7 profile.
    pub ps7_profile: Option<PathBuf>,
    /// Git Bash rc file.
    pub bashrc: Option<PathBuf>,
    /// VS Code `settings.json`.
    pub vscode_settings: Option<PathBuf>,
    /// `powershell.exe`.
    pub ps5_exe: Option<PathBuf>,
    /// `pwsh.exe`.
    pub ps7_exe: Option<PathBuf>,
    /// Git Bash `bash.exe`.
    pub bash_exe: Option<PathBuf>,
}

impl PathOverrides {
    /// Every override with its key name.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, Option<&Path>); 7] {
        [
            ("ps5_profile", self.ps5_profile.as_deref()),
            ("ps7_profile", self.ps7_profile.as_deref()),
            ("bashrc", self.bashrc.as_deref()),
            ("vscode_settings", self.vscode_settings.as_deref()),
            ("ps5_exe", self.ps5_exe.as_deref()),
            ("ps7_exe", self.ps7_exe.as_deref()),
            ("bash_exe", self.bash_exe.as_deref()),
        ]
    }
}

/// Contents of `settings.toml`. Every key is optional.
///
/// ```toml
/// locale = "en_US.UTF-8"
/// system_codepage = 437
///
/// [paths]
/// bashrc = 'D:\home\.bashrc'
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Locale written into `LANG`/`LC_ALL` by the templates.
    pub locale: String,
    /// Backup directory override.
    pub backup_dir: Option<PathBuf>,
    /// Drift cache capacity.
    pub cache_capacity: usize,
    /// Codepage used by `reset-default` and codepage restore fallbacks.
    pub system_codepage: Option<u32>,
    /// Target path overrides.
    pub paths: PathOverrides,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            backup_dir: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            system_codepage: None,
            paths: PathOverrides::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings
    /// TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        toml_loader::load_config(path)
    }

    /// Locale to render, falling back to the default when blank.
    #[must_use]
    pub fn effective_locale(&self) -> &str {
        let trimmed = self.locale.trim();
        if trimmed.is_empty() {
            DEFAULT_LOCALE
        } else {
            trimmed
        }
    }

    /// Configured system codepage, ignoring the invalid value `0`.
    #[must_use]
    pub fn system_codepage(&self) -> Option<u32> {
        self.system_codepage.filter(|&cp| cp != 0)
    }

    /// Check for suspicious values.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationWarning> {
        validation::validate(self)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.effective_locale(), "zh_CN.UTF-8");
        assert_eq!(settings.cache_capacity, 64);
    }

    #[test]
    fn full_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
locale = "en_US.UTF-8"
backup_dir = "/var/backup"
cache_capacity = 8
system_codepage = 437

[paths]
bashrc = "/h/.bashrc"
ps7_exe = "/opt/pwsh"
"#,
        )
        .unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.effective_locale(), "en_US.UTF-8");
        assert_eq!(settings.backup_dir, Some(PathBuf::from("/var/backup")));
        assert_eq!(settings.cache_capacity, 8);
        assert_eq!(settings.system_codepage(), Some(437));
        assert_eq!(settings.paths.bashrc, Some(PathBuf::from("/h/.bashrc")));
        assert_eq!(settings.paths.ps7_exe, Some(PathBuf::from("/opt/pwsh")));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "locle = \"x\"\n").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn blank_locale_falls_back() {
        let settings = Settings {
            locale: "  ".to_string(),
            system_codepage: Some(0),
            ..Settings::default()
        };
        assert_eq!(settings.effective_locale(), DEFAULT_LOCALE);
        assert_eq!(settings.system_codepage(), None);
    }
}
