//! Well-known locations derived from the user's environment.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::PathOverrides;
use crate::target::TargetKey;

/// Directory name used under `%APPDATA%`.
const APP_DIR_WINDOWS: &str = "Code-encoding-fix";

/// Directory name used under XDG base directories.
const APP_DIR_XDG: &str = "code-encoding-fix";

/// Snapshot of the environment variables that locate user files.
///
/// Captured once at startup so resolution is deterministic and testable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// User home directory.
    pub home: PathBuf,
    /// `%APPDATA%`.
    pub appdata: Option<PathBuf>,
    /// `%LOCALAPPDATA%`.
    pub local_appdata: Option<PathBuf>,
    /// `%SystemRoot%`.
    pub system_root: Option<PathBuf>,
    /// `%ProgramFiles%`.
    pub program_files: Option<PathBuf>,
    /// `$XDG_CONFIG_HOME`.
    pub xdg_config_home: Option<PathBuf>,
    /// `$XDG_DATA_HOME`.
    pub xdg_data_home: Option<PathBuf>,
    /// `$ENCFIX_BACKUP_DIR`.
    pub backup_dir: Option<PathBuf>,
}

impl Environment {
    /// Read the process environment. `home` overrides the detected home.
    ///
    /// # Errors
    ///
    /// Returns an error if no home override is given and neither
    /// `USERPROFILE` nor `HOME` is set.
    pub fn from_process(home: Option<PathBuf>) -> Result<Self> {
        let home = match home {
            Some(home) => home,
            None => var("USERPROFILE")
                .or_else(|| var("HOME"))
                .ok_or_else(|| {
                    anyhow::anyhow!("neither USERPROFILE nor HOME environment variable is set")
                })?,
        };
        Ok(Self {
            home,
            appdata: var("APPDATA"),
            local_appdata: var("LOCALAPPDATA"),
            system_root: var("SystemRoot"),
            program_files: var("ProgramFiles"),
            xdg_config_home: var("XDG_CONFIG_HOME"),
            xdg_data_home: var("XDG_DATA_HOME"),
            backup_dir: var("ENCFIX_BACKUP_DIR"),
        })
    }

    /// An environment with only a home directory set.
    #[must_use]
    pub fn for_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            ..Self::default()
        }
    }

    /// Per-user configuration root (`%APPDATA%` or `$XDG_CONFIG_HOME`).
    #[must_use]
    pub fn config_root(&self) -> PathBuf {
        self.appdata
            .clone()
            .or_else(|| self.xdg_config_home.clone())
            .unwrap_or_else(|| self.home.join(".config"))
    }

    /// Directory holding this tool's settings.
    #[must_use]
    pub fn app_config_dir(&self) -> PathBuf {
        match &self.appdata {
            Some(appdata) => appdata.join(APP_DIR_WINDOWS),
            None => self.config_root().join(APP_DIR_XDG),
        }
    }

    /// Default `settings.toml` location.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.app_config_dir().join("settings.toml")
    }

    /// Default backup directory.
    #[must_use]
    pub fn default_backup_dir(&self) -> PathBuf {
        match &self.appdata {
            Some(appdata) => appdata.join(APP_DIR_WINDOWS).join("backup"),
            None => self
                .xdg_data_home
                .clone()
                .unwrap_or_else(|| self.home.join(".local").join("share"))
                .join(APP_DIR_XDG)
                .join("backup"),
        }
    }

    /// Backup directory after applying, in order of precedence, the command
    /// line flag, `$ENCFIX_BACKUP_DIR`, the settings file and the default.
    #[must_use]
    pub fn resolve_backup_dir(&self, flag: Option<&Path>, setting: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.backup_dir.clone())
            .or_else(|| setting.map(Path::to_path_buf))
            .unwrap_or_else(|| self.default_backup_dir())
    }
}

fn var(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v: &OsString| !v.is_empty())
        .map(PathBuf::from)
}

/// Files managed for each text target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPaths {
    /// Windows PowerShell 5.1 profile.
    pub ps5_profile: PathBuf,
    /// PowerShell 7 profile.
    pub ps7_profile: PathBuf,
    /// Git Bash rc file.
    pub bashrc: PathBuf,
    /// VS Code user settings.
    pub vscode_settings: PathBuf,
}

impl TargetPaths {
    /// Default locations under `env`, replaced by any configured override.
    #[must_use]
    pub fn resolve(env: &Environment, overrides: &PathOverrides) -> Self {
        let documents = env.home.join("Documents");
        let pick = |over: &Option<PathBuf>, default: PathBuf| over.clone().unwrap_or(default);
        Self {
            ps5_profile: pick(
                &overrides.ps5_profile,
                documents
                    .join("WindowsPowerShell")
                    .join("Microsoft.PowerShell_profile.ps1"),
            ),
            ps7_profile: pick(
                &overrides.ps7_profile,
                documents
                    .join("PowerShell")
                    .join("Microsoft.PowerShell_profile.ps1"),
            ),
            bashrc: pick(&overrides.bashrc, env.home.join(".bashrc")),
            vscode_settings: pick(
                &overrides.vscode_settings,
                env.config_root()
                    .join("Code")
                    .join("User")
                    .join("settings.json"),
            ),
        }
    }

    /// Managed file of `key`, or `None` for the console target.
    #[must_use]
    pub fn for_key(&self, key: TargetKey) -> Option<&Path> {
        match key {
            TargetKey::Ps5 => Some(&self.ps5_profile),
            TargetKey::Ps7 => Some(&self.ps7_profile),
            TargetKey::GitBash => Some(&self.bashrc),
            TargetKey::VsCode => Some(&self.vscode_settings),
            TargetKey::Console => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn windows_env() -> Environment {
        Environment {
            appdata: Some(PathBuf::from("/u/AppData/Roaming")),
            ..Environment::for_home("/u")
        }
    }

    #[test]
    fn windows_locations_use_appdata() {
        let env = windows_env();
        assert_eq!(
            env.settings_file(),
            PathBuf::from("/u/AppData/Roaming/Code-encoding-fix/settings.toml")
        );
        assert_eq!(
            env.default_backup_dir(),
            PathBuf::from("/u/AppData/Roaming/Code-encoding-fix/backup")
        );
        let paths = TargetPaths::resolve(&env, &PathOverrides::default());
        assert_eq!(
            paths.vscode_settings,
            PathBuf::from("/u/AppData/Roaming/Code/User/settings.json")
        );
    }

    #[test]
    fn xdg_locations_without_appdata() {
        let env = Environment {
            xdg_data_home: Some(PathBuf::from("/data")),
            ..Environment::for_home("/u")
        };
        assert_eq!(
            env.settings_file(),
            PathBuf::from("/u/.config/code-encoding-fix/settings.toml")
        );
        assert_eq!(
            env.default_backup_dir(),
            PathBuf::from("/data/code-encoding-fix/backup")
        );
    }

    #[test]
    fn profile_paths_live_under_documents() {
        let paths = TargetPaths::resolve(&Environment::for_home("/u"), &PathOverrides::default());
        assert_eq!(
            paths.ps5_profile,
            PathBuf::from("/u/Documents/WindowsPowerShell/Microsoft.PowerShell_profile.ps1")
        );
        assert_eq!(
            paths.ps7_profile,
            PathBuf::from("/u/Documents/PowerShell/Microsoft.PowerShell_profile.ps1")
        );
        assert_eq!(paths.bashrc, PathBuf::from("/u/.bashrc"));
        assert_eq!(paths.for_key(TargetKey::GitBash), Some(Path::new("/u/.bashrc")));
        assert!(paths.for_key(TargetKey::Console).is_none());
    }

    #[test]
    fn overrides_replace_defaults() {
        let overrides = PathOverrides {
            bashrc: Some(PathBuf::from("/elsewhere/.bashrc")),
            ..PathOverrides::default()
        };
        let paths = TargetPaths::resolve(&Environment::for_home("/u"), &overrides);
        assert_eq!(paths.bashrc, PathBuf::from("/elsewhere/.bashrc"));
    }

    #[test]
    fn backup_dir_precedence() {
        let mut env = windows_env();
        let flag = Path::new("/flag");
        let setting = Path::new("/setting");
        assert_eq!(env.resolve_backup_dir(Some(flag), Some(setting)), flag);
        env.backup_dir = Some(PathBuf::from("/env"));
        assert_eq!(env.resolve_backup_dir(None, Some(setting)), Path::new("/env"));
        env.backup_dir = None;
        assert_eq!(env.resolve_backup_dir(None, Some(setting)), setting);
        assert_eq!(env.resolve_backup_dir(None, None), env.default_backup_dir());
    }
}
