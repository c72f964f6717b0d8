//! Locating installed shells, terminals and the editor.
//!
//! Discovery only produces facts (paths and presence); nothing here writes.
use std::path::{Path, PathBuf};

use crate::config::{Environment, PathOverrides, TargetPaths};
use crate::exec::Executor;
use crate::operations::FileSystemOps;
use crate::target::TargetKey;

/// Executables and installs found on this machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// `powershell.exe` (Windows PowerShell 5.1).
    pub ps5: Option<PathBuf>,
    /// `pwsh.exe` (PowerShell 7).
    pub ps7: Option<PathBuf>,
    /// Git Bash `bash.exe`.
    pub git_bash: Option<PathBuf>,
    /// Whether VS Code appears to be installed.
    pub vscode: bool,
    /// Windows Terminal `wt.exe`.
    pub terminal: Option<PathBuf>,
    /// `cmd.exe`.
    pub cmd: Option<PathBuf>,
}

impl Discovery {
    /// Probe `PATH` and the usual install locations. Overrides win.
    #[must_use]
    pub fn probe(
        env: &Environment,
        overrides: &PathOverrides,
        paths: &TargetPaths,
        executor: &dyn Executor,
        fs: &dyn FileSystemOps,
    ) -> Self {
        let existing = |p: PathBuf| fs.exists(&p).then(|| normalize(&p));
        let system32 = env.system_root.as_ref().map(|r| r.join("System32"));

        let ps5 = overrides.ps5_exe.clone().or_else(|| {
            executor.which("powershell").or_else(|| {
                system32.as_ref().and_then(|s| {
                    existing(s.join("WindowsPowerShell").join("v1.0").join("powershell.exe"))
                })
            })
        });

        let ps7 = overrides.ps7_exe.clone().or_else(|| {
            executor.which("pwsh").or_else(|| {
                env.program_files
                    .as_ref()
                    .and_then(|pf| newest_pwsh(&pf.join("PowerShell"), fs))
            })
        });

        let git_bash = overrides
            .bash_exe
            .clone()
            .or_else(|| git_bash_from_git(executor, fs))
            .or_else(|| {
                executor
                    .which("bash")
                    .filter(|p| !is_system32_bash(p, system32.as_deref()))
            })
            .or_else(|| {
                [
                    env.program_files.as_ref().map(|p| p.join("Git")),
                    env.local_appdata
                        .as_ref()
                        .map(|p| p.join("Programs").join("Git")),
                ]
                .into_iter()
                .flatten()
                .find_map(|root| existing(root.join("bin").join("bash.exe")))
            });

        let vscode = executor.which("code").is_some()
            || paths
                .vscode_settings
                .parent()
                .is_some_and(|dir| fs.exists(dir));

        let terminal = executor.which("wt").or_else(|| {
            env.local_appdata.as_ref().and_then(|p| {
                existing(p.join("Microsoft").join("WindowsApps").join("wt.exe"))
            })
        });

        let cmd = system32.and_then(|s| existing(s.join("cmd.exe")));

        Self {
            ps5: ps5.map(|p| normalize(&p)),
            ps7: ps7.map(|p| normalize(&p)),
            git_bash: git_bash.map(|p| normalize(&p)),
            vscode,
            terminal: terminal.map(|p| normalize(&p)),
            cmd,
        }
    }

    /// Whether `key` was found.
    #[must_use]
    pub fn is_detected(&self, key: TargetKey) -> bool {
        match key {
            TargetKey::Ps5 => self.ps5.is_some(),
            TargetKey::Ps7 => self.ps7.is_some(),
            TargetKey::GitBash => self.git_bash.is_some(),
            TargetKey::VsCode => self.vscode,
            TargetKey::Console => !self.console_hosts().is_empty(),
        }
    }

    /// Executables whose console codepage is managed.
    #[must_use]
    pub fn console_hosts(&self) -> Vec<&Path> {
        [&self.ps5, &self.ps7, &self.terminal, &self.cmd]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect()
    }

    /// Run each detected shell once and forget those that do not respond.
    ///
    /// Returns the targets that were downgraded to not detected.
    pub fn verify(&mut self, executor: &dyn Executor) -> Vec<TargetKey> {
        let mut lost = Vec::new();
        let ps_args = [
            "-NoLogo",
            "-NoProfile",
            "-Command",
            "$PSVersionTable.PSVersion.ToString()",
        ];
        for (key, slot, args) in [
            (TargetKey::Ps5, &mut self.ps5, &ps_args[..]),
            (TargetKey::Ps7, &mut self.ps7, &ps_args[..]),
            (TargetKey::GitBash, &mut self.git_bash, &["--version"][..]),
        ] {
            let Some(exe) = slot.as_ref() else {
                continue;
            };
            let responds = executor
                .run_unchecked(&exe.to_string_lossy(), args)
                .is_ok_and(|r| r.success);
            if !responds {
                *slot = None;
                lost.push(key);
            }
        }
        lost
    }
}

/// Strip Windows verbatim prefixes so paths print and compare naturally.
fn normalize(path: &Path) -> PathBuf {
    dunce::simplified(path).to_path_buf()
}

/// `git.exe` lives in `<root>\cmd`; its bash is `<root>\bin\bash.exe`.
fn git_bash_from_git(executor: &dyn Executor, fs: &dyn FileSystemOps) -> Option<PathBuf> {
    let git = executor.which("git")?;
    let root = git.parent()?.parent()?;
    let bash = root.join("bin").join("bash.exe");
    fs.exists(&bash).then_some(bash)
}

/// `System32\bash.exe` is the WSL launcher, not Git Bash.
fn is_system32_bash(path: &Path, system32: Option<&Path>) -> bool {
    system32.is_some_and(|s| path.starts_with(s))
}

/// Highest-versioned `<dir>\<version>\pwsh.exe`.
fn newest_pwsh(dir: &Path, fs: &dyn FileSystemOps) -> Option<PathBuf> {
    fs.read_dir(dir)
        .ok()?
        .into_iter()
        .filter_map(|version_dir| {
            let version = version_key(version_dir.file_name()?.to_str()?)?;
            let exe = version_dir.join("pwsh.exe");
            fs.exists(&exe).then_some((version, exe))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, exe)| exe)
}

/// Numeric components of a version directory name (`7`, `7.4`, `7-preview`).
fn version_key(name: &str) -> Option<Vec<u32>> {
    let parts: Vec<u32> = name
        .split(['.', '-'])
        .map_while(|part| part.parse().ok())
        .collect();
    (!parts.is_empty()).then_some(parts)
}
