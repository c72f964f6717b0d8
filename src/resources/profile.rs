//! Shell profiles and rc files carrying a marker block.
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{Resource, ResourceChange, log_backup, read_target, write_target};
use crate::backup::{BackupLedger, RestoreEngine};
use crate::blocks::{
    DriftCache, DriftReport, EquivalenceCheck, ManagedBlockSpec, analyze, apply_block,
    posix_shell_equivalent, powershell_equivalent,
};
use crate::logging::Log;
use crate::operations::FileSystemOps;
use crate::target::TargetKey;

/// A text file whose managed block is a [`ManagedBlockSpec`].
#[derive(Debug)]
pub struct ProfileResource<'a> {
    key: TargetKey,
    path: PathBuf,
    spec: ManagedBlockSpec,
    equivalence: Option<EquivalenceCheck>,
    ledger: &'a BackupLedger,
    fs: &'a dyn FileSystemOps,
    cache: Option<&'a DriftCache>,
}

impl<'a> ProfileResource<'a> {
    /// A PowerShell profile (`key` is [`TargetKey::Ps5`] or [`TargetKey::Ps7`]).
    #[must_use]
    pub fn powershell(
        key: TargetKey,
        path: impl Into<PathBuf>,
        locale: &str,
        ledger: &'a BackupLedger,
        fs: &'a dyn FileSystemOps,
    ) -> Self {
        Self {
            key,
            path: path.into(),
            spec: ManagedBlockSpec::powershell(locale),
            equivalence: Some(powershell_equivalent),
            ledger,
            fs,
            cache: None,
        }
    }

    /// The Git Bash rc file.
    #[must_use]
    pub fn posix_shell(
        path: impl Into<PathBuf>,
        locale: &str,
        ledger: &'a BackupLedger,
        fs: &'a dyn FileSystemOps,
    ) -> Self {
        Self {
            key: TargetKey::GitBash,
            path: path.into(),
            spec: ManagedBlockSpec::posix_shell(locale),
            equivalence: Some(posix_shell_equivalent),
            ledger,
            fs,
            cache: None,
        }
    }

    /// Serve [`current_state`](Resource::current_state) through `cache`.
    #[must_use]
    pub const fn with_cache(mut self, cache: &'a DriftCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Managed file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn analyze_now(&self) -> DriftReport {
        match self.fs.read(&self.path) {
            Ok(None) => analyze(None, &self.spec, self.equivalence),
            Ok(Some(bytes)) => analyze(
                Some(&String::from_utf8_lossy(&bytes)),
                &self.spec,
                self.equivalence,
            ),
            Err(e) => DriftReport::unreadable(e),
        }
    }
}

impl Resource for ProfileResource<'_> {
    fn key(&self) -> TargetKey {
        self.key
    }

    fn description(&self) -> String {
        format!("{} ({})", self.key.label(), self.path.display())
    }

    fn current_state(&self) -> DriftReport {
        match self.cache {
            Some(cache) => cache.get_or_insert_with(
                &self.path,
                self.fs.stamp(&self.path),
                &self.spec.fingerprint(),
                || self.analyze_now(),
            ),
            None => self.analyze_now(),
        }
    }

    fn apply(&self, log: &dyn Log) -> Result<ResourceChange> {
        let current = read_target(self.fs, &self.path)?;
        let text = current
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or(Cow::Borrowed(""));
        let updated = apply_block(&text, &self.spec);
        if current.is_some() && updated == text {
            return Ok(ResourceChange::AlreadyCorrect);
        }

        let outcome = self
            .ledger
            .ensure(self.key, current.as_deref(), |t| self.spec.has_both_markers(t))
            .with_context(|| format!("backing up {}", self.key.label()))?;
        log_backup(log, self.key, outcome);

        write_target(self.fs, &self.path, updated.as_bytes())?;
        Ok(ResourceChange::Applied)
    }

    fn restore(&self, log: &dyn Log) -> Result<ResourceChange> {
        let outcome =
            RestoreEngine::new(self.ledger, self.fs).restore(self.key, &self.path, None)?;
        log.debug(&format!("{}: {outcome}", self.description()));
        Ok(outcome.into())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::backup::BackupPayload;
    use crate::blocks::{DriftState, END_MARKER, START_MARKER};
    use crate::error::TargetError;
    use crate::logging::{ChannelLog, LogEntry};
    use crate::operations::MockFileSystemOps;
    use std::sync::Arc;

    const BASHRC: &str = "/home/u/.bashrc";
    const PROFILE: &str = "/home/u/Documents/PowerShell/Microsoft.PowerShell_profile.ps1";

    fn setup(fs: MockFileSystemOps) -> (Arc<MockFileSystemOps>, BackupLedger) {
        let fs = Arc::new(fs);
        let ledger = BackupLedger::new("/backup", fs.clone());
        (fs, ledger)
    }

    #[test]
    fn apply_to_absent_file_records_sentinel_and_converges() {
        let (fs, ledger) = setup(MockFileSystemOps::new());
        let (log, _rx) = ChannelLog::new();
        let bash = ProfileResource::posix_shell(BASHRC, "zh_CN.UTF-8", &ledger, fs.as_ref());

        assert_eq!(bash.current_state().state, DriftState::Missing);
        assert_eq!(bash.apply(&log).unwrap(), ResourceChange::Applied);
        assert_eq!(bash.current_state().state, DriftState::Ok);
        assert_eq!(
            ledger.read(TargetKey::GitBash).unwrap(),
            Some(BackupPayload::Absent)
        );
        assert!(fs.contents(BASHRC).unwrap().starts_with(START_MARKER));
    }

    #[test]
    fn second_apply_is_a_no_op() {
        let (fs, ledger) = setup(MockFileSystemOps::new().with_file(PROFILE, "Set-Alias g git\n"));
        let (log, _rx) = ChannelLog::new();
        let ps = ProfileResource::powershell(TargetKey::Ps7, PROFILE, "en_US.UTF-8", &ledger, fs.as_ref());

        assert_eq!(ps.apply(&log).unwrap(), ResourceChange::Applied);
        let writes = fs.write_count();
        assert_eq!(ps.apply(&log).unwrap(), ResourceChange::AlreadyCorrect);
        assert_eq!(fs.write_count(), writes);
        let text = fs.contents(PROFILE).unwrap();
        assert!(text.starts_with("Set-Alias g git\n\n"));
        assert_eq!(text.matches(START_MARKER).count(), 1);
    }

    #[test]
    fn restore_returns_original_bytes() {
        let (fs, ledger) = setup(MockFileSystemOps::new().with_file(BASHRC, "alias l=ls\n"));
        let (log, _rx) = ChannelLog::new();
        let bash = ProfileResource::posix_shell(BASHRC, "zh_CN.UTF-8", &ledger, fs.as_ref());

        bash.apply(&log).unwrap();
        assert_ne!(fs.contents(BASHRC).as_deref(), Some("alias l=ls\n"));
        assert_eq!(bash.restore(&log).unwrap(), ResourceChange::Applied);
        assert_eq!(fs.contents(BASHRC).as_deref(), Some("alias l=ls\n"));
    }

    #[test]
    fn restore_without_backup_is_skipped() {
        let (fs, ledger) = setup(MockFileSystemOps::new().with_file(BASHRC, "mine\n"));
        let (log, _rx) = ChannelLog::new();
        let bash = ProfileResource::posix_shell(BASHRC, "zh_CN.UTF-8", &ledger, fs.as_ref());
        assert!(matches!(
            bash.restore(&log).unwrap(),
            ResourceChange::Skipped { .. }
        ));
        assert_eq!(fs.contents(BASHRC).as_deref(), Some("mine\n"));
    }

    #[test]
    fn tool_authored_file_is_not_backed_up() {
        let stale = format!("{START_MARKER}\nexport LANG=C\n{END_MARKER}\n");
        let (fs, ledger) = setup(MockFileSystemOps::new().with_file(BASHRC, &stale));
        let (log, rx) = ChannelLog::new();
        let bash = ProfileResource::posix_shell(BASHRC, "zh_CN.UTF-8", &ledger, fs.as_ref());

        assert_eq!(bash.current_state().state, DriftState::Modified);
        assert_eq!(bash.apply(&log).unwrap(), ResourceChange::Applied);
        assert!(!ledger.has(TargetKey::GitBash));
        drop(log);
        assert!(rx.iter().any(|e| matches!(e, LogEntry::Warn(m) if m.contains("skipping backup"))));
    }

    #[test]
    fn unreadable_file_is_reported_and_apply_fails() {
        let (fs, ledger) = setup(MockFileSystemOps::new().deny(BASHRC));
        let (log, _rx) = ChannelLog::new();
        let bash = ProfileResource::posix_shell(BASHRC, "zh_CN.UTF-8", &ledger, fs.as_ref());

        assert_eq!(bash.current_state().state, DriftState::Unreadable);
        let err = bash.apply(&log).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TargetError>(),
            Some(TargetError::PermissionDenied { .. })
        ));
        assert!(!ledger.has(TargetKey::GitBash));
    }

    #[test]
    fn manual_setup_is_recognized() {
        let manual = "export LANG=en_US.UTF-8\nexport LC_ALL=en_US.UTF-8\ngit config --global core.quotepath false\n";
        let (fs, ledger) = setup(MockFileSystemOps::new().with_file(BASHRC, manual));
        let bash = ProfileResource::posix_shell(BASHRC, "zh_CN.UTF-8", &ledger, fs.as_ref());
        assert!(!bash.needs_change());
    }

    #[test]
    fn cached_state_is_invalidated_by_writes() {
        let (fs, ledger) = setup(MockFileSystemOps::new());
        let cache = DriftCache::new(8);
        let (log, _rx) = ChannelLog::new();
        let bash = ProfileResource::posix_shell(BASHRC, "zh_CN.UTF-8", &ledger, fs.as_ref())
            .with_cache(&cache);

        assert_eq!(bash.current_state().state, DriftState::Missing);
        assert_eq!(cache.len(), 1);
        bash.apply(&log).unwrap();
        assert_eq!(bash.current_state().state, DriftState::Ok);
        assert_eq!(cache.len(), 2);
    }
}
