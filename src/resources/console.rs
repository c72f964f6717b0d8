//! Console codepage of every discovered terminal host.
use anyhow::{Result, bail};

use super::{Resource, ResourceChange};
use crate::backup::{BackupLedger, RestoreOutcome};
use crate::blocks::DriftReport;
use crate::console::{ApplyOutcome, CodepageStore, ConsoleCodepages, ConsoleTarget, UTF8_CODEPAGE};
use crate::logging::Log;
use crate::target::TargetKey;

/// All console sub-targets, handled as one target.
#[derive(Debug)]
pub struct ConsoleResource<'a> {
    targets: Vec<ConsoleTarget>,
    store: &'a dyn CodepageStore,
    ledger: &'a BackupLedger,
    fallback: Option<u32>,
}

impl<'a> ConsoleResource<'a> {
    /// Manage `targets` through `store`, recording originals in `ledger`.
    #[must_use]
    pub fn new(
        targets: Vec<ConsoleTarget>,
        store: &'a dyn CodepageStore,
        ledger: &'a BackupLedger,
    ) -> Self {
        Self {
            targets,
            store,
            ledger,
            fallback: None,
        }
    }

    /// Codepage written on restore for sub-targets without a recorded value.
    #[must_use]
    pub const fn with_fallback(mut self, codepage: u32) -> Self {
        self.fallback = Some(codepage);
        self
    }

    /// Managed sub-targets.
    #[must_use]
    pub fn targets(&self) -> &[ConsoleTarget] {
        &self.targets
    }

    fn codepages(&self) -> ConsoleCodepages<'_> {
        ConsoleCodepages::new(self.store, self.ledger)
    }
}

impl Resource for ConsoleResource<'_> {
    fn key(&self) -> TargetKey {
        TargetKey::Console
    }

    fn description(&self) -> String {
        format!(
            "{} ({} host(s))",
            TargetKey::Console.label(),
            self.targets.len()
        )
    }

    fn current_state(&self) -> DriftReport {
        self.codepages().report(&self.targets)
    }

    fn apply(&self, log: &dyn Log) -> Result<ResourceChange> {
        let report = self.codepages().apply(&self.targets)?;
        for key in &report.backed_up {
            log.info(&format!("{}: recorded original codepage of {key}", self.key()));
        }

        let mut written = 0usize;
        for sub in &report.results {
            match &sub.result {
                Ok(ApplyOutcome::Written) => {
                    written += 1;
                    log.debug(&format!("{}: codepage set to {UTF8_CODEPAGE}", sub.target));
                }
                Ok(ApplyOutcome::AlreadyConfigured) => {
                    log.debug(&format!("{}: already {UTF8_CODEPAGE}", sub.target));
                }
                Err(e) => log.error(&format!("{}: {e}", sub.target)),
            }
        }

        let failed = report.failures().count();
        if failed > 0 {
            bail!("{failed} of {} console(s) could not be updated", report.results.len());
        }
        Ok(if written > 0 {
            ResourceChange::Applied
        } else {
            ResourceChange::AlreadyCorrect
        })
    }

    fn restore(&self, log: &dyn Log) -> Result<ResourceChange> {
        let results = self
            .codepages()
            .restore_to_original(&self.targets, self.fallback)?;
        if results.is_empty() {
            return Ok(RestoreOutcome::NoBackup.into());
        }

        let mut changed = false;
        let mut skipped = 0usize;
        let mut failed = 0usize;
        for sub in &results {
            match &sub.result {
                Ok(outcome) => {
                    changed |= outcome.changed();
                    if *outcome == RestoreOutcome::NoBackup {
                        skipped += 1;
                    }
                    log.debug(&format!("{}: {outcome}", sub.target));
                }
                Err(e) => {
                    failed += 1;
                    log.error(&format!("{}: {e}", sub.target));
                }
            }
        }

        if failed > 0 {
            bail!("{failed} of {} console(s) could not be restored", results.len());
        }
        Ok(if changed {
            ResourceChange::Applied
        } else if skipped == results.len() {
            RestoreOutcome::NoBackup.into()
        } else {
            ResourceChange::AlreadyCorrect
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::blocks::DriftState;
    use crate::console::MemoryCodepageStore;
    use crate::logging::ChannelLog;
    use crate::operations::MockFileSystemOps;
    use std::sync::Arc;

    const CMD: &str = r"C:\Windows\System32\cmd.exe";
    const PWSH: &str = r"C:\Program Files\PowerShell\7\pwsh.exe";

    fn ledger() -> BackupLedger {
        BackupLedger::new("/backup", Arc::new(MockFileSystemOps::new()))
    }

    fn targets() -> Vec<ConsoleTarget> {
        vec![ConsoleTarget::new(CMD), ConsoleTarget::new(PWSH)]
    }

    #[test]
    fn apply_then_restore_returns_every_host_to_its_original() {
        let store = MemoryCodepageStore::new().with_value("C_Windows_System32_cmd.exe", 936);
        let ledger = ledger();
        let (log, _rx) = ChannelLog::new();
        let console = ConsoleResource::new(targets(), &store, &ledger);

        assert_eq!(console.current_state().state, DriftState::Missing);
        assert_eq!(console.apply(&log).unwrap(), ResourceChange::Applied);
        assert_eq!(console.current_state().state, DriftState::Ok);
        assert_eq!(console.apply(&log).unwrap(), ResourceChange::AlreadyCorrect);

        assert_eq!(console.restore(&log).unwrap(), ResourceChange::Applied);
        let values = store.snapshot();
        assert_eq!(values.get("C_Windows_System32_cmd.exe"), Some(&936));
        assert!(!values.contains_key("C_Program_Files_PowerShell_7_pwsh.exe"));
    }

    #[test]
    fn one_denied_host_does_not_stop_the_others() {
        let store = MemoryCodepageStore::new().deny("C_Windows_System32_cmd.exe");
        let ledger = ledger();
        let (log, _rx) = ChannelLog::new();
        let console = ConsoleResource::new(targets(), &store, &ledger);

        let err = console.apply(&log).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
        assert_eq!(
            store.snapshot().get("C_Program_Files_PowerShell_7_pwsh.exe"),
            Some(&UTF8_CODEPAGE)
        );
    }

    #[test]
    fn restore_without_record_uses_fallback() {
        let store = MemoryCodepageStore::new().with_value("C_Windows_System32_cmd.exe", 65001);
        let ledger = ledger();
        let (log, _rx) = ChannelLog::new();
        let console =
            ConsoleResource::new(vec![ConsoleTarget::new(CMD)], &store, &ledger).with_fallback(936);

        assert_eq!(console.restore(&log).unwrap(), ResourceChange::Applied);
        assert_eq!(store.snapshot().get("C_Windows_System32_cmd.exe"), Some(&936));
    }

    #[test]
    fn restore_without_record_or_fallback_is_skipped() {
        let store = MemoryCodepageStore::new();
        let ledger = ledger();
        let (log, _rx) = ChannelLog::new();
        let console = ConsoleResource::new(targets(), &store, &ledger);
        assert!(matches!(
            console.restore(&log).unwrap(),
            ResourceChange::Skipped { .. }
        ));
    }
}
