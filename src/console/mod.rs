//! Console codepage of each terminal host.
//!
//! Every sub-target moves `unknown → configured(65001) → restored`. Apply
//! snapshots the prior value into the ledger once, before any write;
//! restore replays the snapshot; reset-to-system-default bypasses the
//! ledger entirely.
mod store;
mod target;

use std::sync::LazyLock;

use anyhow::{Context as _, Result};
use regex::Regex;

use crate::backup::{BackupLedger, CodepageEntry, CodepageRecord, RestoreOutcome};
use crate::blocks::{DriftReport, DriftState};
use crate::error::TargetError;
use crate::exec::Executor;
use crate::target::TargetKey;

#[cfg(test)]
pub use store::MockCodepageStore;
#[cfg(windows)]
pub use store::RegistryCodepageStore;
pub use store::{CODEPAGE_VALUE, CodepageStore, MemoryCodepageStore, NLS_CODEPAGE_KEY, parse_codepage};
pub use target::{ConsoleTarget, normalize_key};

/// UTF-8.
pub const UTF8_CODEPAGE: u32 = 65001;

/// Used when neither settings nor the console report a system codepage.
pub const FALLBACK_CODEPAGE: u32 = 936;

/// Codepage state of one sub-target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodepageState {
    /// No value, or a non-UTF-8 value that was never managed.
    NotConfigured(Option<u32>),
    /// Set to 65001.
    Configured,
    /// Managed before, now holds another value.
    Drifted(u32),
    /// The value could not be read.
    Unreadable(String),
}

/// Outcome of writing one sub-target.
#[derive(Debug)]
pub struct SubTargetResult<T> {
    /// The sub-target.
    pub target: ConsoleTarget,
    /// What happened to it.
    pub result: Result<T, TargetError>,
}

/// What apply did to one sub-target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Codepage set to 65001.
    Written,
    /// Already 65001.
    AlreadyConfigured,
}

/// Result of [`ConsoleCodepages::apply`].
#[derive(Debug, Default)]
pub struct ConsoleApplyReport {
    /// Sub-targets newly recorded in the ledger.
    pub backed_up: Vec<String>,
    /// Per sub-target outcome, in input order.
    pub results: Vec<SubTargetResult<ApplyOutcome>>,
}

impl ConsoleApplyReport {
    /// Sub-targets whose write failed.
    pub fn failures(&self) -> impl Iterator<Item = (&ConsoleTarget, &TargetError)> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (&r.target, e)))
    }
}

/// Apply, restore and reset over a set of console sub-targets.
#[derive(Debug)]
pub struct ConsoleCodepages<'a> {
    store: &'a dyn CodepageStore,
    ledger: &'a BackupLedger,
}

impl<'a> ConsoleCodepages<'a> {
    /// Operate on `store`, recording originals in `ledger`.
    #[must_use]
    pub fn new(store: &'a dyn CodepageStore, ledger: &'a BackupLedger) -> Self {
        Self { store, ledger }
    }

    /// State of each sub-target. A value other than 65001 counts as drifted
    /// only when a console backup exists.
    #[must_use]
    pub fn states(&self, targets: &[ConsoleTarget]) -> Vec<(ConsoleTarget, CodepageState)> {
        let managed = self.ledger.has(TargetKey::Console);
        targets
            .iter()
            .map(|t| {
                let state = match self.store.read_codepage(t.key()) {
                    Ok(Some(UTF8_CODEPAGE)) => CodepageState::Configured,
                    Ok(Some(other)) if managed => CodepageState::Drifted(other),
                    Ok(value) => CodepageState::NotConfigured(value),
                    Err(e) => CodepageState::Unreadable(e.to_string()),
                };
                (t.clone(), state)
            })
            .collect()
    }

    /// Fold sub-target states into one drift report.
    #[must_use]
    pub fn report(&self, targets: &[ConsoleTarget]) -> DriftReport {
        let states = self.states(targets);
        let total = states.len();
        let configured = states
            .iter()
            .filter(|(_, s)| *s == CodepageState::Configured)
            .count();

        let unreadable: Vec<String> = states
            .iter()
            .filter_map(|(t, s)| match s {
                CodepageState::Unreadable(e) => Some(format!("{t}: {e}")),
                _ => None,
            })
            .collect();
        if !unreadable.is_empty() {
            return DriftReport::new(DriftState::Unreadable, unreadable.join("; "));
        }

        let drifted: Vec<String> = states
            .iter()
            .filter_map(|(t, s)| match s {
                CodepageState::Drifted(v) => Some(format!("{t} uses codepage {v}")),
                _ => None,
            })
            .collect();
        if !drifted.is_empty() {
            return DriftReport::new(DriftState::Modified, drifted.join("; "));
        }

        if total == 0 {
            DriftReport::new(DriftState::Missing, "no console hosts found")
        } else if configured == total {
            DriftReport::new(DriftState::Ok, format!("{total} console(s) use UTF-8"))
        } else if configured == 0 {
            DriftReport::new(DriftState::Missing, "no console uses UTF-8")
        } else {
            DriftReport::new(
                DriftState::Partial,
                format!("{configured} of {total} consoles use UTF-8"),
            )
        }
    }

    /// Snapshot every unrecorded sub-target, then set each to 65001.
    ///
    /// The merged snapshot is persisted before the first write. A failure
    /// on one sub-target does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or written; no
    /// codepage is touched in that case.
    pub fn apply(&self, targets: &[ConsoleTarget]) -> Result<ConsoleApplyReport> {
        let mut snapshot = CodepageRecord::new();
        let mut current = Vec::with_capacity(targets.len());
        for target in targets {
            let value = self.store.read_codepage(target.key());
            if let Ok(v) = &value {
                snapshot.insert(
                    target.key().to_string(),
                    v.map_or(CodepageEntry::Absent, CodepageEntry::Value),
                );
            }
            current.push(value);
        }

        let backed_up = self
            .ledger
            .merge_codepages(&snapshot)
            .context("recording original console codepages")?;

        let results = targets
            .iter()
            .zip(current)
            .map(|(target, value)| {
                let result = value.and_then(|v| {
                    if v == Some(UTF8_CODEPAGE) {
                        Ok(ApplyOutcome::AlreadyConfigured)
                    } else {
                        self.store
                            .write_codepage(target.key(), UTF8_CODEPAGE)
                            .map(|()| ApplyOutcome::Written)
                    }
                });
                SubTargetResult {
                    target: target.clone(),
                    result,
                }
            })
            .collect();

        Ok(ConsoleApplyReport { backed_up, results })
    }

    /// Return each sub-target to its recorded value.
    ///
    /// Recorded keys that are no longer discovered are restored as well.
    /// Without an entry, `fallback` is written when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the console record cannot be read.
    pub fn restore_to_original(
        &self,
        targets: &[ConsoleTarget],
        fallback: Option<u32>,
    ) -> Result<Vec<SubTargetResult<RestoreOutcome>>> {
        let record = self.ledger.read_codepages()?.unwrap_or_default();

        let mut all: Vec<ConsoleTarget> = targets.to_vec();
        for key in record.keys() {
            if !all.iter().any(|t| t.key() == key) {
                all.push(ConsoleTarget::from_key(key));
            }
        }

        Ok(all
            .into_iter()
            .map(|target| {
                let result = self.restore_one(target.key(), record.get(target.key()), fallback);
                SubTargetResult { target, result }
            })
            .collect())
    }

    fn restore_one(
        &self,
        key: &str,
        entry: Option<&CodepageEntry>,
        fallback: Option<u32>,
    ) -> Result<RestoreOutcome, TargetError> {
        match (entry, fallback) {
            (Some(CodepageEntry::Value(v)), _) => {
                self.store.write_codepage(key, *v)?;
                Ok(RestoreOutcome::Restored)
            }
            (Some(CodepageEntry::Absent), Some(cp)) | (None, Some(cp)) => {
                self.store.write_codepage(key, cp)?;
                Ok(RestoreOutcome::FallbackWritten)
            }
            (Some(CodepageEntry::Absent), None) => Ok(if self.store.remove_codepage(key)? {
                RestoreOutcome::Removed
            } else {
                RestoreOutcome::AlreadyAbsent
            }),
            (None, None) => Ok(RestoreOutcome::NoBackup),
        }
    }

    /// Force `codepage` onto every sub-target. The ledger is not consulted.
    #[must_use]
    pub fn reset_to_system_default(
        &self,
        targets: &[ConsoleTarget],
        codepage: u32,
    ) -> Vec<SubTargetResult<()>> {
        targets
            .iter()
            .map(|target| SubTargetResult {
                target: target.clone(),
                result: self.store.write_codepage(target.key(), codepage),
            })
            .collect()
    }
}

static ACTIVE_CODEPAGE: LazyLock<Regex> = LazyLock::new(chcp_pattern);

#[allow(clippy::expect_used)]
fn chcp_pattern() -> Regex {
    Regex::new(r"(\d+)\s*\.?\s*$").expect("literal pattern compiles")
}

/// Parse the trailing number of `chcp` output (`Active code page: 936`).
#[must_use]
pub fn parse_chcp(output: &str) -> Option<u32> {
    ACTIVE_CODEPAGE
        .captures(output.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// The codepage consoles return to when UTF-8 is removed.
///
/// Uses `configured` when set, else the machine codepage from `store`.
/// Only when neither is known does it ask `chcp`, whose answer reflects the
/// current console and is ignored when it is already 65001. The last resort
/// is [`FALLBACK_CODEPAGE`].
#[must_use]
pub fn system_default_codepage(
    configured: Option<u32>,
    store: &dyn CodepageStore,
    executor: &dyn Executor,
) -> u32 {
    configured
        .or_else(|| store.system_codepage())
        .or_else(|| {
            executor
                .run_unchecked("cmd", &["/C", "chcp"])
                .ok()
                .filter(|r| r.success)
                .and_then(|r| parse_chcp(&r.stdout))
                .filter(|&cp| cp != UTF8_CODEPAGE && cp != 0)
        })
        .unwrap_or(FALLBACK_CODEPAGE)
}
