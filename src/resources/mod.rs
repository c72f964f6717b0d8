//! Managed targets behind one check / apply / restore interface.
//!
//! Each [`TargetKind`](crate::target::TargetKind) has one resource type:
//! shell profiles and rc files share [`profile::ProfileResource`], editor
//! settings use [`editor::EditorResource`] and console codepages use
//! [`console::ConsoleResource`].
pub mod console;
pub mod editor;
pub mod profile;

use std::path::Path;

use anyhow::Result;

use crate::backup::{EnsureOutcome, RestoreOutcome};
use crate::blocks::DriftReport;
use crate::error::TargetError;
use crate::logging::Log;
use crate::operations::FileSystemOps;
use crate::target::TargetKey;

/// Result of applying or restoring a resource.
///
/// # Examples
///
/// ```
/// use encfix_cli::resources::ResourceChange;
///
/// let applied = ResourceChange::Applied;
/// let noop = ResourceChange::AlreadyCorrect;
/// let skipped = ResourceChange::Skipped { reason: "no backup, skipped".into() };
///
/// assert_eq!(applied, ResourceChange::Applied);
/// assert_ne!(applied, noop);
/// assert!(matches!(skipped, ResourceChange::Skipped { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// The target was written.
    Applied,
    /// The target already had the wanted content.
    AlreadyCorrect,
    /// The target was left alone.
    Skipped {
        /// Why nothing was done.
        reason: String,
    },
}

impl From<RestoreOutcome> for ResourceChange {
    fn from(outcome: RestoreOutcome) -> Self {
        match outcome {
            RestoreOutcome::Restored | RestoreOutcome::Removed | RestoreOutcome::FallbackWritten => {
                Self::Applied
            }
            RestoreOutcome::AlreadyAbsent => Self::AlreadyCorrect,
            RestoreOutcome::NoBackup => Self::Skipped {
                reason: outcome.to_string(),
            },
        }
    }
}

/// A managed target that can be inspected, converged and reverted.
///
/// `apply` records the pre-tool state in the backup ledger (once) before the
/// first write; `restore` replays that record and never clears it.
pub trait Resource {
    /// Target this resource manages.
    fn key(&self) -> TargetKey;

    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Drift state of the target. Read failures are folded into the report.
    fn current_state(&self) -> DriftReport;

    /// Whether [`apply`](Self::apply) would change the target.
    fn needs_change(&self) -> bool {
        self.current_state().state.needs_apply()
    }

    /// Back up, then converge the target to its canonical configuration.
    ///
    /// # Errors
    ///
    /// Returns an error (usually wrapping a [`TargetError`]) if the target
    /// or the ledger cannot be read or written.
    fn apply(&self, log: &dyn Log) -> Result<ResourceChange>;

    /// Return the target to its recorded pre-tool state.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or the target cannot
    /// be written.
    fn restore(&self, log: &dyn Log) -> Result<ResourceChange>;
}

/// Read `path`, classifying failures.
fn read_target(fs: &dyn FileSystemOps, path: &Path) -> Result<Option<Vec<u8>>, TargetError> {
    fs.read(path).map_err(|e| TargetError::from_io(path, e))
}

/// Write `contents` to `path`, classifying failures.
fn write_target(fs: &dyn FileSystemOps, path: &Path, contents: &[u8]) -> Result<(), TargetError> {
    fs.write(path, contents)
        .map_err(|e| TargetError::from_io(path, e))
}

/// Report what the ledger did for `key`.
fn log_backup(log: &dyn Log, key: TargetKey, outcome: EnsureOutcome) {
    match outcome {
        EnsureOutcome::AlreadyRecorded => {
            log.debug(&format!("{key}: original already recorded"));
        }
        EnsureOutcome::RecordedAbsent => {
            log.info(&format!("{key}: recorded that no configuration existed"));
        }
        EnsureOutcome::RecordedContent => {
            log.info(&format!("{key}: backed up original configuration"));
        }
        EnsureOutcome::SkippedToolAuthored => log.warn(&format!(
            "{key}: file already contains a managed block but no backup exists; skipping backup"
        )),
    }
}
