//! Put a file target back to its recorded pre-tool state.
use std::fmt;
use std::path::Path;

use crate::error::TargetError;
use crate::operations::FileSystemOps;
use crate::target::TargetKey;

use super::ledger::{BackupLedger, BackupPayload};

/// Result of restoring one target or sub-target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Recorded content was written back.
    Restored,
    /// The target was originally absent and has been deleted.
    Removed,
    /// The target was originally absent and still is.
    AlreadyAbsent,
    /// No record existed; the fallback value was written.
    FallbackWritten,
    /// No record and no fallback; nothing was touched.
    NoBackup,
}

impl RestoreOutcome {
    /// Whether the restore changed anything on disk.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Restored | Self::Removed | Self::FallbackWritten)
    }
}

impl fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Restored => "restored original content",
            Self::Removed => "removed (did not exist before)",
            Self::AlreadyAbsent => "already absent",
            Self::FallbackWritten => "fallback written",
            Self::NoBackup => "no backup, skipped",
        })
    }
}

/// Restores file targets from a [`BackupLedger`].
///
/// The engine never consumes records; callers clear the ledger once a whole
/// restore pass has succeeded.
#[derive(Debug)]
pub struct RestoreEngine<'a> {
    ledger: &'a BackupLedger,
    fs: &'a dyn FileSystemOps,
}

impl<'a> RestoreEngine<'a> {
    /// Create an engine reading records from `ledger` and writing through `fs`.
    #[must_use]
    pub fn new(ledger: &'a BackupLedger, fs: &'a dyn FileSystemOps) -> Self {
        Self { ledger, fs }
    }

    /// Restore the file at `path` from the record for `key`.
    ///
    /// With no record, `fallback` is written when given; otherwise the file
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`TargetError`] if the record cannot be read or the file
    /// cannot be written or deleted.
    pub fn restore(
        &self,
        key: TargetKey,
        path: &Path,
        fallback: Option<&[u8]>,
    ) -> Result<RestoreOutcome, TargetError> {
        let record = self
            .ledger
            .read(key)
            .map_err(|e| TargetError::Unexpected(format!("{e:#}")))?;

        match (record, fallback) {
            (None, None) => Ok(RestoreOutcome::NoBackup),
            (None, Some(value)) => {
                self.fs
                    .write(path, value)
                    .map_err(|e| TargetError::from_io(path, e))?;
                Ok(RestoreOutcome::FallbackWritten)
            }
            (Some(BackupPayload::Absent), _) => {
                let removed = self
                    .fs
                    .remove_file(path)
                    .map_err(|e| TargetError::from_io(path, e))?;
                Ok(if removed {
                    RestoreOutcome::Removed
                } else {
                    RestoreOutcome::AlreadyAbsent
                })
            }
            (Some(BackupPayload::Content(bytes)), _) => {
                self.fs
                    .write(path, &bytes)
                    .map_err(|e| TargetError::from_io(path, e))?;
                Ok(RestoreOutcome::Restored)
            }
        }
    }
}
