//! VS Code user settings.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{Resource, ResourceChange, log_backup, read_target, write_target};
use crate::backup::{BackupLedger, RestoreEngine};
use crate::blocks::{DriftCache, DriftReport};
use crate::editor::{EMPTY_SETTINGS, EditorBlock, analyze_settings, inject_block};
use crate::error::TargetError;
use crate::logging::Log;
use crate::operations::FileSystemOps;
use crate::target::TargetKey;

/// The editor's `settings.json`, converged by splicing in an [`EditorBlock`].
#[derive(Debug)]
pub struct EditorResource<'a> {
    path: PathBuf,
    block: EditorBlock,
    ledger: &'a BackupLedger,
    fs: &'a dyn FileSystemOps,
    cache: Option<&'a DriftCache>,
}

impl<'a> EditorResource<'a> {
    /// Settings file at `path`, exporting `locale` to the integrated terminal.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        locale: &str,
        ledger: &'a BackupLedger,
        fs: &'a dyn FileSystemOps,
    ) -> Self {
        Self {
            path: path.into(),
            block: EditorBlock::new(locale),
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
        match self.fs.read_text(&self.path) {
            Ok(text) => analyze_settings(text.as_deref()),
            Err(e) => DriftReport::unreadable(e),
        }
    }
}

impl Resource for EditorResource<'_> {
    fn key(&self) -> TargetKey {
        TargetKey::VsCode
    }

    fn description(&self) -> String {
        format!("{} ({})", TargetKey::VsCode.label(), self.path.display())
    }

    fn current_state(&self) -> DriftReport {
        match self.cache {
            Some(cache) => cache.get_or_insert_with(
                &self.path,
                self.fs.stamp(&self.path),
                &self.block.fingerprint(),
                || self.analyze_now(),
            ),
            None => self.analyze_now(),
        }
    }

    fn apply(&self, log: &dyn Log) -> Result<ResourceChange> {
        let current = read_target(self.fs, &self.path)?;
        let text = match current.as_deref() {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                String::from_utf8_lossy(bytes).into_owned()
            }
            _ => EMPTY_SETTINGS.to_string(),
        };

        let updated = match inject_block(&text, &self.block) {
            Ok(updated) => updated,
            Err(e) => {
                let err = TargetError::ParseFailure {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                };
                log.warn(&format!("{}: {err}; file left unchanged", self.key()));
                return Ok(ResourceChange::Skipped {
                    reason: e.to_string(),
                });
            }
        };
        if current.is_some() && updated == text {
            return Ok(ResourceChange::AlreadyCorrect);
        }

        let outcome = self
            .ledger
            .ensure(self.key(), current.as_deref(), EditorBlock::has_both_markers)
            .with_context(|| format!("backing up {}", self.key().label()))?;
        log_backup(log, self.key(), outcome);

        write_target(self.fs, &self.path, updated.as_bytes())?;
        Ok(ResourceChange::Applied)
    }

    fn restore(&self, log: &dyn Log) -> Result<ResourceChange> {
        let outcome =
            RestoreEngine::new(self.ledger, self.fs).restore(self.key(), &self.path, None)?;
        log.debug(&format!("{}: {outcome}", self.description()));
        Ok(outcome.into())
    }
}
