//! Return targets to their recorded pre-tool state.
use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};
use crate::resources::{Resource as _, ResourceChange};
use crate::target::TargetKey;

/// Restore one target from the backup ledger.
///
/// The console target writes the system default codepage to hosts that
/// have no recorded value.
#[derive(Debug)]
pub struct RestoreTarget {
    key: TargetKey,
    name: String,
}

impl RestoreTarget {
    /// Task for `key`.
    #[must_use]
    pub fn new(key: TargetKey) -> Self {
        Self {
            key,
            name: format!("Restore {}", key.label()),
        }
    }
}

impl Task for RestoreTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, ctx: &Context) -> bool {
        match self.key {
            TargetKey::Console => {
                ctx.ledger.has(TargetKey::Console) || !ctx.console_targets().is_empty()
            }
            key => ctx.ledger.has(key) || ctx.discovery.is_detected(key),
        }
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would restore {}", ctx.resource(self.key).description()));
            return Ok(TaskResult::DryRun);
        }

        let change = if self.key == TargetKey::Console {
            let fallback = ctx.system_codepage();
            ctx.log
                .debug(&format!("codepage for hosts without a record: {fallback}"));
            ctx.console_resource(Some(fallback))
                .restore(ctx.log.as_ref())?
        } else {
            ctx.resource(self.key).restore(ctx.log.as_ref())?
        };

        match change {
            ResourceChange::Applied => {
                ctx.log.success(&format!("restored {}", self.key));
                Ok(TaskResult::Ok)
            }
            ResourceChange::AlreadyCorrect => {
                ctx.log.info(&format!("{} already in its original state", self.key));
                Ok(TaskResult::Ok)
            }
            ResourceChange::Skipped { reason } => {
                ctx.log.warn(&format!("{}: {reason}", self.key));
                Ok(TaskResult::Skipped(reason))
            }
        }
    }
}

/// Delete every backup record once all targets were restored.
#[derive(Debug)]
pub struct ClearBackups;

impl Task for ClearBackups {
    fn name(&self) -> &'static str {
        "Clear backups"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.ledger.has_any()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "would remove backups in {}",
                ctx.ledger.dir().display()
            ));
            return Ok(TaskResult::DryRun);
        }
        ctx.ledger.clear_all().context("clearing backups")?;
        ctx.log
            .info(&format!("removed backups in {}", ctx.ledger.dir().display()));
        Ok(TaskResult::Ok)
    }
}
