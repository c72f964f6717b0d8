//! Force every console back to the system default codepage.
use anyhow::{Result, bail};

use super::{Context, Task, TaskResult, TaskStats};
use crate::console::ConsoleCodepages;

/// Write one codepage to every console host, ignoring the backup ledger.
#[derive(Debug, Default)]
pub struct ResetConsoleCodepage {
    codepage: Option<u32>,
}

impl ResetConsoleCodepage {
    /// Reset to `codepage`, or to the detected system default when `None`.
    #[must_use]
    pub const fn new(codepage: Option<u32>) -> Self {
        Self { codepage }
    }
}

impl Task for ResetConsoleCodepage {
    fn name(&self) -> &'static str {
        "Reset console codepage"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.console_targets().is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let codepage = self.codepage.unwrap_or_else(|| ctx.system_codepage());
        let targets = ctx.console_targets();

        if ctx.dry_run {
            for target in &targets {
                ctx.log
                    .dry_run(&format!("would set {target} to codepage {codepage}"));
            }
            let stats = TaskStats {
                changed: u32::try_from(targets.len()).unwrap_or(u32::MAX),
                ..TaskStats::default()
            };
            return Ok(stats.finish(ctx));
        }

        let results = ConsoleCodepages::new(ctx.codepages.as_ref(), &ctx.ledger)
            .reset_to_system_default(&targets, codepage);
        let mut stats = TaskStats::new();
        let mut failed = 0usize;
        for sub in &results {
            match &sub.result {
                Ok(()) => {
                    stats.changed += 1;
                    ctx.log
                        .debug(&format!("{}: codepage set to {codepage}", sub.target));
                }
                Err(e) => {
                    stats.skipped += 1;
                    failed += 1;
                    ctx.log.error(&format!("{}: {e}", sub.target));
                }
            }
        }

        if failed > 0 {
            bail!("{failed} of {} console(s) could not be reset", results.len());
        }
        Ok(stats.finish(ctx))
    }
}
