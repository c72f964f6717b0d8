//! Command: return the selected targets to their pre-tool state.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, select_targets, warn_unmatched_filters};
use crate::cli::{GlobalOpts, TargetOpts};
use crate::logging::{Log, Logger, TaskStatus};
use crate::session::Session;
use crate::tasks::{self, Context, Task};
use crate::tasks::restore::ClearBackups;

/// Run the restore command.
///
/// Every step runs even after a failure; the backups are deleted only when
/// all targets were restored and no filter narrowed the selection.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or any step failed.
pub fn run(global: &GlobalOpts, opts: &TargetOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.as_ref())?;
    warn_unmatched_filters(opts, log.as_ref());
    let keys = select_targets(opts);
    let full = opts.only.is_empty() && opts.skip.is_empty();

    let ctx = setup.into_context(Arc::clone(log) as Arc<dyn Log>);
    let steps = tasks::restore_tasks(&keys);
    let failed = Session::new().run(&ctx, log.as_ref(), move |worker| {
        restore_all(&steps, full, worker)
    })?;

    log.print_summary();
    if failed > 0 {
        anyhow::bail!("{failed} task(s) failed");
    }
    Ok(())
}

/// Run every step, then clear the ledger after a clean full pass.
///
/// Returns the number of failed steps, counting a failed ledger cleanup.
pub fn restore_all(steps: &[Box<dyn Task>], full: bool, ctx: &Context) -> usize {
    let failed = steps
        .iter()
        .filter(|step| tasks::execute(step.as_ref(), ctx) == TaskStatus::Failed)
        .count();
    if failed > 0 {
        ctx.log
            .warn(&format!("{failed} step(s) failed; backups kept in {}", ctx.ledger.dir().display()));
        return failed;
    }
    if !full {
        ctx.log.info("partial restore; backups kept");
        return 0;
    }
    usize::from(tasks::execute(&ClearBackups, ctx) == TaskStatus::Failed)
}
