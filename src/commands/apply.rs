//! Command: back up and configure the selected targets.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, run_on_session, select_targets, warn_unmatched_filters};
use crate::cli::{GlobalOpts, TargetOpts};
use crate::logging::{Log, Logger};
use crate::session::Session;
use crate::tasks;

/// Run the apply command.
///
/// Targets are processed in order; the first hard failure stops the run
/// and leaves earlier targets configured.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or a target fails.
pub fn run(global: &GlobalOpts, opts: &TargetOpts, log: &Arc<Logger>) -> Result<()> {
    let version = super::version::version();
    log.info(&format!("encfix {version}"));

    let setup = CommandSetup::init(global, log.as_ref())?;
    warn_unmatched_filters(opts, log.as_ref());
    let keys = select_targets(opts);
    if keys.is_empty() {
        log.warn("no targets selected");
        return Ok(());
    }

    let ctx = setup.into_context(Arc::clone(log) as Arc<dyn Log>);
    let failed = run_on_session(&Session::new(), tasks::configure_tasks(&keys), &ctx, log.as_ref())?;

    log.print_summary();
    if failed > 0 {
        log.error("apply interrupted, inspect log");
        if let Some(path) = log.log_path() {
            log.info(&format!("log: {}", path.display()));
        }
        anyhow::bail!("{failed} task(s) failed");
    }
    if ctx.dry_run {
        log.info("dry run complete, nothing was written");
    } else {
        log.success("apply complete");
    }
    Ok(())
}
