//! Command: force every console to the system default codepage.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, run_tasks_to_completion};
use crate::cli::{GlobalOpts, ResetOpts};
use crate::logging::{Log, Logger};
use crate::tasks::Task;
use crate::tasks::reset::ResetConsoleCodepage;

/// Run the reset-default command.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or any console could not
/// be written.
pub fn run(global: &GlobalOpts, opts: &ResetOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.as_ref())?;
    let ctx = setup.into_context(Arc::clone(log) as Arc<dyn Log>);

    let task = ResetConsoleCodepage::new(opts.codepage);
    if !task.should_run(&ctx) {
        log.warn("no console hosts found");
    }
    run_tasks_to_completion([&task as &dyn Task], &ctx, log)
}
