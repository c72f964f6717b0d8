//! Command: report the configuration status of every target.
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::{DetectOpts, GlobalOpts};
use crate::logging::{Log, Logger, TaskStatus};
use crate::session::Session;
use crate::status::{DetectionReport, OverallStatus};
use crate::tasks::{self, Context};

/// Run the detect command.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or the detection worker
/// is lost. Per-target failures only change that target's status.
pub fn run(global: &GlobalOpts, opts: &DetectOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.as_ref())?;
    let ctx = setup.into_context(Arc::clone(log) as Arc<dyn Log>);
    let ctx = if opts.verify { verified(ctx) } else { ctx };

    log.stage("Detecting targets");
    let report = Session::new().run(&ctx, log.as_ref(), tasks::detect)?;
    print_report(&report, log.as_ref());
    Ok(())
}

/// Drop shells that are installed but do not start.
fn verified(ctx: Context) -> Context {
    let mut discovery = (*ctx.discovery).clone();
    for key in discovery.verify(ctx.executor.as_ref()) {
        ctx.log
            .warn(&format!("{key}: found but did not respond, treated as not detected"));
    }
    ctx.with_discovery(discovery)
}

/// Log one line per target plus the overall summary.
pub fn print_report(report: &DetectionReport, log: &dyn Log) {
    for entry in report.entries() {
        let line = format!("{:<22} {}", entry.key.label(), entry.status);
        if entry.status.is_detected() {
            log.info(&line);
        } else {
            log.debug(&line);
        }
    }
    let overall = report.overall();
    let summary = format!("overall: {overall}");
    if overall == OverallStatus::AllConfigured {
        log.success(&summary);
    } else {
        log.info(&summary);
    }
    log.record_task("Detect", TaskStatus::Ok, Some(&overall.to_string()));
}
