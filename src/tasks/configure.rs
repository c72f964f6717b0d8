//! Converge one target to its canonical UTF-8 configuration.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::resources::ResourceChange;
use crate::target::TargetKey;

/// Back up, then apply the managed configuration of one target.
#[derive(Debug)]
pub struct ConfigureTarget {
    key: TargetKey,
    name: String,
}

impl ConfigureTarget {
    /// Task for `key`.
    #[must_use]
    pub fn new(key: TargetKey) -> Self {
        Self {
            key,
            name: format!("Configure {}", key.label()),
        }
    }
}

impl Task for ConfigureTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.discovery.is_detected(self.key)
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resource = ctx.resource(self.key);
        let report = resource.current_state();
        ctx.log.debug(&format!(
            "{}: {} ({})",
            resource.description(),
            report.state,
            report.summary
        ));

        if !report.state.needs_apply() {
            ctx.log.info(&format!("{} already configured", self.key));
            return Ok(TaskResult::Ok);
        }
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would configure {}", resource.description()));
            return Ok(TaskResult::DryRun);
        }

        match resource.apply(ctx.log.as_ref())? {
            ResourceChange::Applied => {
                ctx.log
                    .success(&format!("configured {}", resource.description()));
                Ok(TaskResult::Ok)
            }
            ResourceChange::AlreadyCorrect => {
                ctx.log.info(&format!("{} already configured", self.key));
                Ok(TaskResult::Ok)
            }
            ResourceChange::Skipped { reason } => Ok(TaskResult::Skipped(reason)),
        }
    }
}
