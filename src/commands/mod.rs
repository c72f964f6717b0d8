//! Top-level subcommand orchestration.
pub mod apply;
pub mod detect;
pub mod reset;
pub mod restore;
pub mod version;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::{GlobalOpts, TargetOpts};
use crate::config::{Environment, Settings};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger, TaskStatus};
use crate::platform::Platform;
use crate::session::Session;
use crate::target::TargetKey;
use crate::tasks::{self, Context, Task};

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates environment resolution, settings loading and validation so
/// that each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected platform.
    pub platform: Platform,
    /// Resolved user directories.
    pub env: Environment,
    /// Loaded settings (defaults when no file exists).
    pub settings: Settings,
    /// Resolved backup ledger location.
    pub backup_dir: PathBuf,
    /// Whether to preview instead of writing.
    pub dry_run: bool,
}

impl CommandSetup {
    /// Resolve the environment and load settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// settings file exists but fails to parse.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        let platform = Platform::detect();
        let env = Environment::from_process(global.home.clone())?;

        log.stage("Loading settings");
        let path = global.config.clone().unwrap_or_else(|| env.settings_file());
        let settings = Settings::load(&path)
            .with_context(|| format!("loading settings from {}", path.display()))?;
        log.debug(&format!("settings: {}", path.display()));
        log.debug(&format!("locale: {}", settings.effective_locale()));

        let warnings = settings.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!("  [{}]: {}", warning.item, warning.message));
            }
        }

        let backup_dir =
            env.resolve_backup_dir(global.backup_dir.as_deref(), settings.backup_dir.as_deref());
        log.info(&format!("backups: {}", backup_dir.display()));

        Ok(Self {
            platform,
            env,
            settings,
            backup_dir,
            dry_run: global.dry_run,
        })
    }

    /// Probe installed tools and build the task context.
    #[must_use]
    pub fn build_context(self, log: Arc<dyn Log>, executor: Arc<dyn Executor>) -> Context {
        Context::new(
            self.settings,
            &self.env,
            self.backup_dir,
            self.platform,
            log,
            self.dry_run,
            executor,
        )
    }

    /// [`build_context`](Self::build_context) with the real process runner.
    #[must_use]
    pub fn into_context(self, log: Arc<dyn Log>) -> Context {
        self.build_context(log, Arc::new(SystemExecutor))
    }
}

/// Targets chosen by `--only` and `--skip`, in processing order.
///
/// `--only` wins when both are given.
#[must_use]
pub fn select_targets(opts: &TargetOpts) -> Vec<TargetKey> {
    TargetKey::ALL
        .into_iter()
        .filter(|key| {
            if !opts.only.is_empty() {
                return opts.only.iter().any(|o| key.matches(o));
            }
            !opts.skip.iter().any(|s| key.matches(s))
        })
        .collect()
}

/// Warn about filter entries that select nothing.
pub fn warn_unmatched_filters(opts: &TargetOpts, log: &dyn Log) {
    for filter in opts.only.iter().chain(&opts.skip) {
        if !TargetKey::ALL.into_iter().any(|key| key.matches(filter)) {
            log.warn(&format!("'{filter}' does not name any target"));
        }
    }
}

/// Execute every task in order, print the summary, and bail if any task failed.
///
/// # Errors
///
/// Returns an error if one or more tasks recorded a failure.
pub fn run_tasks_to_completion<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
    log: &Logger,
) -> Result<()> {
    for task in tasks {
        tasks::execute(task, ctx);
    }

    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}

/// Run `tasks` on the session worker, stopping at the first failure.
///
/// Returns the number of tasks that failed (zero or one).
///
/// # Errors
///
/// Returns an error if the session is busy or the worker was lost.
pub fn run_on_session(
    session: &Session,
    tasks: Vec<Box<dyn Task>>,
    ctx: &Context,
    log: &dyn Log,
) -> Result<usize> {
    let failed = session.run(ctx, log, move |worker| {
        for task in &tasks {
            if tasks::execute(task.as_ref(), worker) == TaskStatus::Failed {
                worker
                    .log
                    .error(&format!("{} failed; remaining targets not processed", task.name()));
                return 1;
            }
        }
        0
    })?;
    Ok(failed)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn opts(only: &[&str], skip: &[&str]) -> TargetOpts {
        TargetOpts {
            only: only.iter().map(ToString::to_string).collect(),
            skip: skip.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn no_filters_select_everything_in_order() {
        assert_eq!(select_targets(&opts(&[], &[])), TargetKey::ALL.to_vec());
    }

    #[test]
    fn only_selects_matching_targets() {
        assert_eq!(
            select_targets(&opts(&["bash", "vscode"], &[])),
            vec![TargetKey::GitBash, TargetKey::VsCode]
        );
    }

    #[test]
    fn skip_removes_matching_targets() {
        let selected = select_targets(&opts(&[], &["console", "ps5"]));
        assert!(!selected.contains(&TargetKey::Console));
        assert!(!selected.contains(&TargetKey::Ps5));
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn only_takes_precedence_over_skip() {
        assert_eq!(
            select_targets(&opts(&["pwsh"], &["pwsh"])),
            vec![TargetKey::Ps7]
        );
    }
}
