//! Named units of work, one per target and operation.
pub mod configure;
pub mod context;
pub mod detect;
pub mod reset;
pub mod restore;

pub use context::Context;
pub use detect::detect;

use anyhow::Result;

use crate::error::TargetError;
use crate::logging::TaskStatus;
use crate::target::TargetKey;

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use encfix_cli::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("no backup, skipped".into());
/// let dry = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(dry, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped.
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

/// Counters for tasks that touch several sub-targets.
///
/// # Examples
///
/// ```
/// use encfix_cli::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 0 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok");
/// assert_eq!(stats.summary(true), "1 would change, 2 already ok");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Number of items changed.
    pub changed: u32,
    /// Number of items already in the wanted state.
    pub already_ok: u32,
    /// Number of items left alone.
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 1 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the appropriate `TaskResult`.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether this task applies to this machine.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if a target or the backup ledger cannot be read or
    /// written.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// One configure task per target, in processing order.
#[must_use]
pub fn configure_tasks(keys: &[TargetKey]) -> Vec<Box<dyn Task>> {
    keys.iter()
        .map(|&key| Box::new(configure::ConfigureTarget::new(key)) as Box<dyn Task>)
        .collect()
}

/// One restore task per target, in processing order.
#[must_use]
pub fn restore_tasks(keys: &[TargetKey]) -> Vec<Box<dyn Task>> {
    keys.iter()
        .map(|&key| Box::new(restore::RestoreTarget::new(key)) as Box<dyn Task>)
        .collect()
}

/// Execute a task, recording the result in the logger.
///
/// A missing file is not a failure: it downgrades the task to skipped.
pub fn execute(task: &dyn Task, ctx: &Context) -> TaskStatus {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return TaskStatus::NotApplicable;
    }

    ctx.log.stage(task.name());

    let (status, message) = match task.run(ctx) {
        Ok(TaskResult::Ok) => (TaskStatus::Ok, None),
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            (TaskStatus::Skipped, Some(reason))
        }
        Ok(TaskResult::DryRun) => (TaskStatus::DryRun, None),
        Err(e) if e.downcast_ref::<TargetError>().is_some_and(TargetError::is_soft) => {
            ctx.log.warn(&format!("{}: {e:#}", task.name()));
            (TaskStatus::Skipped, Some(format!("{e:#}")))
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            (TaskStatus::Failed, Some(format!("{e:#}")))
        }
    };
    ctx.log.record_task(task.name(), status, message.as_deref());
    status
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::LogEntry;
    use crate::operations::MockFileSystemOps;
    use test_helpers::make_logged_context;

    /// A mock task for testing `execute()`.
    struct MockTask {
        should_run: bool,
        result: fn() -> Result<TaskResult>,
    }

    impl Task for MockTask {
        fn name(&self) -> &str {
            "mock"
        }
        fn should_run(&self, _ctx: &Context) -> bool {
            self.should_run
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            (self.result)()
        }
    }

    fn run_mock(should_run: bool, result: fn() -> Result<TaskResult>) -> (TaskStatus, Vec<LogEntry>) {
        let (ctx, rx) = make_logged_context(MockFileSystemOps::new());
        let status = execute(&MockTask { should_run, result }, &ctx);
        drop(ctx);
        (status, rx.iter().collect())
    }

    fn recorded(entries: &[LogEntry]) -> Option<(TaskStatus, Option<String>)> {
        entries.iter().find_map(|e| match e {
            LogEntry::Task {
                status, message, ..
            } => Some((*status, message.clone())),
            _ => None,
        })
    }

    #[test]
    fn execute_skips_non_applicable_task() {
        let (status, entries) = run_mock(false, || Ok(TaskResult::Ok));
        assert_eq!(status, TaskStatus::NotApplicable);
        assert!(!entries.iter().any(|e| matches!(e, LogEntry::Stage(_))));
    }

    #[test]
    fn execute_records_ok_task() {
        let (status, entries) = run_mock(true, || Ok(TaskResult::Ok));
        assert_eq!(status, TaskStatus::Ok);
        assert_eq!(recorded(&entries), Some((TaskStatus::Ok, None)));
    }

    #[test]
    fn execute_records_skip_reason() {
        let (status, entries) = run_mock(true, || Ok(TaskResult::Skipped("why".into())));
        assert_eq!(status, TaskStatus::Skipped);
        assert_eq!(
            recorded(&entries),
            Some((TaskStatus::Skipped, Some("why".into())))
        );
    }

    #[test]
    fn execute_records_failed_task() {
        let (status, entries) = run_mock(true, || {
            Err(TargetError::PermissionDenied {
                path: "/x".into(),
            }
            .into())
        });
        assert_eq!(status, TaskStatus::Failed);
        assert!(entries.iter().any(|e| matches!(e, LogEntry::Error(m) if m.contains("permission denied"))));
    }

    #[test]
    fn not_found_downgrades_to_skipped() {
        let (status, _) = run_mock(true, || {
            Err(TargetError::NotFound {
                what: "/x".into(),
            }
            .into())
        });
        assert_eq!(status, TaskStatus::Skipped);
    }

    #[test]
    fn stats_accumulate() {
        let mut stats = TaskStats::new();
        stats += TaskStats {
            changed: 1,
            already_ok: 0,
            skipped: 2,
        };
        stats += TaskStats {
            changed: 1,
            already_ok: 3,
            skipped: 0,
        };
        assert_eq!(stats.summary(false), "2 changed, 3 already ok, 2 skipped");
    }

    #[test]
    fn task_lists_follow_requested_keys() {
        let names: Vec<String> = configure_tasks(&[TargetKey::GitBash, TargetKey::VsCode])
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["Configure Git Bash", "Configure VS Code"]);
        assert_eq!(restore_tasks(&TargetKey::ALL).len(), 5);
    }
}
