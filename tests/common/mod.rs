// Shared helpers for integration tests.
//
// Provides a temporary home directory with a backup directory next to it and
// a fluent builder for a task `Context` over the real filesystem, so each
// integration test can run tasks without touching the user's files or
// spawning shells.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use encfix_cli::backup::BackupLedger;
use encfix_cli::blocks::DriftCache;
use encfix_cli::config::{Environment, Settings, TargetPaths};
use encfix_cli::console::{CodepageStore, MemoryCodepageStore};
use encfix_cli::discovery::Discovery;
use encfix_cli::exec::{ExecResult, Executor};
use encfix_cli::logging::{ChannelLog, LogEntry};
use encfix_cli::operations::{FileSystemOps, SystemFileSystemOps};
use encfix_cli::platform::{Os, Platform};
use encfix_cli::tasks::Context;

/// Executor that never finds or runs anything.
#[derive(Debug, Default)]
pub struct NoProcesses;

impl Executor for NoProcesses {
    fn run(&self, program: &str, _args: &[&str]) -> anyhow::Result<ExecResult> {
        anyhow::bail!("{program}: process spawning disabled in tests")
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.run(program, args)
    }

    fn which(&self, _program: &str) -> Option<PathBuf> {
        None
    }
}

/// An isolated home directory backed by a [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    /// Temporary directory holding `home/` and `backups/`.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create `home/` and leave `backups/` to be created on first write.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("home")).expect("create home dir");
        Self { root }
    }

    /// The managed home directory.
    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    /// The backup ledger directory.
    pub fn backup_dir(&self) -> PathBuf {
        self.root.path().join("backups")
    }

    /// The Git Bash rc file under the test home.
    pub fn bashrc(&self) -> PathBuf {
        self.home().join(".bashrc")
    }

    /// Write `content` to `path`, creating parent directories.
    pub fn write(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(path, content).expect("write file");
    }

    /// Text of `path`, or `None` when it does not exist.
    pub fn read(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

/// Fluent builder for a [`Context`] over an [`IntegrationTestContext`].
pub struct TestContextBuilder<'a> {
    env: &'a IntegrationTestContext,
    discovery: Discovery,
    settings: Settings,
    codepages: Arc<dyn CodepageStore>,
    dry_run: bool,
}

impl<'a> TestContextBuilder<'a> {
    /// Begin with Git Bash and VS Code discovered and no console hosts.
    pub fn new(env: &'a IntegrationTestContext) -> Self {
        Self {
            env,
            discovery: Discovery {
                git_bash: Some(PathBuf::from("bash.exe")),
                vscode: true,
                ..Discovery::default()
            },
            settings: Settings::default(),
            codepages: Arc::new(MemoryCodepageStore::new()),
            dry_run: false,
        }
    }

    /// Replace the discovery facts.
    pub fn with_discovery(mut self, discovery: Discovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Use `store` for console codepages.
    pub fn with_codepages(mut self, store: Arc<dyn CodepageStore>) -> Self {
        self.codepages = store;
        self
    }

    /// Preview instead of writing.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Finish building; the receiver yields everything the tasks logged.
    pub fn build(self) -> (Context, Receiver<LogEntry>) {
        let (log, rx) = ChannelLog::new();
        let environment = Environment::for_home(self.env.home());
        let fs_ops: Arc<dyn FileSystemOps> = Arc::new(SystemFileSystemOps);
        let ctx = Context {
            paths: Arc::new(TargetPaths::resolve(&environment, &self.settings.paths)),
            discovery: Arc::new(self.discovery),
            platform: Arc::new(Platform::new(Os::Windows)),
            log: Arc::new(log),
            dry_run: self.dry_run,
            executor: Arc::new(NoProcesses),
            codepages: self.codepages,
            ledger: Arc::new(BackupLedger::new(
                self.env.backup_dir(),
                Arc::clone(&fs_ops),
            )),
            cache: Arc::new(DriftCache::new(self.settings.cache_capacity)),
            fs_ops,
            settings: Arc::new(self.settings),
        };
        (ctx, rx)
    }
}
