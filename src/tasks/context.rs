//! Everything a task needs, passed explicitly instead of held globally.
use std::path::PathBuf;
use std::sync::Arc;

use crate::backup::BackupLedger;
use crate::blocks::DriftCache;
use crate::config::{Environment, Settings, TargetPaths};
use crate::console::{self, CodepageStore, ConsoleTarget};
use crate::discovery::Discovery;
use crate::exec::Executor;
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::platform::Platform;
use crate::resources::Resource;
use crate::resources::console::ConsoleResource;
use crate::resources::editor::EditorResource;
use crate::resources::profile::ProfileResource;
use crate::target::TargetKey;

/// Shared context for task execution.
pub struct Context {
    /// Loaded settings.
    pub settings: Arc<Settings>,
    /// Resolved managed files.
    pub paths: Arc<TargetPaths>,
    /// Installed shells, terminals and editor.
    pub discovery: Arc<Discovery>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Filesystem operation abstraction (injectable for testing).
    pub fs_ops: Arc<dyn FileSystemOps>,
    /// Console codepage storage.
    pub codepages: Arc<dyn CodepageStore>,
    /// Pre-tool snapshots.
    pub ledger: Arc<BackupLedger>,
    /// Drift reports of the current detection cycle.
    pub cache: Arc<DriftCache>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("paths", &self.paths)
            .field("discovery", &self.discovery)
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("executor", &"<dyn Executor>")
            .field("fs_ops", &"<dyn FileSystemOps>")
            .field("codepages", &"<dyn CodepageStore>")
            .field("backup_dir", &self.ledger.dir())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build a context over the real filesystem, probing for installed
    /// tools.
    ///
    /// `backup_dir` is the already-resolved ledger location.
    #[must_use]
    pub fn new(
        settings: Settings,
        env: &Environment,
        backup_dir: PathBuf,
        platform: Platform,
        log: Arc<dyn Log>,
        dry_run: bool,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let fs_ops: Arc<dyn FileSystemOps> = Arc::new(SystemFileSystemOps);
        let paths = TargetPaths::resolve(env, &settings.paths);
        let discovery = Discovery::probe(
            env,
            &settings.paths,
            &paths,
            executor.as_ref(),
            fs_ops.as_ref(),
        );
        Self {
            paths: Arc::new(paths),
            discovery: Arc::new(discovery),
            platform: Arc::new(platform),
            log,
            dry_run,
            executor,
            codepages: default_codepage_store(),
            ledger: Arc::new(BackupLedger::new(backup_dir, Arc::clone(&fs_ops))),
            cache: Arc::new(DriftCache::new(settings.cache_capacity)),
            fs_ops,
            settings: Arc::new(settings),
        }
    }

    /// Create a copy of this context with a different logger.
    ///
    /// All other fields are shared (via `Arc`). The session uses this to
    /// hand the background worker a channel-backed logger.
    #[must_use]
    pub fn with_log(&self, log: Arc<dyn Log>) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            paths: Arc::clone(&self.paths),
            discovery: Arc::clone(&self.discovery),
            platform: Arc::clone(&self.platform),
            log,
            dry_run: self.dry_run,
            executor: Arc::clone(&self.executor),
            fs_ops: Arc::clone(&self.fs_ops),
            codepages: Arc::clone(&self.codepages),
            ledger: Arc::clone(&self.ledger),
            cache: Arc::clone(&self.cache),
        }
    }

    /// Replace the filesystem; the ledger is rebuilt over it.
    #[must_use]
    pub fn with_fs_ops(mut self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        self.ledger = Arc::new(BackupLedger::new(
            self.ledger.dir().to_path_buf(),
            Arc::clone(&fs_ops),
        ));
        self.fs_ops = fs_ops;
        self
    }

    /// Replace the codepage store.
    #[must_use]
    pub fn with_codepages(mut self, codepages: Arc<dyn CodepageStore>) -> Self {
        self.codepages = codepages;
        self
    }

    /// Replace the discovery facts.
    #[must_use]
    pub fn with_discovery(mut self, discovery: Discovery) -> Self {
        self.discovery = Arc::new(discovery);
        self
    }

    /// Locale rendered into the templates.
    #[must_use]
    pub fn locale(&self) -> &str {
        self.settings.effective_locale()
    }

    /// Console sub-targets of every discovered terminal host.
    #[must_use]
    pub fn console_targets(&self) -> Vec<ConsoleTarget> {
        self.discovery
            .console_hosts()
            .into_iter()
            .map(ConsoleTarget::new)
            .collect()
    }

    /// Codepage consoles fall back to when UTF-8 is removed.
    #[must_use]
    pub fn system_codepage(&self) -> u32 {
        console::system_default_codepage(
            self.settings.system_codepage(),
            self.codepages.as_ref(),
            self.executor.as_ref(),
        )
    }

    /// The console resource, optionally restoring unrecorded hosts to
    /// `fallback`.
    #[must_use]
    pub fn console_resource(&self, fallback: Option<u32>) -> ConsoleResource<'_> {
        let resource =
            ConsoleResource::new(self.console_targets(), self.codepages.as_ref(), &self.ledger);
        match fallback {
            Some(cp) => resource.with_fallback(cp),
            None => resource,
        }
    }

    /// Resource managing `key`.
    #[must_use]
    pub fn resource(&self, key: TargetKey) -> Box<dyn Resource + '_> {
        let fs = self.fs_ops.as_ref();
        let locale = self.locale();
        match key {
            TargetKey::Ps5 | TargetKey::Ps7 => {
                let path = if key == TargetKey::Ps5 {
                    &self.paths.ps5_profile
                } else {
                    &self.paths.ps7_profile
                };
                Box::new(
                    ProfileResource::powershell(key, path, locale, &self.ledger, fs)
                        .with_cache(&self.cache),
                )
            }
            TargetKey::GitBash => Box::new(
                ProfileResource::posix_shell(&self.paths.bashrc, locale, &self.ledger, fs)
                    .with_cache(&self.cache),
            ),
            TargetKey::VsCode => Box::new(
                EditorResource::new(&self.paths.vscode_settings, locale, &self.ledger, fs)
                    .with_cache(&self.cache),
            ),
            TargetKey::Console => Box::new(self.console_resource(None)),
        }
    }
}

/// The registry on Windows, an in-process store elsewhere.
fn default_codepage_store() -> Arc<dyn CodepageStore> {
    #[cfg(windows)]
    {
        Arc::new(console::RegistryCodepageStore)
    }
    #[cfg(not(windows))]
    {
        Arc::new(console::MemoryCodepageStore::new())
    }
}
