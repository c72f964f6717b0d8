//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "encfix",
    about = "UTF-8 console and locale configuration for Windows shells",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without writing files, the registry or backups
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Settings file (default: <config dir>/Code-encoding-fix/settings.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backup directory (overrides ENCFIX_BACKUP_DIR and settings)
    #[arg(long, global = true, value_name = "PATH")]
    pub backup_dir: Option<PathBuf>,

    /// Home directory to manage instead of the current user's
    #[arg(long, global = true, value_name = "PATH")]
    pub home: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report the configuration status of every target
    Detect(DetectOpts),
    /// Back up and configure targets for UTF-8
    Apply(TargetOpts),
    /// Return targets to their state before the first apply
    Restore(TargetOpts),
    /// Set every console to the system default codepage
    ResetDefault(ResetOpts),
    /// Print version information
    Version,
}

/// Options for the `detect` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct DetectOpts {
    /// Run each detected shell once and drop those that do not respond
    #[arg(long)]
    pub verify: bool,
}

/// Target selection for `apply` and `restore`.
#[derive(Parser, Debug, Clone, Default)]
pub struct TargetOpts {
    /// Skip specific targets
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Process only specific targets
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}

/// Options for the `reset-default` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct ResetOpts {
    /// Codepage to write (default: settings, then the active OEM codepage)
    #[arg(long)]
    pub codepage: Option<u32>,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn log_name(&self) -> &'static str {
        match self {
            Self::Detect(_) => "detect",
            Self::Apply(_) => "apply",
            Self::Restore(_) => "restore",
            Self::ResetDefault(_) => "reset-default",
            Self::Version => "version",
        }
    }
}
