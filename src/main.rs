//! `encfix` command-line entry point.
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use encfix_cli::cli::{Cli, Command};
use encfix_cli::commands;
use encfix_cli::logging::{self, Logger};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let name = args.command.log_name();
    logging::init_subscriber(args.verbose, name);
    let log = Arc::new(Logger::new(name));

    match &args.command {
        Command::Detect(opts) => commands::detect::run(&args.global, opts, &log),
        Command::Apply(opts) => commands::apply::run(&args.global, opts, &log),
        Command::Restore(opts) => commands::restore::run(&args.global, opts, &log),
        Command::ResetDefault(opts) => commands::reset::run(&args.global, opts, &log),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
