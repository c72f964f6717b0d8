//! UTF-8 encoding fixer for Windows shells and consoles.
//!
//! Manages a marker-delimited block of locale and encoding statements in
//! PowerShell profiles and the Git Bash rc file, a comment-delimited block
//! of encoding keys in VS Code settings, and the per-host console codepage.
//! Every change is preceded by a write-once backup so `restore` can return
//! each target to its pre-tool state.
//!
//! The public API is organised into layers:
//!
//! - **[`blocks`]**, **[`editor`]**: analyze, inject and strip managed blocks
//! - **[`backup`]**: write-once snapshots and the restore engine
//! - **[`console`]**: console codepage storage and state transitions
//! - **[`resources`]**: one `current_state + apply + restore` primitive per target
//! - **[`tasks`]**: named units of work executed against an explicit [`tasks::Context`]
//! - **[`session`]**: single background worker with log marshalling
//! - **[`commands`]**: subcommand orchestration (`detect`, `apply`, `restore`, `reset-default`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod backup;
pub mod blocks;
pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod discovery;
pub mod editor;
pub mod error;
pub mod exec;
pub mod logging;
pub mod operations;
pub mod platform;
pub mod resources;
pub mod session;
pub mod status;
pub mod target;
pub mod tasks;
