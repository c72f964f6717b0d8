//! Log backend for the background worker.
use std::sync::mpsc::{self, Receiver, Sender};

use super::types::{Log, TaskStatus};

/// One message produced on the worker, replayed on the foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// A stage header entry.
    Stage(String),
    /// An informational entry.
    Info(String),
    /// A completed change.
    Success(String),
    /// A debug entry.
    Debug(String),
    /// A warning entry.
    Warn(String),
    /// An error entry.
    Error(String),
    /// A dry-run entry.
    DryRun(String),
    /// A task result for the summary.
    Task {
        /// Task name.
        name: String,
        /// Final status.
        status: TaskStatus,
        /// Optional detail.
        message: Option<String>,
    },
}

impl LogEntry {
    /// Replay this entry through `log`.
    pub fn replay(&self, log: &dyn Log) {
        match self {
            Self::Stage(msg) => log.stage(msg),
            Self::Info(msg) => log.info(msg),
            Self::Success(msg) => log.success(msg),
            Self::Debug(msg) => log.debug(msg),
            Self::Warn(msg) => log.warn(msg),
            Self::Error(msg) => log.error(msg),
            Self::DryRun(msg) => log.dry_run(msg),
            Self::Task {
                name,
                status,
                message,
            } => log.record_task(name, *status, message.as_deref()),
        }
    }
}

/// Implement the display methods of [`Log`] by sending each message as the
/// corresponding [`LogEntry`] variant.
macro_rules! channel_log_methods {
    ($($method:ident => $variant:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.send(LogEntry::$variant(msg.to_string()));
            }
        )+
    };
}

/// [`Log`] implementation that forwards every entry over a channel.
///
/// Entries sent after the receiver is gone are dropped.
#[derive(Debug, Clone)]
pub struct ChannelLog {
    tx: Sender<LogEntry>,
}

impl ChannelLog {
    /// Create a log and the receiving end its entries arrive on.
    #[must_use]
    pub fn new() -> (Self, Receiver<LogEntry>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, entry: LogEntry) {
        self.tx.send(entry).ok();
    }
}

impl Log for ChannelLog {
    channel_log_methods! {
        stage   => Stage,
        info    => Info,
        success => Success,
        debug   => Debug,
        warn    => Warn,
        error   => Error,
        dry_run => DryRun,
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.send(LogEntry::Task {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}
