//! Global tracing setup: terminal rendering plus the per-run log file.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::{Level, Metadata};

use super::utils::{clock, log_file_path, started_at, strip_ansi};

pub(super) const STAGE_TARGET: &str = "encfix::stage";
pub(super) const SUCCESS_TARGET: &str = "encfix::success";
pub(super) const DRY_RUN_TARGET: &str = "encfix::dry_run";

/// How a log line is presented, from its level and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    Success,
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    fn of(meta: &Metadata<'_>) -> Self {
        match (*meta.level(), meta.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, SUCCESS_TARGET) => Self::Success,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Plain-text form written to the run log.
    fn plain(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("==> {msg}"),
            Self::Success => format!("    [ok] {msg}"),
            Self::DryRun => format!("    [dry run] {msg}"),
            Self::Error => format!("    [error] {msg}"),
            Self::Warn => format!("    [warn] {msg}"),
            Self::Info => format!("    {msg}"),
            Self::Debug => format!("    [debug] {msg}"),
        }
    }

    /// Colored form shown in the terminal.
    fn colored(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::Success => format!("  \x1b[32m✓\x1b[0m {msg}"),
            Self::DryRun => format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
            Self::Error => format!("\x1b[31mERROR\x1b[0m {msg}"),
            Self::Warn => format!("\x1b[33mWARN\x1b[0m  {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Pulls the `message` field out of an event.
#[derive(Default)]
struct Message(String);

impl tracing::field::Visit for Message {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }
}

fn message_of(event: &tracing::Event<'_>) -> String {
    let mut message = Message::default();
    event.record(&mut message);
    message.0
}

/// Layer appending every event to `<command>.log`, one timestamped plain
/// line each.
///
/// The file is truncated at the start of each run, so it always describes
/// the most recent apply, restore or detect.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Start a fresh log for `command`. `None` when the file cannot be
    /// created.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version = option_env!("ENCFIX_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
        fs::write(
            &path,
            format!("# encfix {version} {command}, started {}\n", started_at()),
        )
        .ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let kind = Kind::of(event.metadata());
        let line = kind.plain(&strip_ansi(&message_of(event)));
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "[{}] {line}", clock()).ok();
        }
    }
}

/// Terminal rendering of events.
struct ConsoleFormat;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let kind = Kind::of(event.metadata());
        writeln!(writer, "{}", kind.colored(&message_of(event)))
    }
}

/// Install the global subscriber. Call once, before anything logs.
///
/// Warnings and errors go to stderr, everything else to stdout; `-v` or
/// `RUST_LOG` lowers the terminal level. The run log always records `debug`
/// and above.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let terminal_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let terminal = fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(
            std::io::stderr
                .with_max_level(Level::WARN)
                .and(std::io::stdout.with_min_level(Level::INFO)),
        )
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(terminal_level.into())
                .from_env_lossy(),
        );

    let run_log = FileLayer::new(command).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(terminal)
        .with(run_log)
        .try_init()
        .ok();
}
