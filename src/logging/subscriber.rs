//! Tracing subscriber: console renderer, run log file, and initialisation.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::utils::{log_file_path, now, strip_ansi};

/// Event targets used by [`Logger`](super::Logger) for messages that have
/// no dedicated tracing level.
pub(super) const STAGE_TARGET: &str = "dotlink::stage";
pub(super) const DRY_RUN_TARGET: &str = "dotlink::dry_run";

/// How an event is rendered, derived from its level and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    DryRun,
    Info,
    Debug,
    Warn,
    Error,
}

impl Kind {
    fn of(event: &tracing::Event<'_>) -> Self {
        let meta = event.metadata();
        match (*meta.level(), meta.target()) {
            (tracing::Level::ERROR, _) => Self::Error,
            (tracing::Level::WARN, _) => Self::Warn,
            (tracing::Level::INFO, STAGE_TARGET) => Self::Stage,
            (tracing::Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (tracing::Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Plain-text line for the run log.
    fn file_line(self, time: &str, msg: &str) -> String {
        match self {
            Self::Stage => format!("[{time}] ==> {msg}"),
            Self::DryRun => format!("[{time}]     [dry run] {msg}"),
            Self::Info => format!("[{time}]     {msg}"),
            Self::Debug => format!("[{time}]     [debug] {msg}"),
            Self::Warn => format!("[{time}]     [warn] {msg}"),
            Self::Error => format!("[{time}]     [error] {msg}"),
        }
    }

    /// Coloured line for the terminal.
    fn console_line(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::DryRun => format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
            Self::Warn => format!("\x1b[33mWARN\x1b[0m  {msg}"),
            Self::Error => format!("\x1b[31mERROR\x1b[0m {msg}"),
        }
    }
}

/// Pulls the formatted `message` field out of an event.
#[derive(Debug, Default)]
struct Message(String);

impl Message {
    fn of(event: &tracing::Event<'_>) -> String {
        let mut visitor = Self::default();
        event.record(&mut visitor);
        visitor.0
    }
}

impl Visit for Message {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.0);
        }
    }
}

/// Layer appending every event to the run log, timestamped and without
/// ANSI codes. The file is truncated when the layer is created, so it only
/// ever holds the latest run.
#[derive(Debug)]
pub(crate) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open the log file for `command` under the cache directory.
    ///
    /// Returns `None` when the file cannot be created; the run then logs to
    /// the console only.
    fn for_command(command: &str) -> Option<Self> {
        Self::at(&log_file_path(command)?)
    }

    /// Start a fresh log at `path` with a one-line run header.
    pub(crate) fn at(path: &Path) -> Option<Self> {
        let header = format!(
            "# dotlink {} run started {} UTC\n",
            crate::cli::VERSION,
            now("%Y-%m-%d %H:%M:%S"),
        );
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let line = Kind::of(event).file_line(&now("%H:%M:%S"), &strip_ansi(&Message::of(event)));
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Event formatter for terminal output.
#[derive(Debug)]
struct Console;

impl<S, N> FormatEvent<S, N> for Console
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        writeln!(writer, "{}", Kind::of(event).console_line(&Message::of(event)))
    }
}

/// Install the global subscriber. Call once, before anything is logged.
///
/// The console shows `INFO` and up (`DEBUG` with `verbose`); warnings and
/// errors go to stderr, the rest to stdout. The run log under the cache
/// directory always receives `DEBUG` and up.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .event_format(Console)
                .with_writer(writer)
                .with_filter(console_level),
        )
        .with(FileLayer::for_command(command).map(|layer| layer.with_filter(LevelFilter::DEBUG)))
        .init();
}
