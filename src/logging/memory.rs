//! In-memory [`Log`] backend.
use std::sync::Mutex;

use super::types::Log;
use super::utils::strip_ansi;

/// Log level of a captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// [`Log::stage`]
    Stage,
    /// [`Log::info`]
    Info,
    /// [`Log::debug`]
    Debug,
    /// [`Log::warn`]
    Warn,
    /// [`Log::error`]
    Error,
    /// [`Log::dry_run`]
    DryRun,
}

/// A [`Log`] that keeps every message in memory with ANSI codes stripped.
///
/// Used when the caller wants to inspect what a run printed, e.g. to check
/// that a failure line was emitted for a given target.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemoryLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured lines in order.
    #[must_use]
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Captured lines at `level`, text only.
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg)
            .collect()
    }

    /// Whether any line at any level contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, msg)| msg.contains(needle))
    }

    fn push(&self, level: Level, msg: &str) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push((level, strip_ansi(msg)));
        }
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push(Level::Stage, msg);
    }

    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn debug(&self, msg: &str) {
        self.push(Level::Debug, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }

    fn dry_run(&self, msg: &str) {
        self.push(Level::DryRun, msg);
    }
}
