//! Per-run outcome tracking and the final summary box.
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{LinkError, MAX_FAILURE_EXIT};

/// Why an entry was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry's `when` condition does not hold.
    ConditionFalse,
    /// A valid symlink is already in place.
    AlreadyLinked,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConditionFalse => f.write_str("condition false"),
            Self::AlreadyLinked => f.write_str("already linked"),
        }
    }
}

/// Result of reconciling one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new symlink was made.
    Created,
    /// An existing symlink was swapped for the declared one.
    Replaced {
        /// The old link's referent was missing.
        was_broken: bool,
    },
    /// A `remove` entry was applied.
    Removed {
        /// Something was at the target.
        existed: bool,
    },
    /// Nothing was done.
    Skipped(SkipReason),
    /// The entry could not be reconciled.
    Failed(LinkError),
}

impl Outcome {
    /// Whether this is [`Outcome::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("symlink created"),
            Self::Replaced { was_broken: true } => f.write_str("broken symlink replaced"),
            Self::Replaced { was_broken: false } => f.write_str("symlink replaced"),
            Self::Removed { existed: true } => f.write_str("removed"),
            Self::Removed { existed: false } => f.write_str("already absent"),
            Self::Skipped(reason) => write!(f, "skipped, {reason}"),
            Self::Failed(err) => write!(f, "failed, {err}"),
        }
    }
}

/// Accumulated results of a run.
///
/// Created empty by the driver, filled by the reconciler and the action
/// runner, then read once for the summary and the exit code.
#[derive(Debug, Default)]
pub struct RunReport {
    dry_run: bool,
    links: Vec<(PathBuf, Outcome)>,
    completed_steps: Vec<String>,
    failed_steps: Vec<String>,
    skipped_steps: Vec<String>,
}

impl RunReport {
    /// An empty report.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Record the outcome for `target`, in processing order.
    pub fn record_link(&mut self, target: &Path, outcome: Outcome) {
        self.links.push((target.to_path_buf(), outcome));
    }

    /// A step that succeeded (or would have, in a dry run).
    pub fn record_step_ok(&mut self, title: &str) {
        self.completed_steps.push(title.to_string());
    }

    /// A step that exited non-zero or could not start.
    pub fn record_step_failed(&mut self, title: &str) {
        self.failed_steps.push(title.to_string());
    }

    /// A placeholder step.
    pub fn record_step_skipped(&mut self, title: &str) {
        self.skipped_steps.push(title.to_string());
    }

    /// Link outcomes in processing order.
    #[must_use]
    pub fn links(&self) -> &[(PathBuf, Outcome)] {
        &self.links
    }

    /// Outcome recorded for `target`, if it was processed.
    #[must_use]
    pub fn outcome_for(&self, target: &Path) -> Option<&Outcome> {
        self.links
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, outcome)| outcome)
    }

    /// Titles of post-install steps that exited non-zero or failed to start.
    #[must_use]
    pub fn failed_steps(&self) -> &[String] {
        &self.failed_steps
    }

    /// Titles of placeholder steps.
    #[must_use]
    pub fn skipped_steps(&self) -> &[String] {
        &self.skipped_steps
    }

    /// Entries whose reconciliation failed.
    pub fn link_failures(&self) -> impl Iterator<Item = (&Path, &LinkError)> {
        self.links.iter().filter_map(|(target, outcome)| match outcome {
            Outcome::Failed(err) => Some((target.as_path(), err)),
            _ => None,
        })
    }

    /// Process exit code for a run that was not halted: the number of
    /// failed post-install steps, capped so it never collides with the
    /// reserved halt codes.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::try_from(self.failed_steps.len())
            .unwrap_or(MAX_FAILURE_EXIT)
            .min(MAX_FAILURE_EXIT)
    }

    fn link_counts(&self) -> LinkCounts {
        let mut counts = LinkCounts::default();
        for (_, outcome) in &self.links {
            match outcome {
                Outcome::Created => counts.created += 1,
                Outcome::Replaced { .. } => counts.replaced += 1,
                Outcome::Removed { .. } => counts.removed += 1,
                Outcome::Skipped(_) => counts.skipped += 1,
                Outcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }

    /// Render the boxed end-of-run summary, one string per line.
    #[must_use]
    pub fn render_summary(&self, log_path: Option<&Path>) -> Vec<String> {
        let c = self.link_counts();
        let mut body = vec![
            if self.dry_run {
                "Summary (dry run)".to_string()
            } else {
                "Summary".to_string()
            },
            String::new(),
            format!(
                "links   : {} created, {} replaced, {} removed, {} skipped, {} failed",
                c.created, c.replaced, c.removed, c.skipped, c.failed
            ),
            format!(
                "actions : {} ok, {} skipped, {} failed",
                self.completed_steps.len(),
                self.skipped_steps.len(),
                self.failed_steps.len()
            ),
        ];

        if c.failed > 0 {
            body.push(String::new());
            body.push("Failed links:".to_string());
            for (target, err) in self.link_failures() {
                body.push(format!("  {} : {err}", target.display()));
            }
        }

        if !self.failed_steps.is_empty() {
            body.push(String::new());
            body.push("Failed actions:".to_string());
            for title in &self.failed_steps {
                body.push(format!("  {title}"));
            }
        }

        if let Some(path) = log_path {
            body.push(String::new());
            body.push(format!("log: {}", path.display()));
        }

        boxed(&body)
    }
}

#[derive(Debug, Default)]
struct LinkCounts {
    created: usize,
    replaced: usize,
    removed: usize,
    skipped: usize,
    failed: usize,
}

/// Surround `lines` with a box-drawing frame.
fn boxed(lines: &[String]) -> Vec<String> {
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let bar = "─".repeat(width + 2);
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!("┌{bar}┐"));
    for line in lines {
        let pad = width - line.chars().count();
        out.push(format!("│ {line}{} │", " ".repeat(pad)));
    }
    out.push(format!("└{bar}┘"));
    out
}
