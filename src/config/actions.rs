//! Post-install step declarations.
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

use super::condition::Condition;
use crate::platform::Platform;

/// Skippable post-install categories, one `--skip-<feature>` flag each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    /// vim-plug plugin install.
    Vimplug,
    /// zgen plugin update.
    Zgen,
    /// tmux plugin manager.
    Tmux,
    /// Login shell change.
    Chsh,
    /// Git identity prompt.
    Gitconfig,
}

impl Feature {
    /// Command-line flag that skips this feature.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Vimplug => "--skip-vimplug",
            Self::Zgen => "--skip-zgen",
            Self::Tmux => "--skip-tmux",
            Self::Chsh => "--skip-chsh",
            Self::Gitconfig => "--skip-gitconfig",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vimplug => "vimplug",
            Self::Zgen => "zgen",
            Self::Tmux => "tmux",
            Self::Chsh => "chsh",
            Self::Gitconfig => "gitconfig",
        };
        f.write_str(name)
    }
}

/// An `[[actions]]` entry as written in the manifest.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ActionEntry {
    title: String,
    #[serde(default)]
    feature: Option<Feature>,
    #[serde(default)]
    when: Condition,
    #[serde(default)]
    run: String,
}

/// One post-install step in run order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostInstallStep {
    /// A shell script to run with the terminal attached.
    Command {
        /// Name shown in output and the summary.
        title: String,
        /// Passed to `sh -c`.
        script: String,
    },
    /// A step that keeps its slot in the sequence but does nothing.
    Placeholder {
        /// Name shown in output and the summary.
        title: String,
        /// Why nothing runs.
        reason: String,
    },
}

impl PostInstallStep {
    /// A step that runs `script`.
    #[must_use]
    pub fn command(title: impl Into<String>, script: impl Into<String>) -> Self {
        Self::Command {
            title: title.into(),
            script: script.into(),
        }
    }

    /// A step that only reports `reason`.
    #[must_use]
    pub fn placeholder(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Placeholder {
            title: title.into(),
            reason: reason.into(),
        }
    }

    /// The step's display name.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Command { title, .. } | Self::Placeholder { title, .. } => title,
        }
    }
}

/// Turn manifest entries into steps, replacing inapplicable ones with
/// placeholders so the sequence keeps its shape.
pub(super) fn resolve(
    entries: Vec<ActionEntry>,
    platform: &Platform,
    skip: &BTreeSet<Feature>,
) -> Vec<PostInstallStep> {
    entries
        .into_iter()
        .map(|entry| {
            if let Some(feature) = entry.feature
                && skip.contains(&feature)
            {
                return PostInstallStep::placeholder(
                    entry.title,
                    format!("skipped by {}", feature.flag()),
                );
            }
            if !entry.when.holds(platform) {
                return PostInstallStep::placeholder(entry.title, "condition false");
            }
            if entry.run.trim().is_empty() {
                return PostInstallStep::placeholder(entry.title, "nothing to run");
            }
            PostInstallStep::command(entry.title, entry.run)
        })
        .collect()
}
