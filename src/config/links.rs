//! Link declarations: manifest entries resolved into [`LinkSpec`]s.
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::LoadContext;
use super::condition::Condition;
use crate::error::ConfigError;

/// What to do at a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkAction {
    /// Make the target a symlink to the source.
    #[default]
    Link,
    /// Delete whatever exists at the target.
    Remove,
}

/// One desired symlink, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    /// Absolute path where the link should exist.
    pub target: PathBuf,
    /// Absolute path the link should point to. `None` for removals.
    pub source: Option<PathBuf>,
    /// Replace a valid link without `--force`; link even if the source is missing.
    pub force: bool,
    /// Result of the entry's `when` condition.
    pub condition: bool,
    /// Link or remove.
    pub action: LinkAction,
    /// Abort the whole run if this entry fails.
    pub fail_on_error: bool,
}

impl LinkSpec {
    /// A plain link entry from `target` to `source`.
    #[must_use]
    pub fn link(target: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            source: Some(source.into()),
            force: false,
            condition: true,
            action: LinkAction::Link,
            fail_on_error: false,
        }
    }

    /// A removal entry for `target`.
    #[must_use]
    pub fn remove(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            source: None,
            force: false,
            condition: true,
            action: LinkAction::Remove,
            fail_on_error: false,
        }
    }

    /// Set the entry's own force flag.
    #[must_use]
    pub const fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Abort the run if this entry fails.
    #[must_use]
    pub const fn fail_on_error(mut self) -> Self {
        self.fail_on_error = true;
        self
    }

    /// Set the evaluated condition.
    #[must_use]
    pub const fn when(mut self, condition: bool) -> Self {
        self.condition = condition;
        self
    }
}

/// A single `[links]` value: either a plain source path or a table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum LinkEntry {
    /// `"~/.bashrc" = "bashrc"`
    Simple(String),
    /// `"~/.vim" = { source = "vim", force = true }`
    Detailed(DetailedEntry),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct DetailedEntry {
    source: Option<String>,
    #[serde(default)]
    force: bool,
    #[serde(default)]
    when: Condition,
    #[serde(default)]
    action: LinkAction,
    #[serde(default)]
    fail_on_error: bool,
}

/// Resolve raw manifest entries into validated specs sorted by target.
///
/// # Errors
///
/// Returns an error if a path cannot be expanded, two entries share a
/// target, or an entry's `source` contradicts its action.
pub(super) fn resolve(
    entries: BTreeMap<String, LinkEntry>,
    ctx: &LoadContext,
) -> Result<Vec<LinkSpec>, ConfigError> {
    let mut specs = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();

    for (raw_target, entry) in entries {
        let target = expand(&raw_target, &ctx.home, &ctx.home)?;
        if !seen.insert(target.clone()) {
            return Err(ConfigError::DuplicateTarget(target.display().to_string()));
        }

        let spec = match entry {
            LinkEntry::Simple(source) => LinkSpec::link(target, expand(&source, &ctx.root, &ctx.home)?),
            LinkEntry::Detailed(d) => {
                let source = match (d.action, d.source) {
                    (LinkAction::Remove, Some(_)) => {
                        return Err(ConfigError::RemoveWithSource(raw_target));
                    }
                    (LinkAction::Link, None) => {
                        return Err(ConfigError::LinkWithoutSource(raw_target));
                    }
                    (_, source) => source
                        .map(|s| expand(&s, &ctx.root, &ctx.home))
                        .transpose()?,
                };
                LinkSpec {
                    target,
                    source,
                    force: d.force,
                    condition: d.when.holds(&ctx.platform),
                    action: d.action,
                    fail_on_error: d.fail_on_error,
                }
            }
        };
        specs.push(spec);
    }

    specs.sort_by(|a, b| a.target.cmp(&b.target));
    Ok(specs)
}

/// Expand `~` and `$VAR` in `value`, then anchor relative results at `base`.
fn expand(value: &str, base: &Path, home: &Path) -> Result<PathBuf, ConfigError> {
    let home_str = home.to_string_lossy().into_owned();
    let expanded = shellexpand::full_with_context(
        value,
        || Some(home_str),
        |var: &str| std::env::var(var).map(Some),
    )
    .map_err(|e| ConfigError::Expand {
        value: value.to_string(),
        message: e.to_string(),
    })?;
    let path = PathBuf::from(expanded.as_ref());
    Ok(if path.is_absolute() {
        path
    } else {
        base.join(path)
    })
}
