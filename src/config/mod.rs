pub mod actions;
pub mod condition;
pub mod links;

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::platform::Platform;

use actions::{Feature, PostInstallStep};
use links::LinkSpec;

/// Default manifest compiled into the binary.
pub const EMBEDDED_MANIFEST: &str = include_str!("../../conf/install.toml");

/// Everything needed to turn raw manifest text into resolved entries.
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// Repository root; relative sources are joined to it.
    pub root: PathBuf,
    /// Home directory; `~` and bare relative targets resolve against it.
    pub home: PathBuf,
    /// Platform that `when` conditions are evaluated against.
    pub platform: Platform,
    /// Features whose post-install steps become placeholders.
    pub skip: BTreeSet<Feature>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    links: BTreeMap<String, links::LinkEntry>,
    #[serde(default)]
    actions: Vec<actions::ActionEntry>,
}

/// The resolved manifest: links sorted by target, steps in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Link entries, sorted by target.
    pub links: Vec<LinkSpec>,
    /// Post-install steps in declaration order.
    pub steps: Vec<PostInstallStep>,
}

impl Manifest {
    /// Load the manifest compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry fails validation.
    pub fn load_embedded(ctx: &LoadContext) -> Result<Self, ConfigError> {
        Self::parse(EMBEDDED_MANIFEST, "<embedded>", ctx)
    }

    /// Load a manifest file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// any entry fails validation.
    pub fn load_file(path: &Path, ctx: &LoadContext) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string(), ctx)
    }

    /// Parse manifest `text`. `origin` names it in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid manifest.
    pub fn parse(text: &str, origin: &str, ctx: &LoadContext) -> Result<Self, ConfigError> {
        let file: ManifestFile = toml::from_str(text).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            message: e.message().to_string(),
        })?;
        Ok(Self {
            links: links::resolve(file.links, ctx)?,
            steps: actions::resolve(file.actions, &ctx.platform, &ctx.skip),
        })
    }
}
