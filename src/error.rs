//! Domain-specific error types for the link installer.
//!
//! Internal modules return typed errors built with [`thiserror`]; the
//! driver in [`crate::install`] maps them to a process exit code, and
//! boundary code (manifest I/O, process spawning) uses [`anyhow`] context.
//!
//! # Error hierarchy
//!
//! ```text
//! RunError
//! ├── Aborted            a fail_on_error entry failed (exit 100)
//! ├── MissingSubmodules  prerequisite probe halted the run (exit 101)
//! └── Setup              manifest, root or home unusable (exit 102)
//!       └── ConfigError  manifest parsing and validation
//! LinkError              per-entry reconciliation failure (recoverable)
//! ```

use thiserror::Error;

/// Exit code used when a `fail_on_error` entry halts the run.
pub const EXIT_ABORTED: u8 = 100;
/// Exit code used when nested repository content is missing.
pub const EXIT_MISSING_SUBMODULES: u8 = 101;
/// Exit code used when the run cannot even start.
pub const EXIT_SETUP: u8 = 102;
/// Largest exit code used to report a count of failed post-install steps.
pub const MAX_FAILURE_EXIT: u8 = 99;

/// Why a single link could not be reconciled.
///
/// These are recorded in the run report and only escalate to a
/// [`RunError::Aborted`] when the entry opts into `fail_on_error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The declared source does not exist and the entry is not forced.
    #[error("source missing")]
    SourceMissing,

    /// A regular file or directory occupies the target.
    #[error("exists, not a symlink")]
    NotASymlink,

    /// A regular file or directory occupies the target; force never deletes it.
    #[error("exists, not a symlink; force ignored")]
    ForceIgnored,

    /// Removal was requested but the target is a directory with content.
    #[error("directory not empty, not removed")]
    DirectoryNotEmpty,

    /// The parent directory of the target could not be created.
    #[error("mkdir failed: {0}")]
    MkdirFailed(String),

    /// Any other filesystem failure while observing or changing the target.
    #[error("{0}")]
    Io(String),
}

/// Errors raised while loading and validating the manifest.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The manifest file could not be read.
    #[error("cannot read manifest {path}: {source}")]
    Read {
        /// Path of the manifest.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or does not match the schema.
    #[error("invalid manifest {origin}: {message}")]
    Parse {
        /// File path, or `<embedded>` for the built-in manifest.
        origin: String,
        /// Parser message.
        message: String,
    },

    /// A `~` or `$VAR` reference in a path could not be expanded.
    #[error("cannot expand '{value}': {message}")]
    Expand {
        /// The path as written in the manifest.
        value: String,
        /// Expansion failure reason.
        message: String,
    },

    /// Two entries resolve to the same target path.
    #[error("duplicate target {0}")]
    DuplicateTarget(String),

    /// A removal entry declares a source.
    #[error("entry {0} removes its target and must not declare a source")]
    RemoveWithSource(String),

    /// A link entry has no source.
    #[error("entry {0} links its target but declares no source")]
    LinkWithoutSource(String),
}

/// Hard stops that end the run before it completes.
#[derive(Error, Debug)]
pub enum RunError {
    /// A `fail_on_error` entry could not be reconciled.
    #[error("aborted at {target}: {reason}")]
    Aborted {
        /// Target of the failing entry.
        target: String,
        /// Why it failed.
        reason: LinkError,
    },

    /// Nested repositories are not checked out.
    #[error("git submodules not initialised: {}", .0.join(", "))]
    MissingSubmodules(Vec<String>),

    /// The run could not be set up.
    #[error(transparent)]
    Setup(#[from] anyhow::Error),
}

impl RunError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Aborted { .. } => EXIT_ABORTED,
            Self::MissingSubmodules(_) => EXIT_MISSING_SUBMODULES,
            Self::Setup(_) => EXIT_SETUP,
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Setup(e.into())
    }
}
