//! Run stages: prerequisite probe, link reconciliation, post-install steps.
pub mod post_install;
pub mod reconcile;
pub mod submodules;

use std::path::PathBuf;
use std::sync::Arc;

use crate::exec::Executor;
use crate::logging::Log;

/// Shared context for every stage of a run.
pub struct Context {
    /// Root of the dotfiles repository; post-install steps run here.
    pub root: PathBuf,
    /// Home directory the links are installed into.
    pub home: PathBuf,
    /// Global `--force`: replace valid symlinks.
    pub force: bool,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Logger for per-entry output.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("home", &self.home)
            .field("force", &self.force)
            .field("dry_run", &self.dry_run)
            .field("log", &"<dyn Log>")
            .field("executor", &self.executor)
            .finish()
    }
}

impl Context {
    /// Creates a context with `--force` and `--dry-run` off.
    #[must_use]
    pub fn new(
        root: PathBuf,
        home: PathBuf,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            root,
            home,
            force: false,
            dry_run: false,
            log,
            executor,
        }
    }

    /// Set global `--force`.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
