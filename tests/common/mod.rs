// Shared helpers for integration tests.
//
// Provides a temporary repository and home directory plus a fluent builder
// so each integration test can set up an isolated environment and run the
// installer through the library API without repeating filesystem
// boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dotlink::config::actions::Feature;
use dotlink::exec::SystemExecutor;
use dotlink::install::{self, InstallOptions};
use dotlink::logging::{Log, MemoryLog};
use dotlink::platform::{Os, Platform};
use dotlink::report::RunReport;
use dotlink::tasks::Context;
use dotlink::tasks::submodules::{Prompt, SubmoduleMode};

/// A [`Prompt`] that answers every question with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompt for FixedAnswer {
    fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}

/// Result of one installer run.
pub struct RunResult {
    /// Exit code the process would return.
    pub code: u8,
    pub report: RunReport,
    /// Everything the run printed, ANSI codes stripped.
    pub log: Arc<MemoryLog>,
}

impl RunResult {
    /// Whether a line mentioning `target` was logged at error level.
    pub fn failed_line_for(&self, target: &Path) -> bool {
        let target = target.display().to_string();
        self.log
            .messages(dotlink::logging::Level::Error)
            .iter()
            .any(|line| line.starts_with(&target) && line.contains(": failed, "))
    }
}

/// An isolated repository and home directory backed by a
/// [`tempfile::TempDir`], deleted on drop.
pub struct Sandbox {
    dir: tempfile::TempDir,
    force: bool,
    dry_run: bool,
    skip: BTreeSet<Feature>,
    submodules: SubmoduleMode,
    platform: Platform,
}

impl Sandbox {
    /// Create empty `repo/` and `home/` directories and an empty manifest.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("repo")).expect("create repo");
        std::fs::create_dir_all(dir.path().join("home")).expect("create home");
        std::fs::write(dir.path().join("repo/install.toml"), "").expect("write manifest");
        Self {
            dir,
            force: false,
            dry_run: false,
            skip: BTreeSet::new(),
            submodules: SubmoduleMode::Ignore,
            platform: Platform::new(Os::Linux, false),
        }
    }

    pub fn repo(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// Write the manifest used by [`Sandbox::run`].
    pub fn manifest(self, content: &str) -> Self {
        std::fs::write(self.repo().join("install.toml"), content).expect("write manifest");
        self
    }

    /// Create a source file at `repo/<rel>`.
    pub fn source(self, rel: &str) -> Self {
        let path = self.repo().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create source parent");
        }
        std::fs::write(&path, rel).expect("write source");
        self
    }

    /// Create a regular file at `home/<rel>`.
    pub fn home_file(self, rel: &str, content: &str) -> Self {
        let path = self.home().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create home parent");
        }
        std::fs::write(path, content).expect("write home file");
        self
    }

    /// Create a directory at `home/<rel>`.
    pub fn home_dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.home().join(rel)).expect("create home dir");
        self
    }

    /// Create a symlink at `home/<rel>` pointing to `dest`.
    pub fn home_link(self, rel: &str, dest: &Path) -> Self {
        std::os::unix::fs::symlink(dest, self.home().join(rel)).expect("create home link");
        self
    }

    pub const fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub const fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn skip(mut self, feature: Feature) -> Self {
        self.skip.insert(feature);
        self
    }

    pub const fn submodules(mut self, mode: SubmoduleMode) -> Self {
        self.submodules = mode;
        self
    }

    pub const fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Run the installer against this sandbox with real filesystem and shell.
    pub fn run(&self) -> RunResult {
        self.run_with(&FixedAnswer(false))
    }

    /// Like [`Sandbox::run`] with an explicit prompt.
    pub fn run_with(&self, prompt: &dyn Prompt) -> RunResult {
        let log = Arc::new(MemoryLog::new());
        let ctx = Context::new(
            self.repo(),
            self.home(),
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(SystemExecutor),
        )
        .with_force(self.force)
        .with_dry_run(self.dry_run);
        let opts = InstallOptions {
            config: Some(self.repo().join("install.toml")),
            submodules: self.submodules,
            skip: self.skip.clone(),
            platform: self.platform.clone(),
        };

        let mut report = RunReport::new(self.dry_run);
        let result = install::execute(&opts, &ctx, prompt, &mut report);
        let code = install::finish(log.as_ref(), &report, result, None);
        RunResult { code, report, log }
    }
}
