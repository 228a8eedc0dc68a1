//! Top-level install driver: load, probe, link, run actions, summarise.
use anyhow::{Context as _, Result};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::actions::Feature;
use crate::config::{LoadContext, Manifest};
use crate::error::{EXIT_SETUP, RunError};
use crate::exec::SystemExecutor;
use crate::logging::{self, Log, Logger};
use crate::platform::Platform;
use crate::report::RunReport;
use crate::tasks::submodules::{self, Prompt, StdinPrompt, SubmoduleMode};
use crate::tasks::{Context, post_install, reconcile};

/// Name of the log file under the cache directory.
const COMMAND: &str = "install";

/// Inputs of a run that are not part of the shared [`Context`].
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Manifest file; the embedded one is used when `None`.
    pub config: Option<PathBuf>,
    /// What to do about missing submodules.
    pub submodules: SubmoduleMode,
    /// Features whose post-install steps are replaced by placeholders.
    pub skip: BTreeSet<Feature>,
    /// Platform that `when` conditions are evaluated against.
    pub platform: Platform,
}

impl InstallOptions {
    /// Options as given on the command line.
    #[must_use]
    pub fn from_cli(cli: &Cli, platform: Platform) -> Self {
        Self {
            config: cli.config.clone(),
            submodules: cli.submodules,
            skip: cli.skip.features(),
            platform,
        }
    }
}

/// Load the manifest, check submodules, reconcile links, then run the
/// post-install steps, recording everything in `report`.
///
/// # Errors
///
/// Returns [`RunError::Setup`] if the manifest cannot be loaded,
/// [`RunError::MissingSubmodules`] if the prerequisite probe halts the run,
/// and [`RunError::Aborted`] if a `fail_on_error` entry fails. Post-install
/// failures are never errors; they are counted in `report`.
pub fn execute(
    opts: &InstallOptions,
    ctx: &Context,
    prompt: &dyn Prompt,
    report: &mut RunReport,
) -> Result<(), RunError> {
    let load_ctx = LoadContext {
        root: ctx.root.clone(),
        home: ctx.home.clone(),
        platform: opts.platform.clone(),
        skip: opts.skip.clone(),
    };
    let manifest = match &opts.config {
        Some(path) => Manifest::load_file(path, &load_ctx)?,
        None => Manifest::load_embedded(&load_ctx)?,
    };
    ctx.log.debug(&format!(
        "manifest: {} links, {} post-install steps",
        manifest.links.len(),
        manifest.steps.len()
    ));

    submodules::ensure(ctx, opts.submodules, prompt)?;
    reconcile::reconcile_all(&manifest.links, ctx, report)?;
    post_install::run(&manifest.steps, ctx, report);
    Ok(())
}

/// Log the outcome of [`execute`], print the summary box and return the
/// process exit code.
#[must_use]
pub fn finish(
    log: &dyn Log,
    report: &RunReport,
    result: Result<(), RunError>,
    log_path: Option<&Path>,
) -> u8 {
    if let Err(e) = &result {
        log.error(&format!("{e:#}"));
    }
    for line in report.render_summary(log_path) {
        log.info(&line);
    }
    match result {
        Ok(()) => report.exit_code(),
        Err(e) => e.exit_code(),
    }
}

/// Entry point behind `main`.
#[must_use]
pub fn run(cli: &Cli) -> ExitCode {
    logging::init_subscriber(cli.verbose, COMMAND);
    let logger = Arc::new(Logger::new(COMMAND));
    let log: Arc<dyn Log> = Arc::clone(&logger) as Arc<dyn Log>;

    let paths = resolve_root(cli.root.as_deref())
        .and_then(|root| Ok((root, resolve_home(cli.home.as_deref())?)));
    let (root, home) = match paths {
        Ok(paths) => paths,
        Err(e) => {
            log.error(&format!("{e:#}"));
            return ExitCode::from(EXIT_SETUP);
        }
    };
    log.debug(&format!("root: {}", root.display()));
    log.debug(&format!("home: {}", home.display()));

    let ctx = Context::new(root, home, Arc::clone(&log), Arc::new(SystemExecutor))
        .with_force(cli.force)
        .with_dry_run(cli.dry_run);
    let opts = InstallOptions::from_cli(cli, Platform::detect());
    log.debug(&format!(
        "platform: {} ({})",
        opts.platform.os,
        if opts.platform.is_remote { "remote" } else { "local" }
    ));

    let mut report = RunReport::new(cli.dry_run);
    let result = execute(&opts, &ctx, &StdinPrompt, &mut report);
    ExitCode::from(finish(log.as_ref(), &report, result, logger.log_path()))
}

/// Resolve the dotfiles repository root.
///
/// Order: `--root`, `DOTFILES_ROOT`, the nearest ancestor of the executable
/// that looks like the repository, then the current directory.
///
/// # Errors
///
/// Returns an error if the chosen path is not a directory.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_root_from(
        explicit,
        std::env::var_os("DOTFILES_ROOT"),
        std::env::current_exe().ok(),
        std::env::current_dir().ok(),
    )
}

fn resolve_root_from(
    explicit: Option<&Path>,
    env_root: Option<OsString>,
    exe: Option<PathBuf>,
    cwd: Option<PathBuf>,
) -> Result<PathBuf> {
    let root = if let Some(root) = explicit {
        root.to_path_buf()
    } else if let Some(root) = env_root.filter(|r| !r.is_empty()) {
        PathBuf::from(root)
    } else if let Some(root) = exe
        .as_deref()
        .and_then(|exe| exe.ancestors().skip(1).find(|dir| looks_like_repo(dir)))
    {
        root.to_path_buf()
    } else {
        cwd.context("cannot determine dotfiles root. Use --root or set DOTFILES_ROOT")?
    };

    if !root.is_dir() {
        anyhow::bail!("dotfiles root {} is not a directory", root.display());
    }
    Ok(root)
}

fn looks_like_repo(dir: &Path) -> bool {
    dir.join(".gitmodules").is_file() || dir.join("install.toml").is_file()
}

/// Resolve the home directory: `--home`, otherwise the user's home.
///
/// # Errors
///
/// Returns an error if no home directory can be determined or it does not
/// exist.
pub fn resolve_home(explicit: Option<&Path>) -> Result<PathBuf> {
    let home = match explicit {
        Some(home) => home.to_path_buf(),
        None => dirs::home_dir().context("cannot determine home directory. Use --home")?,
    };
    if !home.is_dir() {
        anyhow::bail!("home directory {} does not exist", home.display());
    }
    Ok(home)
}
