//! Prerequisite probe: git submodules must be checked out before linking.
use anyhow::Result;
use std::io::{BufRead as _, IsTerminal as _, Write as _};

use super::Context;
use crate::error::RunError;

const UPDATE_ARGS: [&str; 4] = ["submodule", "update", "--init", "--recursive"];

/// What to do when submodules are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SubmoduleMode {
    /// Ask before fetching; halt if declined.
    #[default]
    Prompt,
    /// Fetch without asking.
    Update,
    /// Warn and continue.
    Ignore,
}

/// Yes/no confirmation from the user.
#[cfg_attr(test, mockall::automock)]
pub trait Prompt: Send + Sync {
    /// Ask `question`. Returns `false` when the answer is no or nobody can answer.
    fn confirm(&self, question: &str) -> bool;
}

/// [`Prompt`] reading the answer from stdin.
///
/// Declines without asking when stdin is not a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&self, question: &str) -> bool {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return false;
        }
        let mut stdout = std::io::stdout();
        if write!(stdout, "{question} [y/N] ").and_then(|()| stdout.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Make sure every submodule of the repository is initialised.
///
/// Does nothing when the repository has no `.gitmodules`. When `git` is not
/// installed or the probe fails, a warning is logged and the run continues.
///
/// # Errors
///
/// Returns [`RunError::MissingSubmodules`] when submodules are missing and
/// the user declines the fetch, the fetch fails, or some are still missing
/// after it.
pub fn ensure(ctx: &Context, mode: SubmoduleMode, prompt: &dyn Prompt) -> Result<(), RunError> {
    if !ctx.root.join(".gitmodules").exists() {
        ctx.log.debug("no .gitmodules, skipping submodule check");
        return Ok(());
    }
    if !ctx.executor.which("git") {
        ctx.log.warn("git not found, cannot verify submodules");
        return Ok(());
    }

    let missing = match probe(ctx) {
        Ok(missing) => missing,
        Err(e) => {
            ctx.log.warn(&format!("cannot verify submodules: {e:#}"));
            return Ok(());
        }
    };
    if missing.is_empty() {
        ctx.log.debug("all submodules present");
        return Ok(());
    }

    for name in &missing {
        ctx.log.warn(&format!("git submodule {name} is not initialised"));
    }

    if ctx.dry_run {
        ctx.log
            .dry_run(&format!("would need: git {}", UPDATE_ARGS.join(" ")));
        return Ok(());
    }

    let fetch = match mode {
        SubmoduleMode::Ignore => {
            ctx.log.warn("continuing without them; links into them will fail");
            return Ok(());
        }
        SubmoduleMode::Update => true,
        SubmoduleMode::Prompt => {
            prompt.confirm(&format!("Run `git {}` now?", UPDATE_ARGS.join(" ")))
        }
    };
    if !fetch {
        ctx.log
            .error(&format!("you may run: git {}", UPDATE_ARGS.join(" ")));
        return Err(RunError::MissingSubmodules(missing));
    }

    ctx.log.stage("Fetching git submodules");
    if let Err(e) = ctx.executor.run_in(&ctx.root, "git", &UPDATE_ARGS) {
        ctx.log.error(&format!("{e:#}"));
        return Err(RunError::MissingSubmodules(missing));
    }

    match probe(ctx) {
        Ok(still_missing) if still_missing.is_empty() => Ok(()),
        Ok(still_missing) => Err(RunError::MissingSubmodules(still_missing)),
        Err(e) => {
            ctx.log.warn(&format!("cannot verify submodules: {e:#}"));
            Ok(())
        }
    }
}

/// Paths of submodules `git submodule status` reports as uninitialised.
fn probe(ctx: &Context) -> Result<Vec<String>> {
    let output = ctx
        .executor
        .run_in(&ctx.root, "git", &["submodule", "status"])?;
    Ok(parse_status(&output.stdout))
}

/// Lines look like `-<sha> <path>` for uninitialised submodules and
/// ` <sha> <path> (<describe>)` or `+<sha> ...` otherwise.
fn parse_status(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix('-'))
        .filter_map(|rest| rest.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}
