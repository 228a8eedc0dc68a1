use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, Output};

/// Result of a captured command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status 0.
    pub success: bool,
    /// Exit code, `None` if killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Exit status of an interactive script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptStatus {
    /// Exit code, `None` when the shell was killed by a signal.
    pub code: Option<i32>,
}

impl ScriptStatus {
    /// Exited with status 0.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Abstraction over process execution so tasks can be tested without
/// spawning real commands.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `program` in `dir` capturing its output. Fails on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a shell script in `dir` with the terminal attached.
    ///
    /// Output streams straight through and the script may read from stdin.
    /// Only the exit status is reported back.
    ///
    /// # Errors
    ///
    /// Returns an error if no shell can be spawned.
    fn run_script(&self, dir: &Path, script: &str) -> Result<ScriptStatus>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    /// Shell used for scripts: bash when installed, plain `sh` otherwise.
    fn shell(self) -> &'static str {
        if self.which("bash") { "bash" } else { "sh" }
    }
}

impl Executor for SystemExecutor {
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .with_context(|| format!("failed to execute: {program} in {}", dir.display()))?;
        let result = ExecResult::from(output);
        if !result.success {
            bail!(
                "{program} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    fn run_script(&self, dir: &Path, script: &str) -> Result<ScriptStatus> {
        let shell = self.shell();
        let status = Command::new(shell)
            .arg("-c")
            .arg(script)
            .current_dir(dir)
            .status()
            .with_context(|| format!("failed to spawn {shell}"))?;
        Ok(ScriptStatus {
            code: status.code(),
        })
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
