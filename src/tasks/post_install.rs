//! Action runner for post-install steps.
use super::Context;
use crate::config::actions::PostInstallStep;
use crate::report::RunReport;

/// Run `steps` in order from the repository root.
///
/// Each command runs to completion with the terminal attached before the
/// next starts. A failing step is recorded and the run moves on; placeholders
/// are logged and recorded as skipped.
pub fn run(steps: &[PostInstallStep], ctx: &Context, report: &mut RunReport) {
    if steps.is_empty() {
        return;
    }
    ctx.log.stage("Running post-install actions");

    for step in steps {
        match step {
            PostInstallStep::Placeholder { title, reason } => {
                ctx.log.info(&format!("Skipping  : {title} ({reason})"));
                report.record_step_skipped(title);
            }
            PostInstallStep::Command { title, script } => {
                if ctx.dry_run {
                    ctx.log.dry_run(&format!("Would execute : {title}"));
                    ctx.log.debug(script.trim());
                    report.record_step_ok(title);
                    continue;
                }
                ctx.log.info(&format!("Executing : {title}"));
                match ctx.executor.run_script(&ctx.root, script) {
                    Ok(status) if status.success() => report.record_step_ok(title),
                    Ok(status) => {
                        let how = status
                            .code
                            .map_or_else(|| "killed by signal".to_string(), |c| format!("exit {c}"));
                        ctx.log.error(&format!("{title} failed ({how})"));
                        report.record_step_failed(title);
                    }
                    Err(e) => {
                        ctx.log.error(&format!("{title}: {e:#}"));
                        report.record_step_failed(title);
                    }
                }
            }
        }
    }
}
