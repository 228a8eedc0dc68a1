//! Link reconciler: converge each target to its declared state.
use std::path::Path;

use super::Context;
use crate::config::links::{LinkAction, LinkSpec};
use crate::error::{LinkError, RunError};
use crate::report::{Outcome, RunReport, SkipReason};
use crate::resources::TargetState;
use crate::resources::symlink::{self, Removal};

/// Width the target column is padded to in per-entry output.
const TARGET_COLUMN: usize = 50;

/// Reconcile one entry against the filesystem.
///
/// Observes the target once, then acts. A regular file or directory at the
/// target is never deleted, whatever the force settings; it is reported as
/// a failure instead. In dry-run mode the same outcome is computed but
/// nothing is changed.
#[must_use]
pub fn reconcile(spec: &LinkSpec, ctx: &Context) -> Outcome {
    if !spec.condition {
        return Outcome::Skipped(SkipReason::ConditionFalse);
    }
    match spec.action {
        LinkAction::Remove => remove(&spec.target, ctx),
        LinkAction::Link => link(spec, ctx),
    }
}

fn remove(target: &Path, ctx: &Context) -> Outcome {
    let result = if ctx.dry_run {
        symlink::inspect_removal(target)
    } else {
        symlink::remove_entry(target)
    };
    match result {
        Ok(Removal::Removed) => Outcome::Removed { existed: true },
        Ok(Removal::Absent) => Outcome::Removed { existed: false },
        Ok(Removal::NotEmpty) => Outcome::Failed(LinkError::DirectoryNotEmpty),
        Err(e) => Outcome::Failed(LinkError::Io(format!("{e:#}"))),
    }
}

fn link(spec: &LinkSpec, ctx: &Context) -> Outcome {
    let Some(source) = spec.source.as_deref() else {
        return Outcome::Failed(LinkError::SourceMissing);
    };
    if !spec.force && !symlink::source_exists(source) {
        return Outcome::Failed(LinkError::SourceMissing);
    }

    let state = match TargetState::observe(&spec.target) {
        Ok(state) => state,
        Err(e) => return Outcome::Failed(LinkError::Io(format!("{e:#}"))),
    };
    let force = ctx.force || spec.force;

    match state {
        TargetState::Absent => create(source, &spec.target, ctx),
        TargetState::SymlinkBroken { points_to } => {
            ctx.log.debug(&format!(
                "{} points to missing {}",
                spec.target.display(),
                points_to.display()
            ));
            replace(source, &spec.target, true, ctx)
        }
        TargetState::SymlinkValid { .. } if force => replace(source, &spec.target, false, ctx),
        TargetState::SymlinkValid { points_to } => {
            if points_to != source {
                ctx.log.debug(&format!(
                    "{} points to {}, not {}; use --force to replace",
                    spec.target.display(),
                    points_to.display(),
                    source.display()
                ));
            }
            Outcome::Skipped(SkipReason::AlreadyLinked)
        }
        TargetState::OtherExisting { is_dir } => {
            ctx.log.debug(&format!(
                "{} is a {}, leaving it in place",
                spec.target.display(),
                if is_dir { "directory" } else { "regular file" }
            ));
            if force {
                Outcome::Failed(LinkError::ForceIgnored)
            } else {
                Outcome::Failed(LinkError::NotASymlink)
            }
        }
    }
}

fn create(source: &Path, target: &Path, ctx: &Context) -> Outcome {
    if ctx.dry_run {
        return match symlink::check_parent_dir(target) {
            Ok(()) => Outcome::Created,
            Err(e) => Outcome::Failed(LinkError::MkdirFailed(format!("{e:#}"))),
        };
    }
    if let Some(parent) = target.parent()
        && !parent.is_dir()
    {
        if let Err(e) = symlink::ensure_parent_dir(target) {
            return Outcome::Failed(LinkError::MkdirFailed(format!("{e:#}")));
        }
        ctx.log.debug(&format!("created directory {}", parent.display()));
    }
    match symlink::create_symlink(source, target) {
        Ok(()) => Outcome::Created,
        Err(e) => Outcome::Failed(LinkError::Io(format!("{e:#}"))),
    }
}

fn replace(source: &Path, target: &Path, was_broken: bool, ctx: &Context) -> Outcome {
    if ctx.dry_run {
        return Outcome::Replaced { was_broken };
    }
    let result = symlink::remove_symlink(target).and_then(|()| symlink::create_symlink(source, target));
    match result {
        Ok(()) => Outcome::Replaced { was_broken },
        Err(e) => Outcome::Failed(LinkError::Io(format!("{e:#}"))),
    }
}

/// Reconcile `specs` in order, printing one line per entry and recording
/// each outcome in `report`.
///
/// # Errors
///
/// Returns [`RunError::Aborted`] as soon as an entry marked
/// `fail_on_error` fails; later entries are not touched.
pub fn reconcile_all(
    specs: &[LinkSpec],
    ctx: &Context,
    report: &mut RunReport,
) -> Result<(), RunError> {
    ctx.log.stage("Linking dotfiles");

    for spec in specs {
        let outcome = reconcile(spec, ctx);
        let line = format!(
            "{:<width$} : {}",
            spec.target.display().to_string(),
            describe(spec, &outcome),
            width = TARGET_COLUMN
        );
        match &outcome {
            Outcome::Failed(_) => ctx.log.error(&line),
            Outcome::Skipped(_) => ctx.log.info(&line),
            _ if ctx.dry_run => ctx.log.dry_run(&line),
            _ => ctx.log.info(&line),
        }

        report.record_link(&spec.target, outcome.clone());

        if let Outcome::Failed(reason) = outcome
            && spec.fail_on_error
        {
            return Err(RunError::Aborted {
                target: spec.target.display().to_string(),
                reason,
            });
        }
    }
    Ok(())
}

/// Human-readable reason for `outcome`, naming the source on changes.
fn describe(spec: &LinkSpec, outcome: &Outcome) -> String {
    match (outcome, spec.source.as_deref()) {
        (Outcome::Created | Outcome::Replaced { .. }, Some(source)) => {
            format!("{outcome} from '{}'", source.display())
        }
        _ => outcome.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::Level;
    use crate::tasks::test_helpers::{MockExecutor, make_context};
    use std::os::unix::fs::symlink as make_link;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Fixture {
        _dir: tempfile::TempDir,
        repo: PathBuf,
        home: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let repo = dir.path().join("repo");
            let home = dir.path().join("home");
            std::fs::create_dir_all(&repo).unwrap();
            std::fs::create_dir_all(&home).unwrap();
            Self {
                _dir: dir,
                repo,
                home,
            }
        }

        fn source(&self, name: &str) -> PathBuf {
            let path = self.repo.join(name);
            std::fs::write(&path, name).unwrap();
            path
        }

        fn ctx(&self) -> (Context, Arc<crate::logging::MemoryLog>) {
            make_context(&self.repo, &self.home, Arc::new(MockExecutor::default()))
        }
    }

    // ---- single entry ----

    #[test]
    fn false_condition_is_skipped_without_touching_anything() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let spec = LinkSpec::link(fx.home.join(".foo"), fx.repo.join("missing")).when(false);
        assert_eq!(
            reconcile(&spec, &ctx),
            Outcome::Skipped(SkipReason::ConditionFalse)
        );
        assert!(!fx.home.join(".foo").exists());
    }

    #[test]
    fn absent_target_is_created() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let source = fx.source("bar");
        let target = fx.home.join(".foo");

        assert_eq!(reconcile(&LinkSpec::link(&target, &source), &ctx), Outcome::Created);
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let fx = Fixture::new();
        let (ctx, log) = fx.ctx();
        let source = fx.source("imgcat");
        let target = fx.home.join(".local/bin/imgcat");

        assert_eq!(reconcile(&LinkSpec::link(&target, &source), &ctx), Outcome::Created);
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
        assert!(log.contains("created directory"));
    }

    #[test]
    fn parent_blocked_by_file_is_mkdir_failure() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let source = fx.source("imgcat");
        std::fs::write(fx.home.join(".local"), "not a dir").unwrap();

        let outcome = reconcile(
            &LinkSpec::link(fx.home.join(".local/bin/imgcat"), &source),
            &ctx,
        );
        assert!(matches!(outcome, Outcome::Failed(LinkError::MkdirFailed(_))));
        assert_eq!(std::fs::read_to_string(fx.home.join(".local")).unwrap(), "not a dir");
    }

    #[test]
    fn dry_run_predicts_blocked_parent() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let ctx = ctx.with_dry_run(true);
        let source = fx.source("imgcat");
        std::fs::write(fx.home.join(".local"), "not a dir").unwrap();

        let outcome = reconcile(
            &LinkSpec::link(fx.home.join(".local/bin/imgcat"), &source),
            &ctx,
        );
        assert!(matches!(outcome, Outcome::Failed(LinkError::MkdirFailed(_))));
        assert_eq!(
            reconcile(&LinkSpec::link(fx.home.join("fresh/dir/link"), &source), &ctx),
            Outcome::Created
        );
        assert!(!fx.home.join("fresh").exists());
    }

    #[test]
    fn conflicting_entry_kind_is_logged() {
        let fx = Fixture::new();
        let (ctx, log) = fx.ctx();
        let source = fx.source("bar");
        std::fs::create_dir(fx.home.join(".dir")).unwrap();
        make_link(fx.repo.join("gone"), fx.home.join(".broken")).unwrap();

        let _ = reconcile(&LinkSpec::link(fx.home.join(".dir"), &source), &ctx);
        let _ = reconcile(&LinkSpec::link(fx.home.join(".broken"), &source), &ctx);

        assert!(log.contains(".dir is a directory, leaving it in place"));
        assert!(log.contains(&format!("points to missing {}", fx.repo.join("gone").display())));
    }

    #[test]
    fn missing_source_fails_and_leaves_target() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let target = fx.home.join(".foo");

        assert_eq!(
            reconcile(&LinkSpec::link(&target, fx.repo.join("nope")), &ctx),
            Outcome::Failed(LinkError::SourceMissing)
        );
        assert!(!symlink::source_exists(&target));
    }

    #[test]
    fn forced_entry_links_missing_source() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let target = fx.home.join(".foo");
        let source = fx.repo.join("nope");

        assert_eq!(
            reconcile(&LinkSpec::link(&target, &source).forced(), &ctx),
            Outcome::Created
        );
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn dangling_source_counts_as_existing() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let source = fx.repo.join("dangling");
        make_link(fx.repo.join("nowhere"), &source).unwrap();
        let target = fx.home.join(".foo");

        assert_eq!(reconcile(&LinkSpec::link(&target, &source), &ctx), Outcome::Created);
    }

    #[test]
    fn valid_link_is_skipped_and_idempotent() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let source = fx.source("bar");
        let target = fx.home.join(".foo");
        let spec = LinkSpec::link(&target, &source);

        assert_eq!(reconcile(&spec, &ctx), Outcome::Created);
        assert_eq!(
            reconcile(&spec, &ctx),
            Outcome::Skipped(SkipReason::AlreadyLinked)
        );
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn valid_link_elsewhere_is_skipped_and_logged() {
        let fx = Fixture::new();
        let (ctx, log) = fx.ctx();
        let source = fx.source("bar");
        let other = fx.source("other");
        let target = fx.home.join(".foo");
        make_link(&other, &target).unwrap();

        assert_eq!(
            reconcile(&LinkSpec::link(&target, &source), &ctx),
            Outcome::Skipped(SkipReason::AlreadyLinked)
        );
        assert_eq!(std::fs::read_link(&target).unwrap(), other);
        assert!(log.contains("use --force to replace"));
    }

    #[test]
    fn global_force_replaces_valid_link() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let ctx = ctx.with_force(true);
        let source = fx.source("bar");
        let other = fx.source("other");
        let target = fx.home.join(".foo");
        make_link(&other, &target).unwrap();

        assert_eq!(
            reconcile(&LinkSpec::link(&target, &source), &ctx),
            Outcome::Replaced { was_broken: false }
        );
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
        assert!(other.exists(), "old referent must survive");
    }

    #[test]
    fn entry_force_replaces_valid_link() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let source = fx.source("bar");
        let other = fx.source("other");
        let target = fx.home.join(".foo");
        make_link(&other, &target).unwrap();

        assert_eq!(
            reconcile(&LinkSpec::link(&target, &source).forced(), &ctx),
            Outcome::Replaced { was_broken: false }
        );
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn broken_link_is_always_replaced() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let source = fx.source("bar");
        let target = fx.home.join(".foo");
        make_link(fx.repo.join("gone"), &target).unwrap();

        assert_eq!(
            reconcile(&LinkSpec::link(&target, &source), &ctx),
            Outcome::Replaced { was_broken: true }
        );
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn regular_file_is_never_touched() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let source = fx.source("bar");
        let target = fx.home.join(".foo");
        std::fs::write(&target, "user data").unwrap();

        assert_eq!(
            reconcile(&LinkSpec::link(&target, &source), &ctx),
            Outcome::Failed(LinkError::NotASymlink)
        );
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "user data");
    }

    #[test]
    fn force_is_ignored_for_real_directory() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let ctx = ctx.with_force(true);
        let source = fx.source("bar");
        let target = fx.home.join(".foo");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        assert_eq!(
            reconcile(&LinkSpec::link(&target, &source).forced(), &ctx),
            Outcome::Failed(LinkError::ForceIgnored)
        );
        assert!(target.join("keep").exists());
    }

    #[test]
    fn remove_deletes_and_is_idempotent() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let target = fx.home.join(".pip.conf");
        std::fs::write(&target, "x").unwrap();
        let spec = LinkSpec::remove(&target);

        assert_eq!(reconcile(&spec, &ctx), Outcome::Removed { existed: true });
        assert!(!symlink::source_exists(&target));
        assert_eq!(reconcile(&spec, &ctx), Outcome::Removed { existed: false });
    }

    #[test]
    fn remove_never_existing_target_is_noop() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        assert_eq!(
            reconcile(&LinkSpec::remove(fx.home.join("never")), &ctx),
            Outcome::Removed { existed: false }
        );
    }

    #[test]
    fn remove_refuses_non_empty_directory() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let target = fx.home.join(".pip");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("pip.conf"), "x").unwrap();

        assert_eq!(
            reconcile(&LinkSpec::remove(&target), &ctx),
            Outcome::Failed(LinkError::DirectoryNotEmpty)
        );
        assert!(target.join("pip.conf").exists());
    }

    // ---- dry run ----

    #[test]
    fn dry_run_reports_plan_without_changes() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let ctx = ctx.with_dry_run(true);
        let source = fx.source("bar");

        let absent = fx.home.join(".absent");
        assert_eq!(reconcile(&LinkSpec::link(&absent, &source), &ctx), Outcome::Created);
        assert!(!symlink::source_exists(&absent));

        let broken = fx.home.join(".broken");
        make_link(fx.repo.join("gone"), &broken).unwrap();
        assert_eq!(
            reconcile(&LinkSpec::link(&broken, &source), &ctx),
            Outcome::Replaced { was_broken: true }
        );
        assert_eq!(std::fs::read_link(&broken).unwrap(), fx.repo.join("gone"));

        let file = fx.home.join(".file");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(
            reconcile(&LinkSpec::remove(&file), &ctx),
            Outcome::Removed { existed: true }
        );
        assert!(file.exists());
    }

    // ---- whole table ----

    #[test]
    fn reconcile_all_records_every_entry_in_order() {
        let fx = Fixture::new();
        let (ctx, log) = fx.ctx();
        let source = fx.source("bar");
        std::fs::write(fx.home.join(".b"), "user").unwrap();
        let specs = vec![
            LinkSpec::link(fx.home.join(".a"), &source),
            LinkSpec::link(fx.home.join(".b"), &source),
            LinkSpec::link(fx.home.join(".c"), &source).when(false),
        ];
        let mut report = RunReport::new(false);

        reconcile_all(&specs, &ctx, &mut report).unwrap();

        let outcomes: Vec<_> = report.links().iter().map(|(_, o)| o.clone()).collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::Created,
                Outcome::Failed(LinkError::NotASymlink),
                Outcome::Skipped(SkipReason::ConditionFalse),
            ]
        );
        let errors = log.messages(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains(".b"));
        assert!(errors[0].ends_with(": failed, exists, not a symlink"));
    }

    #[test]
    fn reconcile_all_pads_target_column() {
        let fx = Fixture::new();
        let (ctx, log) = fx.ctx();
        let specs = vec![LinkSpec::link("/x", "/y").when(false)];
        let mut report = RunReport::new(false);
        reconcile_all(&specs, &ctx, &mut report).unwrap();

        let info = log.messages(Level::Info);
        assert_eq!(info[0], format!("{:<50} : skipped, condition false", "/x"));
    }

    #[test]
    fn reconcile_all_aborts_on_fail_on_error() {
        let fx = Fixture::new();
        let (ctx, _) = fx.ctx();
        let source = fx.source("bar");
        std::fs::write(fx.home.join(".a"), "user").unwrap();
        let specs = vec![
            LinkSpec::link(fx.home.join(".a"), &source).fail_on_error(),
            LinkSpec::link(fx.home.join(".b"), &source),
        ];
        let mut report = RunReport::new(false);

        let err = reconcile_all(&specs, &ctx, &mut report).unwrap_err();
        assert!(matches!(
            err,
            RunError::Aborted {
                reason: LinkError::NotASymlink,
                ..
            }
        ));
        assert_eq!(report.links().len(), 1);
        assert!(!symlink::source_exists(&fx.home.join(".b")));
    }

    #[test]
    fn reconcile_all_dry_run_lines_are_marked() {
        let fx = Fixture::new();
        let (ctx, log) = fx.ctx();
        let ctx = ctx.with_dry_run(true);
        let source = fx.source("bar");
        let specs = vec![LinkSpec::link(fx.home.join(".a"), &source)];
        let mut report = RunReport::new(true);

        reconcile_all(&specs, &ctx, &mut report).unwrap();
        let planned = log.messages(Level::DryRun);
        assert_eq!(planned.len(), 1);
        assert!(planned[0].contains("symlink created from"));
    }
}
