use clap::{Args, Parser};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::actions::Feature;
use crate::tasks::submodules::SubmoduleMode;

/// Version string: `git describe` output when built from a checkout.
pub const VERSION: &str = match option_env!("DOTLINK_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Link a dotfiles repository into the home directory, then run the
/// post-install actions.
#[derive(Parser, Debug)]
#[command(
    name = "dotlink",
    about = "Link dotfiles into the home directory and run post-install actions",
    version = VERSION
)]
pub struct Cli {
    /// Replace existing symlinks that already point somewhere valid
    #[arg(short, long)]
    pub force: bool,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Override dotfiles root directory
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Override the home directory links are installed into
    #[arg(long, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Manifest to use instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// What to do when git submodules are not checked out
    #[arg(long, value_enum, value_name = "MODE", default_value_t = SubmoduleMode::Prompt)]
    pub submodules: SubmoduleMode,

    #[command(flatten)]
    pub skip: SkipOpts,
}

/// `--skip-<feature>` switches for post-install actions.
#[derive(Args, Debug, Clone, Default)]
pub struct SkipOpts {
    /// Skip installing vim plugins
    #[arg(long)]
    pub skip_vimplug: bool,

    /// Skip updating zgen plugins
    #[arg(long)]
    pub skip_zgen: bool,

    /// Skip installing tmux plugins
    #[arg(long)]
    pub skip_tmux: bool,

    /// Skip changing the login shell
    #[arg(long)]
    pub skip_chsh: bool,

    /// Skip the git identity prompt
    #[arg(long)]
    pub skip_gitconfig: bool,
}

impl SkipOpts {
    /// Features switched off on the command line.
    #[must_use]
    pub fn features(&self) -> BTreeSet<Feature> {
        [
            (self.skip_vimplug, Feature::Vimplug),
            (self.skip_zgen, Feature::Zgen),
            (self.skip_tmux, Feature::Tmux),
            (self.skip_chsh, Feature::Chsh),
            (self.skip_gitconfig, Feature::Gitconfig),
        ]
        .into_iter()
        .filter_map(|(skipped, feature)| skipped.then_some(feature))
        .collect()
    }
}
