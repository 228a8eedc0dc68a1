//! Dotfiles link installer.
//!
//! Reconciles a declarative table of symlinks from a dotfiles repository
//! into the home directory, then runs a sequence of post-install shell
//! actions and reports what happened.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: parse and validate the TOML manifest
//! - **[`resources`]**: filesystem primitives (observe a target, create or remove links)
//! - **[`tasks`]**: run stages: submodule probe, link reconciler, action runner
//! - **[`install`]**: top-level driver and exit code mapping
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod install;
pub mod logging;
pub mod platform;
pub mod report;
pub mod resources;
pub mod tasks;
