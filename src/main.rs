use clap::Parser;
use std::process::ExitCode;

use dotlink::cli::Cli;

fn main() -> ExitCode {
    let args = Cli::parse();
    dotlink::install::run(&args)
}
