//! CLI parse tests.

use super::{Cli, CliCommand, RunArgs};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

/// The command a parsed CLI runs, with the bare form mapped to `Run`.
pub(super) fn command(args: &[&str]) -> CliCommand {
    let cli = parse(args);
    cli.command.unwrap_or(CliCommand::Run(cli.run))
}

pub(super) fn run_args(args: &[&str]) -> RunArgs {
    match command(args) {
        CliCommand::Run(run) => run,
        other => panic!("expected Run, got {other:?}"),
    }
}
