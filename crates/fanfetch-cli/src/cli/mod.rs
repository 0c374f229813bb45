//! CLI for fanfetch.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use fanfetch_core::config;
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{run_bench, run_completions, run_fetch, run_fetch_one};

/// Top-level CLI. Without a subcommand, the run flags apply directly
/// (`fanfetch -l URL...` is `fanfetch run -l URL...`).
#[derive(Debug, Parser)]
#[command(name = "fanfetch", version)]
#[command(about = "fanfetch: fetch a list of URLs concurrently and save each to a file", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct RunArgs {
    /// URLs to fetch; repeat the flag or list several after it. Defaults to the configured list.
    #[arg(short = 'l', long = "links", value_name = "URL", num_args = 1..)]
    pub links: Vec<String>,

    /// parallel-worker, isolated-process or cooperative-concurrent (default from config).
    #[arg(long, value_name = "NAME")]
    pub strategy: Option<String>,

    /// Directory to write files into (default from config, else the current directory).
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Run at most N units at once.
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print the run report as JSON instead of one line per file.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch the targets with one strategy (the default command).
    Run(RunArgs),

    /// Fetch the targets once with every strategy and compare timings.
    Bench {
        /// URLs to fetch. Defaults to the configured list.
        #[arg(short = 'l', long = "links", value_name = "URL", num_args = 1..)]
        links: Vec<String>,

        /// Run at most N units at once in every strategy.
        #[arg(short = 'j', long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Run one unit from a JSON request and print a JSON report (isolated-process worker).
    #[command(name = "fetch-one", hide = true)]
    FetchOne {
        request: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();
        let command = cli.command.unwrap_or(CliCommand::Run(cli.run));

        // Workers and completions never touch the config file.
        match command {
            CliCommand::FetchOne { request } => return Ok(run_fetch_one(&request)),
            CliCommand::Completions { shell } => {
                run_completions(shell);
                return Ok(ExitCode::SUCCESS);
            }
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match command {
            CliCommand::Run(args) => run_fetch(&args, &cfg).await?,
            CliCommand::Bench { links, jobs } => run_bench(&links, jobs, &cfg).await?,
            CliCommand::FetchOne { .. } | CliCommand::Completions { .. } => {}
        }
        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests;
