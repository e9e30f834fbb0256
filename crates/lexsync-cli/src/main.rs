//! lexsync CLI: the `lexsync` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use std::io;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Parse { fixture, json } => commands::parse::run(fixture, json),

        Commands::VerifyDepot {
            fixture,
            repo,
            json,
        } => commands::verify_depot::run(cli.config, fixture, repo, json),

        Commands::VerifyDocstore {
            fixture,
            project,
            dump_dir,
            json,
        } => commands::verify_docstore::run(commands::verify_docstore::Args {
            config: cli.config,
            fixture,
            project,
            dump_dir,
            json,
        }),
    }
}
