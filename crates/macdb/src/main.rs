mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use macdb_core::MacStore;

use crate::cli::{Cli, Command};
use crate::error::{CliError, exit_code};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            // Wrong argument count or shape: show usage and exit cleanly.
            _ => {
                let _ = err.print();
                std::process::exit(exit_code::SUCCESS);
            }
        },
    };

    init_tracing(cli.global.verbose, cli.global.quiet);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, quiet: bool) {
    let filter = match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    // stdout carries CSV and rendered records; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "macdb", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let store_config = config::store_config(&cli.global)?;
            let store = MacStore::connect(&store_config).await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, store, &cli.global).await
        }
    }
}
