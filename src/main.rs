use clap::Parser;
use std::io;
use std::process::exit;
use tracing_subscriber::EnvFilter;

use pairctl::cli::Cli;
use pairctl::dispatch::{self, ActionRegistry};
use pairctl::error::Error;
use pairctl::snapshot::SnapshotLibrary;

fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Every failure ends up here with its own exit status
    if let Err(err) = run(&cli) {
        eprintln!("{}", err.report());
        exit(err.exit_code());
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let library = SnapshotLibrary::new(&cli.snapshot);
    let registry = ActionRegistry::builtin();

    dispatch::run(cli, &library, &registry, &mut io::stdout().lock())?;
    library.save_if_dirty().map_err(Error::Action)?;
    Ok(())
}
