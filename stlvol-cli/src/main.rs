/// stlvol - volume and mass of a binary STL mesh
///
/// Usage: stlvol <FILE.STL> [ABS|PLA|CFRP|Plexiglass] [--unit cm|inch]
///
/// Prints one JSON object on stdout: the estimate, or `{"error": ...}`.
/// Logs go to stderr (RUST_LOG or -v).

use clap::Parser;
use std::io;
use std::process::ExitCode;
use stlvol_cli::{run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let result = cli.load_config().and_then(|config| run(&cli, &config, &mut io::stdout().lock()));

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{:#}", err);
            println!("{}", serde_json::json!({ "error": format!("{:#}", err) }));
            ExitCode::FAILURE
        }
    }
}
