mod cli;
mod commands;
mod model;
mod normalizer;
mod util;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "driver-stats failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Inventory(args) => commands::inventory::run(args),
        Commands::Normalize(args) => commands::normalize::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_raises_default_level() {
        assert_eq!(default_directive(0), "info");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(4), "trace");
    }

    #[test]
    fn verbose_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["driver-stats", "status", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Status(_)));
    }
}
