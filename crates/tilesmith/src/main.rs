//! Tilesmith CLI - cut images into content-addressed tiles and index their tags.
//!
//! Tilesmith reads a directory of images, writes a thumbnail, a tile grid and
//! a YAML/JSON sidecar per image, and finishes with one sidecar per embedded
//! XMP keyword plus tag and image indexes.
//!
//! # Usage
//!
//! ```bash
//! # Tile a directory into ./out
//! tilesmith process ./photos/
//!
//! # Recurse, 512px tiles, JSON sidecars, keep going past broken files
//! tilesmith process ./photos/ -r -s 512 --format json --ignore-errors -o site/media
//!
//! # View configuration
//! tilesmith config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilesmith_core::Config;

mod cli;
mod logging;

/// Tilesmith - tile photographs and index their embedded tags.
#[derive(Parser, Debug)]
#[command(name = "tilesmith")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE", env = "TILESMITH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Tile images and write sidecars, tag sidecars and indexes
    Process(cli::process::ProcessArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // An explicit --config must load; the default location falls back to
    // defaults. Logging isn't initialized yet, so warnings go to stderr.
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => match Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `tilesmith config path`."
                );
                Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs, cli.log.as_deref());

    tracing::debug!("Tilesmith v{}", tilesmith_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config),
        Commands::Config(args) => cli::config::execute(args, config, cli.config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tilesmith", "process", "photos", "-v", "--log", "run.log",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log, Some(PathBuf::from("run.log")));
        assert!(matches!(cli.command, Commands::Process(_)));
    }
}
