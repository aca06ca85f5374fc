// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! autofilter - channel indexing for a sharded media search store.
//!
//! The binary carries the offline maintenance commands. The bot process
//! itself is started through [`autofilter::serve::run_serve`] by an embedder
//! that supplies the protocol client.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use autofilter::commands;
use autofilter::serve::init_tracing;

/// autofilter - channel indexing for a sharded media search store.
#[derive(Parser, Debug)]
#[command(name = "autofilter", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Open every database, run migrations and report shard counts.
    Check,
    /// List persisted index operations.
    Operations {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show shard sizes and the write target.
    Shards,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => autofilter_config::load_and_validate_path(path),
        None => autofilter_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            autofilter_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.app.log_level);

    let result = match cli.command {
        Some(Commands::Check) => commands::run_check(&config).await,
        Some(Commands::Operations { json }) => commands::run_operations(&config, json).await,
        Some(Commands::Shards) => commands::run_shards(&config).await,
        None => {
            println!("autofilter: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["autofilter", "operations", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Operations { json: true })));

        let cli = Cli::try_parse_from(["autofilter", "-c", "/etc/af.toml", "shards"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/af.toml")));
        assert!(matches!(cli.command, Some(Commands::Shards)));
    }
}
