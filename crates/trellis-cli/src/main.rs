mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trellis_router::RouterConfig;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about = "File-based route inspection and cache maintenance", long_about = None)]
struct Cli {
    /// Path to a trellis.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every resolvable route in the routes tree
    Routes {
        /// Emit the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Route cache maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Check the routes tree for problems
    Check,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cache location, freshness, and route counts
    Info,
    /// Delete the persisted route cache
    Clear,
}

fn main() {
    let cli = Cli::parse();
    let config = RouterConfig::load(cli.config.as_deref());

    let result: Result<()> = match cli.command {
        Commands::Routes { json } => commands::routes::execute(&config, json),
        Commands::Cache { command } => match command {
            CacheCommands::Info => commands::cache::info(&config),
            CacheCommands::Clear => commands::cache::clear(&config),
        },
        Commands::Check => commands::check::execute(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
