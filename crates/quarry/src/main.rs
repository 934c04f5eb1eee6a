//! Quarry CLI - Minecraft server plugin management
//!
//! This is the main entry point for the Quarry command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use quarry_plugins::{Catalog, PluginManager};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    let manager = PluginManager::open(cli.dir.clone(), Catalog::with_default_sources());

    // Run command
    match cli.command {
        Commands::Search(args) => commands::search::run(&manager, args).await,
        Commands::Install(args) => commands::install::run(&manager, args).await,
        Commands::Update(args) => commands::update::run(&manager, args).await,
        Commands::Delete(args) => commands::delete::run(&manager, args),
        Commands::Enable(args) => commands::state::enable(&manager, args),
        Commands::Disable(args) => commands::state::disable(&manager, args),
        Commands::Pin(args) => commands::pin::pin(&manager, args).await,
        Commands::Unpin(args) => commands::pin::unpin(&manager, args),
        Commands::Deps(args) => commands::deps::run(&manager, args),
        Commands::List(args) => commands::list::run(&manager, args),
        Commands::Config(args) => commands::config::run(&manager, args),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
