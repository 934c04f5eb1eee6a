//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Quarry - Minecraft server plugin management
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Server directory (contains plugins/)
    #[arg(short, long, global = true, default_value = ".")]
    pub dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search plugin catalogs
    Search(SearchArgs),

    /// Install a plugin and its dependencies
    Install(InstallArgs),

    /// Update a plugin to the newest allowed version
    Update(UpdateArgs),

    /// Remove a plugin, its record, and its config
    Delete(DeleteArgs),

    /// Re-activate a disabled plugin
    Enable(PluginArgs),

    /// Deactivate a plugin without uninstalling it
    Disable(PluginArgs),

    /// Pin a plugin at a version
    Pin(PinArgs),

    /// Clear a plugin's version pin
    Unpin(PluginArgs),

    /// Check a plugin's dependencies against what is installed
    Deps(PluginArgs),

    /// List installed plugins
    List(ListArgs),

    /// Per-plugin configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Restrict to one source (modrinth, hangar, spigot)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Filter by category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Plugin key (source:id), optionally with @version or @>=version
    pub plugin: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Plugin key (source:id)
    pub plugin: String,

    /// Update a pinned plugin, dropping its pin
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Plugin key (source:id)
    pub plugin: String,
}

#[derive(Args, Debug)]
pub struct PluginArgs {
    /// Plugin key (source:id)
    pub plugin: String,
}

#[derive(Args, Debug)]
pub struct PinArgs {
    /// Plugin key (source:id)
    pub plugin: String,

    /// Version to pin at
    pub version: String,

    /// Install the pinned version first if it differs
    #[arg(short, long)]
    pub upgrade: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show a plugin's config entry
    Get(ConfigGetArgs),

    /// Set one config value
    Set(ConfigSetArgs),

    /// Remove one config value
    Unset(ConfigUnsetArgs),
}

#[derive(Args, Debug)]
pub struct ConfigGetArgs {
    /// Plugin key (source:id)
    pub plugin: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Plugin key (source:id)
    pub plugin: String,

    /// Setting name
    pub name: String,

    /// Setting value
    pub value: String,
}

#[derive(Args, Debug)]
pub struct ConfigUnsetArgs {
    /// Plugin key (source:id)
    pub plugin: String,

    /// Setting name
    pub name: String,
}
