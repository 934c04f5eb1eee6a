//! Install a plugin and its dependency closure

use anyhow::Result;

use quarry_plugins::PluginManager;

use crate::cli::InstallArgs;
use crate::commands::{parse_plugin_spec, report};
use crate::output;

pub async fn run(manager: &PluginManager, args: InstallArgs) -> Result<()> {
    let (key, constraint) = parse_plugin_spec(&args.plugin)?;
    output::info(&format!("Resolving {}", key));

    let outcome = manager.install(key, constraint).await?;
    report(&outcome)
}
