//! Update an installed plugin

use anyhow::Result;

use quarry_core::PluginKey;
use quarry_plugins::PluginManager;

use crate::cli::UpdateArgs;
use crate::commands::report;
use crate::output;

pub async fn run(manager: &PluginManager, args: UpdateArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    output::info(&format!("Checking {} for updates", key));

    let outcome = manager.update(key, args.force).await?;
    report(&outcome)
}
