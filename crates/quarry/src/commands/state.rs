//! Enable and disable plugins

use anyhow::Result;

use quarry_core::PluginKey;
use quarry_plugins::PluginManager;

use crate::cli::PluginArgs;
use crate::output;

pub fn enable(manager: &PluginManager, args: PluginArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    manager.enable(&key)?;
    output::success(&format!("Enabled {}", key));
    Ok(())
}

pub fn disable(manager: &PluginManager, args: PluginArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    manager.disable(&key)?;
    output::success(&format!("Disabled {}", key));
    output::info("The artifact stays in plugins/ with a .disabled suffix");
    Ok(())
}
