//! Pin and unpin plugin versions

use anyhow::Result;

use quarry_core::PluginKey;
use quarry_plugins::PluginManager;

use crate::cli::{PinArgs, PluginArgs};
use crate::output;

pub async fn pin(manager: &PluginManager, args: PinArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    manager.pin(&key, &args.version, args.upgrade).await?;
    output::success(&format!("Pinned {} at {}", key, args.version));
    output::info("Dependency resolution will not move it; unpin to allow updates");
    Ok(())
}

pub fn unpin(manager: &PluginManager, args: PluginArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    manager.unpin(&key)?;
    output::success(&format!("Unpinned {}", key));
    Ok(())
}
