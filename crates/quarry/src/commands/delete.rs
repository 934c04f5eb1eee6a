//! Remove a plugin

use anyhow::Result;

use quarry_core::PluginKey;
use quarry_plugins::PluginManager;

use crate::cli::DeleteArgs;
use crate::output;

pub fn run(manager: &PluginManager, args: DeleteArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    let record = manager.delete(&key)?;
    output::success(&format!("Deleted {} {}", record.key, record.version));
    Ok(())
}
