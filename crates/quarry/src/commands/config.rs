//! Per-plugin configuration commands

use anyhow::Result;

use quarry_core::PluginKey;
use quarry_plugins::PluginManager;

use crate::cli::{ConfigCommands, ConfigGetArgs, ConfigSetArgs, ConfigUnsetArgs};
use crate::output;

pub fn run(manager: &PluginManager, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Get(args) => get(manager, args),
        ConfigCommands::Set(args) => set(manager, args),
        ConfigCommands::Unset(args) => unset(manager, args),
    }
}

fn get(manager: &PluginManager, args: ConfigGetArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    let entry = manager.config_get(&key)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    if entry.is_empty() {
        output::info(&format!("No config stored for {}", key));
        return Ok(());
    }

    output::header(&format!("Config: {}", key));
    for (name, value) in &entry {
        output::kv(name, value);
    }
    Ok(())
}

fn set(manager: &PluginManager, args: ConfigSetArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    manager.config_set(&key, &args.name, &args.value)?;
    output::success(&format!("Set {} for {}", args.name, key));
    Ok(())
}

fn unset(manager: &PluginManager, args: ConfigUnsetArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    if manager.config_unset(&key, &args.name)? {
        output::success(&format!("Removed {} for {}", args.name, key));
    } else {
        output::warning(&format!("{} was not set for {}", args.name, key));
    }
    Ok(())
}
