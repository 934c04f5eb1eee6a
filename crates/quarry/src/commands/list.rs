//! List installed plugins

use anyhow::Result;
use tabled::{Table, Tabled};

use quarry_plugins::PluginManager;

use crate::cli::ListArgs;
use crate::output;

#[derive(Tabled)]
struct PluginRow {
    plugin: String,
    name: String,
    version: String,
    state: String,
    pinned: String,
    updated: String,
}

pub fn run(manager: &PluginManager, args: ListArgs) -> Result<()> {
    let records = manager.list()?;
    let untracked = manager.scan_untracked()?;

    if args.json {
        let listing = serde_json::json!({
            "plugins": records,
            "untracked": untracked,
        });
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if records.is_empty() && untracked.is_empty() {
        output::info("No plugins installed yet");
        output::info("Install plugins with: quarry install <source>:<id>");
        return Ok(());
    }

    let rows: Vec<PluginRow> = records
        .iter()
        .map(|rec| PluginRow {
            plugin: rec.key.to_string(),
            name: rec.name.clone(),
            version: rec.version.to_string(),
            state: if rec.enabled { "enabled" } else { "disabled" }.to_string(),
            pinned: if rec.pinned { "yes" } else { "-" }.to_string(),
            updated: rec.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }

    if !untracked.is_empty() {
        output::warning(&format!(
            "{} jar(s) in plugins/ are not managed by quarry:",
            untracked.len()
        ));
        for file in &untracked {
            output::kv("untracked", file);
        }
    }
    Ok(())
}
