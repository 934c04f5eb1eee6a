//! Check a plugin's dependencies

use anyhow::Result;
use tabled::{Table, Tabled};

use quarry_core::PluginKey;
use quarry_plugins::lifecycle::DependencyState;
use quarry_plugins::PluginManager;

use crate::cli::PluginArgs;
use crate::output;

#[derive(Tabled)]
struct DepRow {
    dependency: String,
    required: String,
    installed: String,
    status: String,
}

pub fn run(manager: &PluginManager, args: PluginArgs) -> Result<()> {
    let key: PluginKey = args.plugin.parse()?;
    let statuses = manager.check_dependencies(&key)?;

    if statuses.is_empty() {
        output::info(&format!("{} declares no dependencies", key));
        return Ok(());
    }

    let rows: Vec<DepRow> = statuses
        .iter()
        .map(|status| {
            let (installed, label) = match &status.state {
                DependencyState::Satisfied { installed } => (installed.to_string(), "ok"),
                DependencyState::Missing => ("-".to_string(), "missing"),
                DependencyState::Mismatch { installed } => {
                    (installed.to_string(), "version mismatch")
                }
            };
            DepRow {
                dependency: status.target.to_string(),
                required: status.constraint.to_string(),
                installed,
                status: label.to_string(),
            }
        })
        .collect();

    println!("{}", Table::new(&rows));

    let unsatisfied = statuses.iter().filter(|s| !s.is_satisfied()).count();
    if unsatisfied > 0 {
        output::warning(&format!("{} unsatisfied dependencies", unsatisfied));
        anyhow::bail!("dependency check failed for {}", key);
    }
    output::success("All dependencies satisfied");
    Ok(())
}
