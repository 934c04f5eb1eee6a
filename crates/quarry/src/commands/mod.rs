//! Command implementations

pub mod config;
pub mod delete;
pub mod deps;
pub mod install;
pub mod list;
pub mod pin;
pub mod search;
pub mod state;
pub mod update;

use anyhow::{Context, Result};

use quarry_core::{PluginKey, VersionConstraint};
use quarry_plugins::lifecycle::ApplyReport;

use crate::output;

/// Parse `source:id` with an optional `@version` / `@>=version` suffix
pub fn parse_plugin_spec(spec: &str) -> Result<(PluginKey, VersionConstraint)> {
    let (key_part, constraint) = match spec.rsplit_once('@') {
        Some((key, version)) => {
            let constraint: VersionConstraint = version
                .parse()
                .with_context(|| format!("Invalid version '{}'", version))?;
            (key, constraint)
        }
        None => (spec, VersionConstraint::Any),
    };
    let key: PluginKey = key_part
        .parse()
        .with_context(|| format!("Invalid plugin key '{}'", key_part))?;
    Ok((key, constraint))
}

/// Print what a plan execution did
pub fn report(report: &ApplyReport) -> Result<()> {
    for action in &report.completed {
        output::action(action);
    }

    if let Some(failed) = &report.failed {
        output::error(&format!("{} failed: {}", failed.action, failed.error));
        for action in &report.not_attempted {
            output::warning(&format!("Not attempted: {}", action));
        }
        anyhow::bail!("plan execution stopped after a failure");
    }
    Ok(())
}
