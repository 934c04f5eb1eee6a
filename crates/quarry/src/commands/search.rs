//! Search plugin catalogs

use anyhow::Result;
use tabled::{Table, Tabled};

use quarry_plugins::PluginManager;

use crate::cli::SearchArgs;
use crate::output;

#[derive(Tabled, serde::Serialize)]
struct SearchRow {
    source: String,
    id: String,
    name: String,
    downloads: u64,
    description: String,
}

pub async fn run(manager: &PluginManager, args: SearchArgs) -> Result<()> {
    let results = manager
        .catalog()
        .search(&args.query, args.category.as_deref(), args.source.as_deref())
        .await?;

    let rows: Vec<SearchRow> = results
        .into_iter()
        .map(|hit| SearchRow {
            source: hit.source,
            id: hit.id,
            name: hit.name,
            downloads: hit.downloads,
            description: truncate(&hit.description, 60),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        output::warning(&format!("No plugins found for '{}'", args.query));
    } else {
        println!("{}", Table::new(&rows));
        output::info("Install with: quarry install <source>:<id>");
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}
