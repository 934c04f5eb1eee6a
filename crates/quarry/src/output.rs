//! Terminal output for plugin operations

use console::style;

use quarry_plugins::Action;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("ok").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("error").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("warning").yellow().bold(), msg);
}

/// Print an informational message
pub fn info(msg: &str) {
    println!("{} {}", style("->").cyan(), msg);
}

/// Print a section header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print an indented key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Print one committed plan action
pub fn action(action: &Action) {
    match action {
        Action::Install { key, version } => {
            success(&format!("Installed {} {}", key, version));
        }
        Action::Upgrade { key, from, to } => {
            success(&format!("Upgraded {} {} -> {}", key, from, to));
        }
        Action::Skip { key, reason } => {
            info(&format!("Skipped {}: {}", key, reason));
        }
        // Conflicts never reach execution; resolution fails first.
        Action::Conflict { .. } => {}
    }
}
