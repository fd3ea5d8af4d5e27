//! Implementation of `sift check`.

use std::process::ExitCode;

use comfy_table::Cell;
use sift_config::{ConfigWarning, discover_config_files, is_global_config};

use crate::cli::{context::CommandContext, output::table};

/// Exit codes for `sift check`.
mod exit_codes {
    use std::process::ExitCode;

    /// Configuration is valid with no warnings.
    pub const OK: ExitCode = ExitCode::SUCCESS;
    /// Configuration has warnings but is usable.
    pub const WARNINGS: ExitCode = ExitCode::FAILURE;
}

/// Validates the loaded configuration and reports warnings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config_files = discover_config_files(&ctx.cwd);

    if config_files.is_empty() {
        println!("No configuration files found.");
        println!();
        println!("Run 'sift init' to create a configuration file.");
        return exit_codes::OK;
    }

    println!("Config files:");
    for path in &config_files {
        let scope = if is_global_config(path) { " (global)" } else { "" };
        println!("  {}{scope}", path.display());
    }
    println!();

    let config = &ctx.config;
    println!("Fields:");
    if config.fields.is_empty() {
        println!("  (none defined)");
    } else {
        let mut fields = table(&["Field", "Prefixes"]);
        for (name, prefixes) in &config.fields {
            let shown: Vec<String> = prefixes.iter().map(|p| format!("{p:?}")).collect();
            fields.add_row(vec![Cell::new(name), Cell::new(shown.join(", "))]);
        }
        println!("{fields}");
    }
    println!();

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("No issues found.");
        return exit_codes::OK;
    }

    println!("Warnings ({}):", warnings.len());
    for warning in &warnings {
        println!("  - {warning}");
    }
    println!();
    print_hints(&warnings);

    exit_codes::WARNINGS
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    let mut hints: Vec<&str> = warnings
        .iter()
        .map(|warning| match warning {
            ConfigWarning::ZeroWindow { .. } => {
                "Use a phrase instead of a zero proximity window, or raise the window."
            }
            ConfigWarning::FieldWithoutPrefixes { .. } => {
                "Give every field at least one prefix, or remove it."
            }
            ConfigWarning::DuplicatePrefix { .. } => "Remove repeated prefixes from the field.",
            ConfigWarning::DefaultFieldUnmapped { .. } | ConfigWarning::NoFieldsDefined => {
                "Add a [fields] section mapping field names to index prefixes."
            }
        })
        .collect();

    hints.sort_unstable();
    hints.dedup();

    println!("Hints:");
    for hint in hints {
        println!("  - {hint}");
    }
}
