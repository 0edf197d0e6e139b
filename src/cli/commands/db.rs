//! `lilerp db` command - Database file management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{effective_format, load_config, open_store, print_serialized};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Create the database file and schema if missing
    Init,

    /// Show database location, schema version and record counts
    Status,
}

/// Run a db subcommand
pub fn run(cmd: DbCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        DbCommands::Init => run_init(global),
        DbCommands::Status => run_status(global),
    }
}

fn run_init(global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let path = config.database_path();
    let existed = path.exists();
    let store = open_store(&config)?;

    if !global.quiet {
        let verb = if existed { "Opened" } else { "Created" };
        println!(
            "{} {} database {} (schema v{})",
            style("✓").green(),
            verb,
            style(path.display()).cyan(),
            store.schema_version()?
        );
    }
    Ok(())
}

fn run_status(global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let stats = store.statistics()?;

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_serialized(&stats, f),
        _ => {
            println!("{}", style("Inventory Database").bold().underlined());
            println!("{}", style("─".repeat(40)).dim());
            let location = stats
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(in memory)".to_string());
            println!("Location:          {}", style(location).cyan());
            println!("Schema version:    {}", stats.schema_version);
            println!("Size:              {} KB", stats.db_size_bytes / 1024);
            println!();
            println!("Raw materials:     {}", style(stats.raw_materials).cyan());
            println!("Packing materials: {}", style(stats.packing_materials).cyan());
            println!("Masters:           {}", style(stats.masters).cyan());
            Ok(())
        }
    }
}
