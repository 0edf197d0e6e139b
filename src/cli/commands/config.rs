//! `lilerp config` command - Configuration inspection
//!
//! Settings come from the global config file, then `LILERP_*` environment
//! variables, then command-line flags.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{effective_format, load_config, print_serialized};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Show paths to the config file and the database
    Path,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("database", "Database file (env LILERP_DB)"),
    ("default_format", "Default output format (env LILERP_FORMAT)"),
    (
        "insert_retries",
        "Retries after a test number collision (env LILERP_INSERT_RETRIES)",
    ),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Path => run_path(global),
    }
}

fn config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "database" => Some(config.database_path().display().to_string()),
        "default_format" => config.default_format.clone(),
        "insert_retries" => Some(config.insert_retries().to_string()),
        _ => None,
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);

    if let Some(ref key) = args.key {
        if !VALID_KEYS.iter().any(|(k, _)| *k == key.as_str()) {
            let keys: Vec<&str> = VALID_KEYS.iter().map(|(k, _)| *k).collect();
            return Err(miette::miette!(
                "Unknown key '{}'. Valid keys: {}",
                key,
                keys.join(", ")
            ));
        }
        return match config_value(&config, key) {
            Some(value) => {
                println!("{}", value);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_serialized(&config, f),
        _ => {
            for (key, description) in VALID_KEYS {
                let value = config_value(&config, key).unwrap_or_else(|| "(not set)".to_string());
                println!("{:<16} {}", style(key).bold(), style(value).cyan());
                println!("{:<16} {}", "", style(description).dim());
            }
            Ok(())
        }
    }
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    match Config::global_config_path() {
        Some(path) => {
            let marker = if path.exists() {
                style("(exists)").green()
            } else {
                style("(not created)").dim()
            };
            println!("Config:   {} {}", path.display(), marker);
        }
        None => println!("Config:   {}", style("(no home directory)").dim()),
    }
    println!("Database: {}", config.database_path().display());
    Ok(())
}
