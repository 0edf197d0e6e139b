//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    bridge::BridgeArgs, completions::CompletionsArgs, config::ConfigCommands, db::DbCommands,
    master::MasterCommands, pack::PackCommands, raw::RawCommands,
};

#[derive(Parser)]
#[command(name = "lilerp")]
#[command(author, version, about = "Receiving inventory for raw and packing materials")]
#[command(long_about = "Tracks received raw materials and packing materials under daily test numbers, \
with a master catalog that fills in raw material details and derives expire dates.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Database file (default: LILERP_DB, then config, then the data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Raw material receiving records (AR test numbers)
    #[command(subcommand)]
    Raw(RawCommands),

    /// Packing material receiving records (AP test numbers)
    #[command(subcommand)]
    Pack(PackCommands),

    /// Raw material master catalog
    #[command(subcommand)]
    Master(MasterCommands),

    /// Database file management
    #[command(subcommand)]
    Db(DbCommands),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Answer JSON requests on stdin, one per line
    Bridge(BridgeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (details for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just test numbers (or master names), one per line
    Id,
}
