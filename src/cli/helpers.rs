//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, InventoryError, InventoryStore, TestNumber};
use crate::entities::{PackingMaterial, RawMaterial, RawMaterialMaster, RecordKind};

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Today's local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Layered config with the `--db` flag applied on top
pub fn load_config(global: &GlobalOpts) -> Config {
    let mut config = Config::load();
    if let Some(ref db) = global.db {
        config.database = Some(db.clone());
    }
    config
}

/// Open the store the config points at
pub fn open_store(config: &Config) -> Result<InventoryStore> {
    let path = config.database_path();
    debug!(path = %path.display(), "opening store");
    Ok(InventoryStore::open(&path)?)
}

/// `--format`, or the configured default when left on auto
pub fn effective_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    match config.default_format.as_deref() {
        Some(name) => OutputFormat::from_str(name, true).unwrap_or_else(|_| {
            warn!(format = name, "unknown default_format in config, using auto");
            OutputFormat::Auto
        }),
        None => OutputFormat::Auto,
    }
}

/// Print a single value as JSON or YAML
pub fn print_serialized<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
    }
    Ok(())
}

/// Print a `label: value` line of the pretty `show` layout
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{:<20} {}", style(format!("{}:", label)).bold(), value);
}

fn not_found(kind: &'static str, reference: &str) -> InventoryError {
    InventoryError::NotFound {
        kind,
        id: reference.to_string(),
    }
}

/// Find a raw material by row id or test number
pub fn resolve_raw(store: &InventoryStore, reference: &str) -> Result<RawMaterial> {
    let reference = reference.trim();
    let found = match reference.parse::<i64>() {
        Ok(id) => store.get_raw_material(id)?,
        Err(_) => store.get_raw_material_by_test_number(&reference.to_uppercase())?,
    };
    Ok(found.ok_or_else(|| not_found(RecordKind::RawMaterial.label(), reference))?)
}

/// Find a packing material by row id or test number
pub fn resolve_packing(store: &InventoryStore, reference: &str) -> Result<PackingMaterial> {
    let reference = reference.trim();
    let found = match reference.parse::<i64>() {
        Ok(id) => store.get_packing_material(id)?,
        Err(_) => store.get_packing_material_by_test_number(&reference.to_uppercase())?,
    };
    Ok(found.ok_or_else(|| not_found(RecordKind::PackingMaterial.label(), reference))?)
}

/// Find a master by row id or exact name
pub fn resolve_master(store: &InventoryStore, reference: &str) -> Result<RawMaterialMaster> {
    let reference = reference.trim();
    let found = match reference.parse::<i64>() {
        Ok(id) => store.get_master(id)?,
        Err(_) => store.get_master_by_name(reference)?,
    };
    Ok(found.ok_or_else(|| not_found("raw material master", reference))?)
}

/// Ask before deleting; `--yes` skips the prompt
///
/// Without a terminal on stderr the prompt cannot be answered, so `--yes`
/// is required.
pub fn confirm_delete(what: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !Term::stderr().is_term() {
        return Err(miette::miette!(
            "refusing to delete {} without confirmation; pass --yes",
            what
        ));
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Delete {}?", what))
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Insert under a generated test number, regenerating on collision
///
/// An explicit number is tried once. A generated one is retried up to
/// `retries` more times when another writer took it in between.
pub fn insert_with_retries<T>(
    store: &mut InventoryStore,
    kind: RecordKind,
    date: NaiveDate,
    explicit: Option<TestNumber>,
    retries: u32,
    mut insert: impl FnMut(&mut InventoryStore, &TestNumber) -> crate::core::Result<T>,
) -> Result<T> {
    if let Some(test_number) = explicit {
        return Ok(insert(store, &test_number)?);
    }

    let mut attempt = 0;
    loop {
        let test_number = store.generate_test_number(kind, date)?;
        match insert(store, &test_number) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                warn!(%test_number, attempt, "test number taken, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }
}
