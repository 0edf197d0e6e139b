//! `lilerp master` command - Raw material master catalog
//!
//! Masters are templates: `raw new --master NAME` and `master expand` copy
//! their attributes into a raw material and derive the expire date from the
//! shelf life.

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm_delete, effective_format, load_config, open_store, print_field, print_serialized,
    resolve_master,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{expand, InventoryError};
use crate::entities::common::blank_to_none;
use crate::entities::{MasterDraft, MasterField, RawMaterialMaster, StorageCondition, WeightUnit};

#[derive(Subcommand, Debug)]
pub enum MasterCommands {
    /// List masters by name
    List(ListArgs),

    /// Show a master by id or name
    Show(ShowArgs),

    /// Find masters whose name contains a text (at most 10)
    Search(SearchArgs),

    /// Add a master
    New(NewArgs),

    /// Change fields of a master
    Edit(EditArgs),

    /// Delete a master (records received from it are kept)
    Delete(DeleteArgs),

    /// Preview the raw material a master expands to, without saving it
    Expand(ExpandArgs),
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("name", "NAME", 28),
    ColumnDef::new("shelf_life_days", "SHELF LIFE", 11),
    ColumnDef::new("net_weight", "NET WT", 12),
    ColumnDef::new("vendor", "VENDOR", 20),
    ColumnDef::new("country", "COUNTRY", 10),
    ColumnDef::new("storage_conditions", "STORAGE", 26),
];

const VISIBLE: &[&str] = &[
    "id",
    "name",
    "shelf_life_days",
    "net_weight",
    "vendor",
    "storage_conditions",
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Row id or exact name
    pub reference: String,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Text contained in the name
    pub query: String,
}

#[derive(clap::Args, Debug, Default)]
pub struct MasterFields {
    /// Unique master name
    #[arg(long)]
    pub name: Option<String>,

    /// Days from manufacturing to expiry
    #[arg(long)]
    pub shelf_life_days: Option<u32>,

    /// Net weight per unit
    #[arg(long)]
    pub net_weight: Option<f64>,

    /// Unit of the net weight (kg, g, mg)
    #[arg(long)]
    pub weight_unit: Option<WeightUnit>,

    #[arg(long)]
    pub vendor: Option<String>,

    /// Country of origin
    #[arg(long)]
    pub country: Option<String>,

    /// Storage condition (room, freezing, refrigerating)
    #[arg(long)]
    pub storage: Option<StorageCondition>,

    #[arg(long)]
    pub food_type: Option<String>,

    #[arg(long)]
    pub memo: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: MasterFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Row id or exact name
    pub reference: String,

    #[command(flatten)]
    pub fields: MasterFields,

    /// Remove the food type
    #[arg(long, conflicts_with = "food_type")]
    pub clear_food_type: bool,

    /// Remove the memo
    #[arg(long, conflicts_with = "memo")]
    pub clear_memo: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Row id or exact name
    pub reference: String,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ExpandArgs {
    /// Row id or exact name
    pub reference: String,

    /// Manufacturing date (YYYY-MM-DD)
    #[arg(long)]
    pub manufacturing_date: NaiveDate,

    /// Number of units received
    #[arg(long, short = 'Q')]
    pub quantity: i64,

    /// Received amount (default: net weight x quantity)
    #[arg(long)]
    pub receiving_quantity: Option<f64>,
}

/// Run a master subcommand
pub fn run(cmd: MasterCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MasterCommands::List(args) => run_list(args, global),
        MasterCommands::Show(args) => run_show(args, global),
        MasterCommands::Search(args) => run_search(args, global),
        MasterCommands::New(args) => run_new(args, global),
        MasterCommands::Edit(args) => run_edit(args, global),
        MasterCommands::Delete(args) => run_delete(args, global),
        MasterCommands::Expand(args) => run_expand(args, global),
    }
}

fn print_masters(masters: &[RawMaterialMaster], global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let format = match format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(&masters, format),
        _ => {
            if masters.is_empty() && format == OutputFormat::Tsv {
                println!("No raw material masters found.");
                return Ok(());
            }
            let rows: Vec<TableRow> = masters
                .iter()
                .map(|m| {
                    TableRow::new(m.name.clone())
                        .cell("id", CellValue::Number(m.id))
                        .cell("name", CellValue::Id(m.name.clone()))
                        .cell(
                            "shelf_life_days",
                            CellValue::Number(i64::from(m.shelf_life_days)),
                        )
                        .cell(
                            "net_weight",
                            CellValue::Text(format!("{} {}", m.net_weight, m.weight_unit)),
                        )
                        .cell("vendor", CellValue::Text(m.vendor.clone()))
                        .cell("country", CellValue::Text(m.country.clone()))
                        .cell(
                            "storage_conditions",
                            CellValue::Text(m.storage_conditions.to_string()),
                        )
                })
                .collect();
            let mut formatter = TableFormatter::new(COLUMNS, "raw material master");
            if global.quiet {
                formatter = formatter.without_summary();
            }
            formatter.output(&rows, format, VISIBLE)
        }
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let mut masters = store.list_masters()?;
    if let Some(limit) = args.limit {
        masters.truncate(limit);
    }

    if args.count {
        println!("{}", masters.len());
        return Ok(());
    }
    print_masters(&masters, global, effective_format(global, &config))
}

fn run_search(args: SearchArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let masters = store.search_masters(args.query.trim())?;
    print_masters(&masters, global, effective_format(global, &config))
}

fn print_record(master: &RawMaterialMaster, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(master, format),
        OutputFormat::Id => {
            println!("{}", master.name);
            Ok(())
        }
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            print_field("Name", style(&master.name).yellow());
            print_field("Shelf Life", format!("{} day(s)", master.shelf_life_days));
            print_field(
                "Net Weight",
                format!("{} {}", master.net_weight, master.weight_unit),
            );
            print_field("Vendor", &master.vendor);
            print_field("Country", &master.country);
            print_field("Storage", master.storage_conditions);
            if let Some(ref food_type) = master.food_type {
                print_field("Food Type", food_type);
            }
            if let Some(ref memo) = master.memo {
                print_field("Memo", memo);
            }
            println!("{}", style("─".repeat(60)).dim());
            print_field("Id", master.id);
            print_field("Created", style(master.created_at).dim());
            print_field("Updated", style(master.updated_at).dim());
            Ok(())
        }
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let master = resolve_master(&store, &args.reference)?;
    print_record(&master, effective_format(global, &config))
}

fn build_draft(fields: &MasterFields) -> Result<MasterDraft> {
    let missing = |flag: &str| miette::miette!("{} is required", flag);

    let draft = MasterDraft {
        name: fields.name.clone().ok_or_else(|| missing("--name"))?,
        shelf_life_days: fields
            .shelf_life_days
            .ok_or_else(|| missing("--shelf-life-days"))?,
        net_weight: fields.net_weight.ok_or_else(|| missing("--net-weight"))?,
        weight_unit: fields.weight_unit.unwrap_or_default(),
        vendor: fields.vendor.clone().ok_or_else(|| missing("--vendor"))?,
        country: fields.country.clone().ok_or_else(|| missing("--country"))?,
        storage_conditions: fields.storage.unwrap_or_default(),
        food_type: fields.food_type.clone(),
        memo: fields.memo.clone(),
    };
    Ok(draft.normalized())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let mut store = open_store(&config)?;
    let master = store.create_master(&build_draft(&args.fields)?)?;

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Id) => print_record(&master, f),
        _ => {
            if !global.quiet {
                println!(
                    "{} Created raw material master {}",
                    style("✓").green(),
                    style(&master.name).cyan()
                );
                println!(
                    "   {} | {} day(s) shelf life",
                    master.vendor, master.shelf_life_days
                );
            }
            Ok(())
        }
    }
}

fn edit_fields(args: &EditArgs) -> Vec<MasterField> {
    let f = &args.fields;
    let mut fields = Vec::new();
    if let Some(ref v) = f.name {
        fields.push(MasterField::Name(v.trim().to_string()));
    }
    if let Some(v) = f.shelf_life_days {
        fields.push(MasterField::ShelfLifeDays(v));
    }
    if let Some(v) = f.net_weight {
        fields.push(MasterField::NetWeight(v));
    }
    if let Some(v) = f.weight_unit {
        fields.push(MasterField::WeightUnit(v));
    }
    if let Some(ref v) = f.vendor {
        fields.push(MasterField::Vendor(v.trim().to_string()));
    }
    if let Some(ref v) = f.country {
        fields.push(MasterField::Country(v.trim().to_string()));
    }
    if let Some(v) = f.storage {
        fields.push(MasterField::StorageConditions(v));
    }
    if let Some(ref v) = f.food_type {
        fields.push(MasterField::FoodType(blank_to_none(Some(v.trim().to_string()))));
    } else if args.clear_food_type {
        fields.push(MasterField::FoodType(None));
    }
    if let Some(ref v) = f.memo {
        fields.push(MasterField::Memo(blank_to_none(Some(v.clone()))));
    } else if args.clear_memo {
        fields.push(MasterField::Memo(None));
    }
    fields
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let mut store = open_store(&config)?;
    let current = resolve_master(&store, &args.reference)?;

    let fields = edit_fields(&args);
    if fields.is_empty() && !global.quiet {
        eprintln!("{} Nothing to change", style("!").yellow());
    }

    let updated = store
        .update_master(current.id, &fields)?
        .ok_or_else(|| InventoryError::NotFound {
            kind: "raw material master",
            id: current.id.to_string(),
        })?;

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Id) => {
            print_record(&updated, f)
        }
        _ => {
            if !global.quiet {
                println!(
                    "{} Updated raw material master {} ({} field(s))",
                    style("✓").green(),
                    style(&updated.name).cyan(),
                    fields.len()
                );
            }
            Ok(())
        }
    }
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let mut store = open_store(&config)?;
    let master = resolve_master(&store, &args.reference)?;

    if !confirm_delete(&format!("raw material master '{}'", master.name), args.yes)? {
        return Ok(());
    }

    if store.delete_master(master.id)? && !global.quiet {
        println!(
            "{} Deleted raw material master {}",
            style("✓").green(),
            style(&master.name).cyan()
        );
    }
    Ok(())
}

fn run_expand(args: ExpandArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let master = resolve_master(&store, &args.reference)?;

    let receiving_quantity = args
        .receiving_quantity
        .unwrap_or_else(|| expand::receiving_quantity(master.net_weight, args.quantity));
    let draft = store.expand_master(
        master.id,
        args.manufacturing_date,
        receiving_quantity,
        args.quantity,
    )?;

    match effective_format(global, &config) {
        OutputFormat::Json => print_serialized(&draft, OutputFormat::Json),
        _ => print_serialized(&draft, OutputFormat::Yaml),
    }
}
