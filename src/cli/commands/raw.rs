//! `lilerp raw` command - Raw material receiving records

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm_delete, effective_format, insert_with_retries, load_config, open_store,
    print_field, print_serialized, resolve_raw, today,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{expand, InventoryError, InventoryStore, TestNumber};
use crate::entities::common::blank_to_none;
use crate::entities::{
    RawMaterial, RawMaterialDraft, RawMaterialField, RecordKind, StorageCondition, WeightUnit,
};

#[derive(Subcommand, Debug)]
pub enum RawCommands {
    /// List raw materials, newest first
    List(ListArgs),

    /// Show a raw material by id or test number
    Show(ShowArgs),

    /// Receive a raw material under a new test number
    New(NewArgs),

    /// Change fields of a raw material
    Edit(EditArgs),

    /// Delete a raw material
    Delete(DeleteArgs),

    /// Print the next free AR test number
    NextNumber(NextNumberArgs),

    /// Check whether a test number is already used
    Check(CheckArgs),

    /// Show the most recent raw material with a given name
    Latest(LatestArgs),
}

/// Columns available in `raw list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListColumn {
    Id,
    TestNumber,
    Name,
    Quantity,
    NetWeight,
    Receiving,
    Manufactured,
    Expires,
    Vendor,
    Country,
    Storage,
    FoodType,
}

impl ListColumn {
    fn key(&self) -> &'static str {
        match self {
            ListColumn::Id => "id",
            ListColumn::TestNumber => "test_number",
            ListColumn::Name => "name",
            ListColumn::Quantity => "quantity",
            ListColumn::NetWeight => "net_weight",
            ListColumn::Receiving => "receiving_quantity",
            ListColumn::Manufactured => "manufacturing_date",
            ListColumn::Expires => "expire_date",
            ListColumn::Vendor => "vendor",
            ListColumn::Country => "country",
            ListColumn::Storage => "storage_conditions",
            ListColumn::FoodType => "food_type",
        }
    }
}

impl std::fmt::Display for ListColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListColumn::Id => write!(f, "id"),
            ListColumn::TestNumber => write!(f, "test-number"),
            ListColumn::Name => write!(f, "name"),
            ListColumn::Quantity => write!(f, "quantity"),
            ListColumn::NetWeight => write!(f, "net-weight"),
            ListColumn::Receiving => write!(f, "receiving"),
            ListColumn::Manufactured => write!(f, "manufactured"),
            ListColumn::Expires => write!(f, "expires"),
            ListColumn::Vendor => write!(f, "vendor"),
            ListColumn::Country => write!(f, "country"),
            ListColumn::Storage => write!(f, "storage"),
            ListColumn::FoodType => write!(f, "food-type"),
        }
    }
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("test_number", "TEST NO", 12),
    ColumnDef::new("name", "NAME", 28),
    ColumnDef::new("quantity", "QTY", 6),
    ColumnDef::new("net_weight", "NET WT", 12),
    ColumnDef::new("receiving_quantity", "RECEIVED", 10),
    ColumnDef::new("manufacturing_date", "MFG", 12),
    ColumnDef::new("expire_date", "EXPIRES", 12),
    ColumnDef::new("vendor", "VENDOR", 20),
    ColumnDef::new("country", "COUNTRY", 10),
    ColumnDef::new("storage_conditions", "STORAGE", 26),
    ColumnDef::new("food_type", "FOOD TYPE", 16),
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in name, vendor and test number
    #[arg(long)]
    pub search: Option<String>,

    /// Only records received under this date's test numbers (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Only records already past their expire date
    #[arg(long)]
    pub expired: bool,

    /// Columns to display
    #[arg(long, value_delimiter = ',', default_values_t = vec![
        ListColumn::TestNumber,
        ListColumn::Name,
        ListColumn::Quantity,
        ListColumn::NetWeight,
        ListColumn::Expires,
        ListColumn::Vendor
    ])]
    pub columns: Vec<ListColumn>,

    /// Reverse sort order (oldest first)
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Row id or test number (AR...)
    pub reference: String,
}

#[derive(clap::Args, Debug, Default)]
pub struct RecordFields {
    /// Material name
    #[arg(long)]
    pub name: Option<String>,

    /// Received amount (default: net weight x quantity)
    #[arg(long)]
    pub receiving_quantity: Option<f64>,

    /// Net weight per unit
    #[arg(long)]
    pub net_weight: Option<f64>,

    /// Unit of the net weight (kg, g, mg)
    #[arg(long)]
    pub weight_unit: Option<WeightUnit>,

    /// Number of units received
    #[arg(long, short = 'Q')]
    pub quantity: Option<i64>,

    /// Manufacturing date (YYYY-MM-DD)
    #[arg(long)]
    pub manufacturing_date: Option<NaiveDate>,

    /// Expire date (YYYY-MM-DD)
    #[arg(long)]
    pub expire_date: Option<NaiveDate>,

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
    /// Use this test number instead of generating one
    #[arg(long, short = 't')]
    pub test_number: Option<TestNumber>,

    /// Fill in details from the named master; the expire date is derived
    /// from --manufacturing-date and the master's shelf life
    #[arg(long, short = 'm')]
    pub master: Option<String>,

    /// Date the generated test number is issued for (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[command(flatten)]
    pub fields: RecordFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Row id or test number (AR...)
    pub reference: String,

    /// New test number
    #[arg(long, short = 't')]
    pub test_number: Option<TestNumber>,

    #[command(flatten)]
    pub fields: RecordFields,

    /// Remove the food type
    #[arg(long, conflicts_with = "food_type")]
    pub clear_food_type: bool,

    /// Remove the memo
    #[arg(long, conflicts_with = "memo")]
    pub clear_memo: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Row id or test number (AR...)
    pub reference: String,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct NextNumberArgs {
    /// Issue date (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Test number to look for
    pub test_number: String,

    /// Ignore the record with this row id (its own number while editing)
    #[arg(long)]
    pub exclude: Option<i64>,
}

#[derive(clap::Args, Debug)]
pub struct LatestArgs {
    /// Exact material name
    pub name: String,
}

/// Run a raw subcommand
pub fn run(cmd: RawCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RawCommands::List(args) => run_list(args, global),
        RawCommands::Show(args) => run_show(args, global),
        RawCommands::New(args) => run_new(args, global),
        RawCommands::Edit(args) => run_edit(args, global),
        RawCommands::Delete(args) => run_delete(args, global),
        RawCommands::NextNumber(args) => run_next_number(args, global),
        RawCommands::Check(args) => run_check(args, global),
        RawCommands::Latest(args) => run_latest(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let format = match effective_format(global, &config) {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    let today = today();
    let search = args.search.as_ref().map(|s| s.to_lowercase());

    let mut materials: Vec<RawMaterial> = store
        .list_raw_materials()?
        .into_iter()
        .filter(|m| match search {
            Some(ref needle) => {
                m.name.to_lowercase().contains(needle)
                    || m.vendor.to_lowercase().contains(needle)
                    || m.test_number.to_string().to_lowercase().contains(needle)
            }
            None => true,
        })
        .filter(|m| args.date.map_or(true, |d| m.test_number.date() == d))
        .filter(|m| !args.expired || m.expire_date < today)
        .collect();

    if args.reverse {
        materials.reverse();
    }
    if let Some(limit) = args.limit {
        materials.truncate(limit);
    }

    if args.count {
        println!("{}", materials.len());
        return Ok(());
    }

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(&materials, format),
        _ => {
            if materials.is_empty() && format == OutputFormat::Tsv {
                println!("No raw materials found.");
                return Ok(());
            }
            let rows: Vec<TableRow> = materials.iter().map(|m| table_row(m, today)).collect();
            let visible: Vec<&str> = args.columns.iter().map(ListColumn::key).collect();
            let mut formatter = TableFormatter::new(COLUMNS, "raw material");
            if global.quiet {
                formatter = formatter.without_summary();
            }
            formatter.output(&rows, format, &visible)
        }
    }
}

fn table_row(m: &RawMaterial, today: NaiveDate) -> TableRow {
    TableRow::new(m.test_number.to_string())
        .cell("id", CellValue::Number(m.id))
        .cell("test_number", CellValue::Id(m.test_number.to_string()))
        .cell("name", CellValue::Text(m.name.clone()))
        .cell("quantity", CellValue::Number(m.quantity))
        .cell(
            "net_weight",
            CellValue::Text(format!("{} {}", m.net_weight, m.weight_unit)),
        )
        .cell("receiving_quantity", CellValue::Float(m.receiving_quantity, 2))
        .cell("manufacturing_date", CellValue::Date(m.manufacturing_date))
        .cell("expire_date", CellValue::Expiry(m.expire_date, today))
        .cell("vendor", CellValue::Text(m.vendor.clone()))
        .cell("country", CellValue::Text(m.country.clone()))
        .cell(
            "storage_conditions",
            CellValue::Text(m.storage_conditions.to_string()),
        )
        .cell("food_type", CellValue::Optional(m.food_type.clone()))
}

fn print_record(material: &RawMaterial, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(material, format),
        OutputFormat::Id => {
            println!("{}", material.test_number);
            Ok(())
        }
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            print_field("Test Number", style(material.test_number).cyan());
            print_field("Name", style(&material.name).yellow());
            print_field("Receiving Quantity", material.receiving_quantity);
            print_field(
                "Net Weight",
                format!("{} {}", material.net_weight, material.weight_unit),
            );
            print_field("Quantity", material.quantity);
            print_field("Manufacturing Date", material.manufacturing_date);
            let expire = if material.expire_date < today() {
                style(material.expire_date.to_string()).red()
            } else {
                style(material.expire_date.to_string()).white()
            };
            print_field("Expire Date", expire);
            print_field("Vendor", &material.vendor);
            print_field("Country", &material.country);
            print_field("Storage", material.storage_conditions);
            if let Some(ref food_type) = material.food_type {
                print_field("Food Type", food_type);
            }
            if let Some(ref memo) = material.memo {
                print_field("Memo", memo);
            }
            println!("{}", style("─".repeat(60)).dim());
            print_field("Id", material.id);
            print_field("Created", style(material.created_at).dim());
            print_field("Updated", style(material.updated_at).dim());
            Ok(())
        }
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let material = resolve_raw(&store, &args.reference)?;
    print_record(&material, effective_format(global, &config))
}

fn required<T: Clone>(value: &Option<T>, flag: &str) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| miette::miette!("{} is required", flag))
}

/// Assemble the draft for `raw new`, from a master or from the flags alone
fn build_draft(store: &InventoryStore, args: &NewArgs) -> Result<RawMaterialDraft> {
    let f = &args.fields;
    let quantity = required(&f.quantity, "--quantity")?;
    let manufacturing_date = required(&f.manufacturing_date, "--manufacturing-date")?;

    let draft = match args.master {
        Some(ref master_name) => {
            let master = store.get_master_by_name(master_name.trim())?.ok_or_else(|| {
                InventoryError::NotFound {
                    kind: "raw material master",
                    id: master_name.clone(),
                }
            })?;
            let net_weight = f.net_weight.unwrap_or(master.net_weight);
            let receiving_quantity = f
                .receiving_quantity
                .unwrap_or_else(|| expand::receiving_quantity(net_weight, quantity));

            let mut draft =
                expand::expand(&master, manufacturing_date, receiving_quantity, quantity)?;
            draft.net_weight = net_weight;
            if let Some(ref name) = f.name {
                draft.name = name.clone();
            }
            if let Some(unit) = f.weight_unit {
                draft.weight_unit = unit;
            }
            if let Some(expire_date) = f.expire_date {
                draft.expire_date = expire_date;
            }
            if let Some(ref vendor) = f.vendor {
                draft.vendor = vendor.clone();
            }
            if let Some(ref country) = f.country {
                draft.country = country.clone();
            }
            if let Some(storage) = f.storage {
                draft.storage_conditions = storage;
            }
            if f.food_type.is_some() {
                draft.food_type = f.food_type.clone();
            }
            if f.memo.is_some() {
                draft.memo = f.memo.clone();
            }
            draft
        }
        None => {
            let net_weight = required(&f.net_weight, "--net-weight")?;
            RawMaterialDraft {
                name: required(&f.name, "--name")?,
                receiving_quantity: f
                    .receiving_quantity
                    .unwrap_or_else(|| expand::receiving_quantity(net_weight, quantity)),
                net_weight,
                weight_unit: f.weight_unit.unwrap_or_default(),
                quantity,
                manufacturing_date,
                expire_date: required(&f.expire_date, "--expire-date")?,
                vendor: required(&f.vendor, "--vendor")?,
                country: required(&f.country, "--country")?,
                storage_conditions: f.storage.unwrap_or_default(),
                food_type: f.food_type.clone(),
                memo: f.memo.clone(),
            }
        }
    };

    Ok(draft.normalized())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let mut store = open_store(&config)?;
    let draft = build_draft(&store, &args)?;
    draft.validate()?;

    let material = insert_with_retries(
        &mut store,
        RecordKind::RawMaterial,
        args.date.unwrap_or_else(today),
        args.test_number,
        config.insert_retries(),
        |store, test_number| store.create_raw_material(test_number, &draft),
    )?;

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Id) => {
            print_record(&material, f)
        }
        _ => {
            if !global.quiet {
                println!(
                    "{} Created raw material {}",
                    style("✓").green(),
                    style(material.test_number).cyan()
                );
                println!(
                    "   {} | {} | expires {}",
                    style(&material.name).yellow(),
                    material.vendor,
                    material.expire_date
                );
            }
            Ok(())
        }
    }
}

fn edit_fields(args: &EditArgs) -> Vec<RawMaterialField> {
    let f = &args.fields;
    let mut fields = Vec::new();
    if let Some(tn) = args.test_number {
        fields.push(RawMaterialField::TestNumber(tn));
    }
    if let Some(ref v) = f.name {
        fields.push(RawMaterialField::Name(v.trim().to_string()));
    }
    if let Some(v) = f.receiving_quantity {
        fields.push(RawMaterialField::ReceivingQuantity(v));
    }
    if let Some(v) = f.net_weight {
        fields.push(RawMaterialField::NetWeight(v));
    }
    if let Some(v) = f.weight_unit {
        fields.push(RawMaterialField::WeightUnit(v));
    }
    if let Some(v) = f.quantity {
        fields.push(RawMaterialField::Quantity(v));
    }
    if let Some(v) = f.manufacturing_date {
        fields.push(RawMaterialField::ManufacturingDate(v));
    }
    if let Some(v) = f.expire_date {
        fields.push(RawMaterialField::ExpireDate(v));
    }
    if let Some(ref v) = f.vendor {
        fields.push(RawMaterialField::Vendor(v.trim().to_string()));
    }
    if let Some(ref v) = f.country {
        fields.push(RawMaterialField::Country(v.trim().to_string()));
    }
    if let Some(v) = f.storage {
        fields.push(RawMaterialField::StorageConditions(v));
    }
    if let Some(ref v) = f.food_type {
        fields.push(RawMaterialField::FoodType(blank_to_none(Some(v.trim().to_string()))));
    } else if args.clear_food_type {
        fields.push(RawMaterialField::FoodType(None));
    }
    if let Some(ref v) = f.memo {
        fields.push(RawMaterialField::Memo(blank_to_none(Some(v.clone()))));
    } else if args.clear_memo {
        fields.push(RawMaterialField::Memo(None));
    }
    fields
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let mut store = open_store(&config)?;
    let current = resolve_raw(&store, &args.reference)?;

    let fields = edit_fields(&args);
    if fields.is_empty() && !global.quiet {
        eprintln!("{} Nothing to change", style("!").yellow());
    }

    let updated = store
        .update_raw_material(current.id, &fields)?
        .ok_or_else(|| InventoryError::NotFound {
            kind: RecordKind::RawMaterial.label(),
            id: current.id.to_string(),
        })?;

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Id) => {
            print_record(&updated, f)
        }
        _ => {
            if !global.quiet {
                println!(
                    "{} Updated raw material {} ({} field(s))",
                    style("✓").green(),
                    style(updated.test_number).cyan(),
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
    let material = resolve_raw(&store, &args.reference)?;

    let what = format!("raw material {} ({})", material.test_number, material.name);
    if !confirm_delete(&what, args.yes)? {
        return Ok(());
    }

    if store.delete_raw_material(material.id)? && !global.quiet {
        println!(
            "{} Deleted raw material {}",
            style("✓").green(),
            style(material.test_number).cyan()
        );
    }
    Ok(())
}

fn run_next_number(args: NextNumberArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let next = store.generate_test_number(RecordKind::RawMaterial, args.date.unwrap_or_else(today))?;
    match effective_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::json!(next)),
        _ => println!("{}", next),
    }
    Ok(())
}

fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let candidate = args.test_number.trim().to_uppercase();
    let exists = store.test_number_exists(RecordKind::RawMaterial, &candidate, args.exclude)?;
    print_check(&candidate, exists, effective_format(global, &config));
    Ok(())
}

/// Shared by `raw check` and `pack check`
pub(crate) fn print_check(candidate: &str, exists: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "testNumber": candidate, "exists": exists })),
        OutputFormat::Tsv | OutputFormat::Csv | OutputFormat::Id => println!("{}", exists),
        _ => {
            if exists {
                println!("{} {} is already in use", style("✗").red(), style(candidate).cyan());
            } else {
                println!("{} {} is available", style("✓").green(), style(candidate).cyan());
            }
        }
    }
}

fn run_latest(args: LatestArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let material = store
        .find_latest_raw_material_by_name(args.name.trim())?
        .ok_or_else(|| InventoryError::NotFound {
            kind: RecordKind::RawMaterial.label(),
            id: args.name.clone(),
        })?;
    print_record(&material, effective_format(global, &config))
}
