//! `lilerp pack` command - Packing material receiving records

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;

use crate::cli::commands::raw::print_check;
use crate::cli::helpers::{
    confirm_delete, effective_format, insert_with_retries, load_config, open_store,
    print_field, print_serialized, resolve_packing, today,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{InventoryError, TestNumber};
use crate::entities::common::blank_to_none;
use crate::entities::{PackingMaterial, PackingMaterialDraft, PackingMaterialField, RecordKind};

#[derive(Subcommand, Debug)]
pub enum PackCommands {
    /// List packing materials, newest first
    List(ListArgs),

    /// Show a packing material by id or test number
    Show(ShowArgs),

    /// Receive a packing material under a new test number
    New(NewArgs),

    /// Change fields of a packing material
    Edit(EditArgs),

    /// Delete a packing material
    Delete(DeleteArgs),

    /// Print the next free AP test number
    NextNumber(NextNumberArgs),

    /// Check whether a test number is already used
    Check(CheckArgs),
}

/// Inspection outcome on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliVerdict {
    Pass,
    Fail,
}

impl From<CliVerdict> for bool {
    fn from(v: CliVerdict) -> Self {
        v == CliVerdict::Pass
    }
}

/// Result filter for list command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VerdictFilter {
    Pass,
    Fail,
    All,
}

/// Columns available in `pack list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListColumn {
    Id,
    TestNumber,
    Product,
    Material,
    Quantity,
    Lot,
    Expires,
    Result,
    Category,
    Vendor,
}

impl ListColumn {
    fn key(&self) -> &'static str {
        match self {
            ListColumn::Id => "id",
            ListColumn::TestNumber => "test_number",
            ListColumn::Product => "product_name",
            ListColumn::Material => "material_name",
            ListColumn::Quantity => "receiving_quantity",
            ListColumn::Lot => "lot_number",
            ListColumn::Expires => "expire_date",
            ListColumn::Result => "result",
            ListColumn::Category => "category",
            ListColumn::Vendor => "vendor",
        }
    }
}

impl std::fmt::Display for ListColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListColumn::Id => write!(f, "id"),
            ListColumn::TestNumber => write!(f, "test-number"),
            ListColumn::Product => write!(f, "product"),
            ListColumn::Material => write!(f, "material"),
            ListColumn::Quantity => write!(f, "quantity"),
            ListColumn::Lot => write!(f, "lot"),
            ListColumn::Expires => write!(f, "expires"),
            ListColumn::Result => write!(f, "result"),
            ListColumn::Category => write!(f, "category"),
            ListColumn::Vendor => write!(f, "vendor"),
        }
    }
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("test_number", "TEST NO", 12),
    ColumnDef::new("product_name", "PRODUCT", 24),
    ColumnDef::new("material_name", "MATERIAL", 24),
    ColumnDef::new("receiving_quantity", "QTY", 8),
    ColumnDef::new("lot_number", "LOT", 16),
    ColumnDef::new("expire_date", "EXPIRES", 12),
    ColumnDef::new("result", "RESULT", 8),
    ColumnDef::new("category", "CATEGORY", 16),
    ColumnDef::new("vendor", "VENDOR", 20),
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by inspection result
    #[arg(long, default_value = "all")]
    pub result: VerdictFilter,

    /// Filter by category (exact, case-insensitive)
    #[arg(long)]
    pub category: Option<String>,

    /// Search in product name, material name, lot number and test number
    #[arg(long)]
    pub search: Option<String>,

    /// Only records received under this date's test numbers (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Columns to display
    #[arg(long, value_delimiter = ',', default_values_t = vec![
        ListColumn::TestNumber,
        ListColumn::Product,
        ListColumn::Material,
        ListColumn::Quantity,
        ListColumn::Lot,
        ListColumn::Result
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
    /// Row id or test number (AP...)
    pub reference: String,
}

#[derive(clap::Args, Debug, Default)]
pub struct RecordFields {
    /// Product the material is packed for
    #[arg(long)]
    pub product: Option<String>,

    /// Packing material name
    #[arg(long)]
    pub material: Option<String>,

    /// Number of units received
    #[arg(long, short = 'Q')]
    pub quantity: Option<i64>,

    /// Supplier lot number
    #[arg(long)]
    pub lot: Option<String>,

    /// Expire date (YYYY-MM-DD)
    #[arg(long)]
    pub expire_date: Option<NaiveDate>,

    /// Inspection result (new records default to pass)
    #[arg(long)]
    pub result: Option<CliVerdict>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub vendor: Option<String>,

    #[arg(long)]
    pub memo: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Use this test number instead of generating one
    #[arg(long, short = 't')]
    pub test_number: Option<TestNumber>,

    /// Date the generated test number is issued for (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[command(flatten)]
    pub fields: RecordFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Row id or test number (AP...)
    pub reference: String,

    /// New test number
    #[arg(long, short = 't')]
    pub test_number: Option<TestNumber>,

    #[command(flatten)]
    pub fields: RecordFields,

    /// Remove the memo
    #[arg(long, conflicts_with = "memo")]
    pub clear_memo: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Row id or test number (AP...)
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

    /// Ignore the record with this row id
    #[arg(long)]
    pub exclude: Option<i64>,
}

/// Run a pack subcommand
pub fn run(cmd: PackCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PackCommands::List(args) => run_list(args, global),
        PackCommands::Show(args) => run_show(args, global),
        PackCommands::New(args) => run_new(args, global),
        PackCommands::Edit(args) => run_edit(args, global),
        PackCommands::Delete(args) => run_delete(args, global),
        PackCommands::NextNumber(args) => run_next_number(args, global),
        PackCommands::Check(args) => run_check(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let format = match effective_format(global, &config) {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    let search = args.search.as_ref().map(|s| s.to_lowercase());
    let mut materials: Vec<PackingMaterial> = store
        .list_packing_materials()?
        .into_iter()
        .filter(|m| match args.result {
            VerdictFilter::Pass => m.result,
            VerdictFilter::Fail => !m.result,
            VerdictFilter::All => true,
        })
        .filter(|m| {
            args.category
                .as_ref()
                .map_or(true, |c| m.category.eq_ignore_ascii_case(c.trim()))
        })
        .filter(|m| match search {
            Some(ref needle) => {
                m.product_name.to_lowercase().contains(needle)
                    || m.material_name.to_lowercase().contains(needle)
                    || m.lot_number.to_lowercase().contains(needle)
                    || m.test_number.to_string().to_lowercase().contains(needle)
            }
            None => true,
        })
        .filter(|m| args.date.map_or(true, |d| m.test_number.date() == d))
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
                println!("No packing materials found.");
                return Ok(());
            }
            let today = today();
            let rows: Vec<TableRow> = materials
                .iter()
                .map(|m| {
                    TableRow::new(m.test_number.to_string())
                        .cell("id", CellValue::Number(m.id))
                        .cell("test_number", CellValue::Id(m.test_number.to_string()))
                        .cell("product_name", CellValue::Text(m.product_name.clone()))
                        .cell("material_name", CellValue::Text(m.material_name.clone()))
                        .cell("receiving_quantity", CellValue::Number(m.receiving_quantity))
                        .cell("lot_number", CellValue::Text(m.lot_number.clone()))
                        .cell("expire_date", CellValue::Expiry(m.expire_date, today))
                        .cell("result", CellValue::Verdict(m.result))
                        .cell("category", CellValue::Text(m.category.clone()))
                        .cell("vendor", CellValue::Text(m.vendor.clone()))
                })
                .collect();
            let visible: Vec<&str> = args.columns.iter().map(ListColumn::key).collect();
            let mut formatter = TableFormatter::new(COLUMNS, "packing material");
            if global.quiet {
                formatter = formatter.without_summary();
            }
            formatter.output(&rows, format, &visible)
        }
    }
}

fn print_record(material: &PackingMaterial, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(material, format),
        OutputFormat::Id => {
            println!("{}", material.test_number);
            Ok(())
        }
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            print_field("Test Number", style(material.test_number).cyan());
            print_field("Product", style(&material.product_name).yellow());
            print_field("Material", &material.material_name);
            print_field("Receiving Quantity", material.receiving_quantity);
            print_field("Lot Number", &material.lot_number);
            print_field("Expire Date", material.expire_date);
            let verdict = if material.result {
                style("pass").green()
            } else {
                style("fail").red().bold()
            };
            print_field("Result", verdict);
            print_field("Category", &material.category);
            print_field("Vendor", &material.vendor);
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
    let material = resolve_packing(&store, &args.reference)?;
    print_record(&material, effective_format(global, &config))
}

fn build_draft(fields: &RecordFields) -> Result<PackingMaterialDraft> {
    fn required<T: Clone>(value: &Option<T>, flag: &str) -> Result<T> {
        value
            .clone()
            .ok_or_else(|| miette::miette!("{} is required", flag))
    }

    let draft = PackingMaterialDraft {
        product_name: required(&fields.product, "--product")?,
        material_name: required(&fields.material, "--material")?,
        receiving_quantity: required(&fields.quantity, "--quantity")?,
        lot_number: required(&fields.lot, "--lot")?,
        expire_date: required(&fields.expire_date, "--expire-date")?,
        result: fields.result.map_or(true, bool::from),
        category: required(&fields.category, "--category")?,
        vendor: required(&fields.vendor, "--vendor")?,
        memo: fields.memo.clone(),
    };
    Ok(draft.normalized())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let mut store = open_store(&config)?;
    let draft = build_draft(&args.fields)?;
    draft.validate()?;

    let material = insert_with_retries(
        &mut store,
        RecordKind::PackingMaterial,
        args.date.unwrap_or_else(today),
        args.test_number,
        config.insert_retries(),
        |store, test_number| store.create_packing_material(test_number, &draft),
    )?;

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Id) => {
            print_record(&material, f)
        }
        _ => {
            if !global.quiet {
                println!(
                    "{} Created packing material {}",
                    style("✓").green(),
                    style(material.test_number).cyan()
                );
                println!(
                    "   {} | {} | lot {}",
                    style(&material.product_name).yellow(),
                    material.material_name,
                    material.lot_number
                );
            }
            Ok(())
        }
    }
}

fn edit_fields(args: &EditArgs) -> Vec<PackingMaterialField> {
    let f = &args.fields;
    let mut fields = Vec::new();
    if let Some(tn) = args.test_number {
        fields.push(PackingMaterialField::TestNumber(tn));
    }
    if let Some(ref v) = f.product {
        fields.push(PackingMaterialField::ProductName(v.trim().to_string()));
    }
    if let Some(ref v) = f.material {
        fields.push(PackingMaterialField::MaterialName(v.trim().to_string()));
    }
    if let Some(v) = f.quantity {
        fields.push(PackingMaterialField::ReceivingQuantity(v));
    }
    if let Some(ref v) = f.lot {
        fields.push(PackingMaterialField::LotNumber(v.trim().to_string()));
    }
    if let Some(v) = f.expire_date {
        fields.push(PackingMaterialField::ExpireDate(v));
    }
    if let Some(v) = f.result {
        fields.push(PackingMaterialField::Result(v.into()));
    }
    if let Some(ref v) = f.category {
        fields.push(PackingMaterialField::Category(v.trim().to_string()));
    }
    if let Some(ref v) = f.vendor {
        fields.push(PackingMaterialField::Vendor(v.trim().to_string()));
    }
    if let Some(ref v) = f.memo {
        fields.push(PackingMaterialField::Memo(blank_to_none(Some(v.clone()))));
    } else if args.clear_memo {
        fields.push(PackingMaterialField::Memo(None));
    }
    fields
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let mut store = open_store(&config)?;
    let current = resolve_packing(&store, &args.reference)?;

    let fields = edit_fields(&args);
    if fields.is_empty() && !global.quiet {
        eprintln!("{} Nothing to change", style("!").yellow());
    }

    let updated = store
        .update_packing_material(current.id, &fields)?
        .ok_or_else(|| InventoryError::NotFound {
            kind: RecordKind::PackingMaterial.label(),
            id: current.id.to_string(),
        })?;

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Id) => {
            print_record(&updated, f)
        }
        _ => {
            if !global.quiet {
                println!(
                    "{} Updated packing material {} ({} field(s))",
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
    let material = resolve_packing(&store, &args.reference)?;

    let what = format!(
        "packing material {} ({})",
        material.test_number, material.material_name
    );
    if !confirm_delete(&what, args.yes)? {
        return Ok(());
    }

    if store.delete_packing_material(material.id)? && !global.quiet {
        println!(
            "{} Deleted packing material {}",
            style("✓").green(),
            style(material.test_number).cyan()
        );
    }
    Ok(())
}

fn run_next_number(args: NextNumberArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let next =
        store.generate_test_number(RecordKind::PackingMaterial, args.date.unwrap_or_else(today))?;
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
    let exists = store.test_number_exists(RecordKind::PackingMaterial, &candidate, args.exclude)?;
    print_check(&candidate, exists, effective_format(global, &config));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> RecordFields {
        RecordFields {
            product: Some("Choco Bar".into()),
            material: Some("Outer film".into()),
            quantity: Some(5000),
            lot: Some("L-2291".into()),
            expire_date: NaiveDate::from_ymd_opt(2027, 1, 31),
            result: None,
            category: Some("film".into()),
            vendor: Some("PackCo".into()),
            memo: None,
        }
    }

    #[test]
    fn test_new_defaults_to_pass() {
        let draft = build_draft(&fields()).unwrap();
        assert!(draft.result);

        let draft = build_draft(&RecordFields {
            result: Some(CliVerdict::Fail),
            ..fields()
        })
        .unwrap();
        assert!(!draft.result);
    }

    #[test]
    fn test_new_requires_lot() {
        let err = build_draft(&RecordFields {
            lot: None,
            ..fields()
        })
        .unwrap_err();
        assert!(err.to_string().contains("--lot"));
    }

    #[test]
    fn test_edit_result_only() {
        let args = EditArgs {
            reference: "AP25060101".into(),
            test_number: None,
            fields: RecordFields {
                result: Some(CliVerdict::Fail),
                ..Default::default()
            },
            clear_memo: true,
        };
        assert_eq!(
            edit_fields(&args),
            vec![
                PackingMaterialField::Result(false),
                PackingMaterialField::Memo(None)
            ]
        );
    }

    #[test]
    fn test_list_default_columns() {
        use crate::cli::{Cli, Commands};
        use clap::Parser;

        let cli = Cli::try_parse_from(["lilerp", "pack", "list"]).unwrap();
        let Commands::Pack(PackCommands::List(args)) = cli.command else {
            panic!("expected pack list");
        };
        assert_eq!(args.columns.last(), Some(&ListColumn::Result));

        for column in ListColumn::value_variants() {
            assert_eq!(ListColumn::from_str(&column.to_string(), false), Ok(*column));
        }
    }

    #[test]
    fn test_edit_blank_memo_clears() {
        let args = EditArgs {
            reference: "AP25060101".into(),
            test_number: None,
            fields: RecordFields {
                memo: Some(" ".into()),
                ..Default::default()
            },
            clear_memo: false,
        };
        assert_eq!(edit_fields(&args), vec![PackingMaterialField::Memo(None)]);
    }
}
