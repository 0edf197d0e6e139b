//! Table formatting for CLI list commands
//!
//! Raw material, packing material and master listings share one formatter
//! for the tabular formats (tsv, csv, md, id). JSON and YAML are serialized
//! straight from the records by the commands.

use chrono::NaiveDate;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Row id or test number (cyan)
    Id(String),
    /// Plain text, truncated to the column width
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Calendar date, red once it is before `today`
    Expiry(NaiveDate, NaiveDate),
    Number(i64),
    /// Float value with precision
    Float(f64, usize),
    /// Inspection result (pass green, fail red)
    Verdict(bool),
    /// Optional text (displays "-" if None)
    Optional(Option<String>),
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width.saturating_sub(2)), width = width)
            }
            CellValue::Date(d) => format!("{:<width$}", d.format("%Y-%m-%d"), width = width),
            CellValue::Expiry(d, today) => {
                let s = d.format("%Y-%m-%d").to_string();
                let styled = if d < today {
                    style(s).red()
                } else {
                    style(s).white()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Float(f, precision) => {
                format!("{:>width$.prec$}", f, width = width, prec = precision)
            }
            CellValue::Verdict(pass) => {
                let styled = if *pass {
                    style("pass").green()
                } else {
                    style("fail").red().bold()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Optional(opt) => match opt {
                Some(s) => CellValue::Text(s.clone()).format_tsv(width),
                None => format!("{:<width$}", style("-").dim(), width = width),
            },
        }
    }

    /// Get raw string value (no formatting, for csv and id output)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Date(d) | CellValue::Expiry(d, _) => d.format("%Y-%m-%d").to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::Verdict(pass) => (if *pass { "pass" } else { "fail" }).to_string(),
            CellValue::Optional(opt) => opt.clone().unwrap_or_default(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Optional(None) => "-".to_string(),
            CellValue::Verdict(false) => "**fail**".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Get the display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Date(_) | CellValue::Expiry(..) => 10,
            CellValue::Verdict(_) => 4,
            CellValue::Optional(None) => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    /// Value printed by `--format id`
    pub key: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    /// Drop the trailing "N x(s) found." line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Output rows in the specified format
    pub fn output(&self, rows: &[TableRow], format: OutputFormat, visible: &[&str]) -> Result<()> {
        let columns: Vec<&ColumnDef> = self
            .columns
            .iter()
            .filter(|c| visible.contains(&c.key))
            .collect();

        match format {
            OutputFormat::Csv => self.output_csv(rows, &columns),
            OutputFormat::Md => {
                self.output_md(rows, &columns);
                Ok(())
            }
            OutputFormat::Id => {
                for row in rows {
                    println!("{}", row.key);
                }
                Ok(())
            }
            _ => {
                self.output_tsv(rows, &columns);
                Ok(())
            }
        }
    }

    /// Size columns to their content, capped at the column's width
    fn calculate_widths(&self, rows: &[TableRow], columns: &[&ColumnDef]) -> Vec<usize> {
        columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);
                col.header
                    .len()
                    .max(max_content.saturating_add(2))
                    .min(col.width)
            })
            .collect()
    }

    fn output_tsv(&self, rows: &[TableRow], columns: &[&ColumnDef]) {
        let widths = self.calculate_widths(rows, columns);

        let header: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        println!("{}", header.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let parts: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => format!("{:<width$}", "-", width = *w),
                })
                .collect();
            println!("{}", parts.join(" "));
        }

        if self.show_summary {
            println!();
            println!("{} {}(s) found.", style(rows.len()).cyan(), self.entity_name);
        }
    }

    fn output_csv(&self, rows: &[TableRow], columns: &[&ColumnDef]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        writer
            .write_record(columns.iter().map(|c| c.key))
            .into_diagnostic()?;
        for row in rows {
            writer
                .write_record(
                    columns
                        .iter()
                        .map(|c| row.get(c.key).map(CellValue::raw).unwrap_or_default()),
                )
                .into_diagnostic()?;
        }
        writer.flush().into_diagnostic()?;
        Ok(())
    }

    fn output_md(&self, rows: &[TableRow], columns: &[&ColumnDef]) {
        let headers: Vec<&str> = columns.iter().map(|c| c.header).collect();
        println!("| {} |", headers.join(" | "));
        println!("|{}|", vec!["---"; columns.len()].join("|"));
        for row in rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| {
                    row.get(c.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            println!("| {} |", cells.join(" | "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cell_raw_values() {
        assert_eq!(CellValue::Float(12.5, 2).raw(), "12.50");
        assert_eq!(CellValue::Verdict(true).raw(), "pass");
        assert_eq!(CellValue::Verdict(false).raw(), "fail");
        assert_eq!(CellValue::Optional(None).raw(), "");
        assert_eq!(CellValue::Expiry(day(2026, 5, 20), day(2025, 1, 1)).raw(), "2026-05-20");
    }

    #[test]
    fn test_md_escapes_pipes() {
        assert_eq!(CellValue::Text("a|b".into()).format_md(), "a\\|b");
        assert_eq!(CellValue::Optional(None).format_md(), "-");
        assert_eq!(CellValue::Verdict(false).format_md(), "**fail**");
    }

    #[test]
    fn test_widths_capped_by_column() {
        let columns = [ColumnDef::new("name", "NAME", 8), ColumnDef::new("qty", "QTY", 10)];
        let refs: Vec<&ColumnDef> = columns.iter().collect();
        let rows = vec![TableRow::new("1")
            .cell("name", CellValue::Text("Very long material name".into()))
            .cell("qty", CellValue::Number(4))];

        let formatter = TableFormatter::new(&columns, "thing");
        assert_eq!(formatter.calculate_widths(&rows, &refs), vec![8, 3]);
    }

    #[test]
    fn test_row_lookup() {
        let row = TableRow::new("AR25060101").cell("name", CellValue::Text("Sugar".into()));
        assert!(row.get("name").is_some());
        assert!(row.get("vendor").is_none());
        assert_eq!(row.key, "AR25060101");
    }
}
