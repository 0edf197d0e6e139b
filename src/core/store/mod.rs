//! SQLite-backed inventory store
//!
//! One database file holds the three collections:
//! - `raw_materials` (test numbers `AR...`)
//! - `packing_materials` (test numbers `AP...`)
//! - `raw_material_masters` (catalog, unique by name)
//!
//! Every operation is a single statement. Test number generation reads the
//! current maximum and the later insert is guarded only by the `UNIQUE`
//! constraint, so callers must treat `DuplicateTestNumber` as retryable.

mod master;
mod packing;
mod raw;
mod schema;

pub use schema::SCHEMA_VERSION;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::core::error::{InventoryError, Result};
use crate::core::testno::{self, TestNumber};
use crate::entities::{FieldUpdate, RecordKind};

/// Default database file name
pub const DB_FILE: &str = "inventory.db";

/// The inventory store backed by SQLite
pub struct InventoryStore {
    conn: Connection,
    path: Option<PathBuf>,
}

/// Row counts and file details for `db status`
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub path: Option<PathBuf>,
    pub schema_version: i32,
    pub raw_materials: usize,
    pub packing_materials: usize,
    pub masters: usize,
    pub db_size_bytes: u64,
}

impl InventoryStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let mut store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;

        debug!(path = %path.display(), "opened inventory store");
        Ok(store)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    /// Database file, if not in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All test numbers of `kind` that start with `prefix`, greatest first
    pub fn test_numbers_with_prefix(&self, kind: RecordKind, prefix: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT test_number FROM {} WHERE substr(test_number, 1, ?2) = ?1 ORDER BY test_number DESC",
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![prefix, prefix.len() as i64], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<String>, _>>()?)
    }

    /// Highest well-formed test number sharing `prefix`
    pub fn find_max_by_prefix(&self, kind: RecordKind, prefix: &str) -> Result<Option<TestNumber>> {
        Ok(self
            .test_numbers_with_prefix(kind, prefix)?
            .iter()
            .filter_map(|tn| TestNumber::parse(tn).ok())
            .max_by_key(|tn| tn.sequence()))
    }

    /// Next free test number of `kind` for `date`
    ///
    /// Nothing is reserved; a concurrent insert can still take the number.
    pub fn generate_test_number(&self, kind: RecordKind, date: NaiveDate) -> Result<TestNumber> {
        let prefix = testno::prefix_for(kind.type_code(), date);
        let existing = self.test_numbers_with_prefix(kind, &prefix)?;
        let next = testno::next_test_number(kind.type_code(), date, &existing)?;
        debug!(%kind, %next, issued = existing.len(), "generated test number");
        Ok(next)
    }

    /// Whether `test_number` is taken, optionally ignoring the record `excluding_id`
    pub fn test_number_exists(
        &self,
        kind: RecordKind,
        test_number: &str,
        excluding_id: Option<i64>,
    ) -> Result<bool> {
        let exists: bool = match excluding_id {
            Some(id) => self.conn.query_row(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE test_number = ?1 AND id != ?2)",
                    kind.table()
                ),
                params![test_number, id],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE test_number = ?1)",
                    kind.table()
                ),
                params![test_number],
                |row| row.get(0),
            )?,
        };
        Ok(exists)
    }

    /// Get store statistics
    pub fn statistics(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        let db_size_bytes = self
            .path
            .as_ref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            path: self.path.clone(),
            schema_version: self.schema_version()?,
            raw_materials: count(RecordKind::RawMaterial.table())?,
            packing_materials: count(RecordKind::PackingMaterial.table())?,
            masters: count(MASTER_TABLE)?,
            db_size_bytes,
        })
    }

    /// Apply a partial update; returns the number of rows changed
    ///
    /// An empty field list executes nothing, so `updated_at` only advances
    /// when at least one column is written.
    fn update_fields<F: FieldUpdate>(&mut self, table: &str, id: i64, fields: &[F]) -> Result<usize> {
        if fields.is_empty() {
            return Ok(0);
        }
        for field in fields {
            field.validate()?;
        }

        let assignments: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = ?{}", f.column(), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            assignments.join(", "),
            fields.len() + 1
        );

        let mut values: Vec<&dyn ToSql> = fields.iter().map(|f| f as &dyn ToSql).collect();
        values.push(&id);

        let changed = self.conn.execute(&sql, values.as_slice())?;
        debug!(table, id, columns = fields.len(), changed, "updated record");
        Ok(changed)
    }
}

pub(crate) const MASTER_TABLE: &str = "raw_material_masters";

/// Translate constraint failures into the inventory error taxonomy
pub(crate) fn map_write_error(
    err: rusqlite::Error,
    on_unique: impl FnOnce() -> InventoryError,
) -> InventoryError {
    if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => return on_unique(),
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK | rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL => {
                return InventoryError::Validation(
                    message
                        .clone()
                        .unwrap_or_else(|| "constraint failed".to_string()),
                );
            }
            _ => {}
        }
    }
    InventoryError::Database(err)
}

/// Reject a test number whose type code belongs to the other collection
pub(crate) fn check_type_code(kind: RecordKind, test_number: &TestNumber) -> Result<()> {
    if test_number.type_code() != kind.type_code() {
        return Err(InventoryError::validation(format!(
            "{} test numbers start with {}, got {}",
            kind.label(),
            kind.type_code(),
            test_number
        )));
    }
    Ok(())
}
