//! Raw material queries

use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use super::{check_type_code, map_write_error, InventoryStore};
use crate::core::error::{InventoryError, Result};
use crate::core::testno::TestNumber;
use crate::entities::{RawMaterial, RawMaterialDraft, RawMaterialField, RecordKind};

const RAW_COLUMNS: &str = "id, test_number, name, receiving_quantity, net_weight, weight_unit, \
     quantity, manufacturing_date, expire_date, vendor, country, storage_conditions, food_type, \
     memo, created_at, updated_at";

fn raw_from_row(row: &Row<'_>) -> rusqlite::Result<RawMaterial> {
    Ok(RawMaterial {
        id: row.get("id")?,
        test_number: row.get("test_number")?,
        name: row.get("name")?,
        receiving_quantity: row.get("receiving_quantity")?,
        net_weight: row.get("net_weight")?,
        weight_unit: row.get("weight_unit")?,
        quantity: row.get("quantity")?,
        manufacturing_date: row.get("manufacturing_date")?,
        expire_date: row.get("expire_date")?,
        vendor: row.get("vendor")?,
        country: row.get("country")?,
        storage_conditions: row.get("storage_conditions")?,
        food_type: row.get("food_type")?,
        memo: row.get("memo")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl InventoryStore {
    /// All raw materials, newest first
    pub fn list_raw_materials(&self) -> Result<Vec<RawMaterial>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM raw_materials ORDER BY created_at DESC, id DESC",
            RAW_COLUMNS
        ))?;
        let rows = stmt.query_map([], raw_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn get_raw_material(&self, id: i64) -> Result<Option<RawMaterial>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM raw_materials WHERE id = ?1", RAW_COLUMNS),
                params![id],
                raw_from_row,
            )
            .optional()?)
    }

    pub fn get_raw_material_by_test_number(&self, test_number: &str) -> Result<Option<RawMaterial>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM raw_materials WHERE test_number = ?1", RAW_COLUMNS),
                params![test_number],
                raw_from_row,
            )
            .optional()?)
    }

    /// Most recently created raw material with exactly this name
    pub fn find_latest_raw_material_by_name(&self, name: &str) -> Result<Option<RawMaterial>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM raw_materials WHERE name = ?1 ORDER BY created_at DESC, id DESC LIMIT 1",
                    RAW_COLUMNS
                ),
                params![name],
                raw_from_row,
            )
            .optional()?)
    }

    /// Insert a raw material under `test_number`
    pub fn create_raw_material(
        &mut self,
        test_number: &TestNumber,
        draft: &RawMaterialDraft,
    ) -> Result<RawMaterial> {
        check_type_code(RecordKind::RawMaterial, test_number)?;
        draft.validate()?;

        self.conn
            .execute(
                r#"INSERT INTO raw_materials (
                    test_number, name, receiving_quantity, net_weight, weight_unit, quantity,
                    manufacturing_date, expire_date, vendor, country, storage_conditions, food_type, memo
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
                params![
                    test_number,
                    draft.name,
                    draft.receiving_quantity,
                    draft.net_weight,
                    draft.weight_unit,
                    draft.quantity,
                    draft.manufacturing_date,
                    draft.expire_date,
                    draft.vendor,
                    draft.country,
                    draft.storage_conditions,
                    draft.food_type,
                    draft.memo,
                ],
            )
            .map_err(|e| {
                map_write_error(e, || InventoryError::DuplicateTestNumber(test_number.to_string()))
            })?;

        let id = self.conn.last_insert_rowid();
        info!(id, %test_number, name = %draft.name, "created raw material");

        self.get_raw_material(id)?
            .ok_or_else(|| InventoryError::NotFound {
                kind: RecordKind::RawMaterial.label(),
                id: id.to_string(),
            })
    }

    /// Apply a partial update; `None` if no such record
    pub fn update_raw_material(
        &mut self,
        id: i64,
        fields: &[RawMaterialField],
    ) -> Result<Option<RawMaterial>> {
        let new_number = fields.iter().find_map(|f| match f {
            RawMaterialField::TestNumber(tn) => Some(*tn),
            _ => None,
        });
        if let Some(ref tn) = new_number {
            check_type_code(RecordKind::RawMaterial, tn)?;
        }

        if fields.is_empty() {
            return self.get_raw_material(id);
        }

        let changed = self
            .update_fields("raw_materials", id, fields)
            .map_err(|e| match e {
                InventoryError::Database(err) => map_write_error(err, || {
                    InventoryError::DuplicateTestNumber(
                        new_number.map(|tn| tn.to_string()).unwrap_or_default(),
                    )
                }),
                other => other,
            })?;

        if changed == 0 {
            debug!(id, "raw material not found for update");
            return Ok(None);
        }
        self.get_raw_material(id)
    }

    /// Delete a raw material; true iff a row was removed
    pub fn delete_raw_material(&mut self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM raw_materials WHERE id = ?1", params![id])?;
        if removed > 0 {
            info!(id, "deleted raw material");
        }
        Ok(removed > 0)
    }
}
