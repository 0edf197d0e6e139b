//! Packing material queries

use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use super::{check_type_code, map_write_error, InventoryStore};
use crate::core::error::{InventoryError, Result};
use crate::core::testno::TestNumber;
use crate::entities::{PackingMaterial, PackingMaterialDraft, PackingMaterialField, RecordKind};

const PACKING_COLUMNS: &str = "id, test_number, product_name, material_name, receiving_quantity, \
     lot_number, expire_date, result, category, vendor, memo, created_at, updated_at";

fn packing_from_row(row: &Row<'_>) -> rusqlite::Result<PackingMaterial> {
    Ok(PackingMaterial {
        id: row.get("id")?,
        test_number: row.get("test_number")?,
        product_name: row.get("product_name")?,
        material_name: row.get("material_name")?,
        receiving_quantity: row.get("receiving_quantity")?,
        lot_number: row.get("lot_number")?,
        expire_date: row.get("expire_date")?,
        result: row.get("result")?,
        category: row.get("category")?,
        vendor: row.get("vendor")?,
        memo: row.get("memo")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl InventoryStore {
    /// All packing materials, newest first
    pub fn list_packing_materials(&self) -> Result<Vec<PackingMaterial>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM packing_materials ORDER BY created_at DESC, id DESC",
            PACKING_COLUMNS
        ))?;
        let rows = stmt.query_map([], packing_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn get_packing_material(&self, id: i64) -> Result<Option<PackingMaterial>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM packing_materials WHERE id = ?1", PACKING_COLUMNS),
                params![id],
                packing_from_row,
            )
            .optional()?)
    }

    pub fn get_packing_material_by_test_number(
        &self,
        test_number: &str,
    ) -> Result<Option<PackingMaterial>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM packing_materials WHERE test_number = ?1",
                    PACKING_COLUMNS
                ),
                params![test_number],
                packing_from_row,
            )
            .optional()?)
    }

    /// Insert a packing material under `test_number`
    pub fn create_packing_material(
        &mut self,
        test_number: &TestNumber,
        draft: &PackingMaterialDraft,
    ) -> Result<PackingMaterial> {
        check_type_code(RecordKind::PackingMaterial, test_number)?;
        draft.validate()?;

        self.conn
            .execute(
                r#"INSERT INTO packing_materials (
                    test_number, product_name, material_name, receiving_quantity,
                    lot_number, expire_date, result, category, vendor, memo
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
                params![
                    test_number,
                    draft.product_name,
                    draft.material_name,
                    draft.receiving_quantity,
                    draft.lot_number,
                    draft.expire_date,
                    draft.result,
                    draft.category,
                    draft.vendor,
                    draft.memo,
                ],
            )
            .map_err(|e| {
                map_write_error(e, || InventoryError::DuplicateTestNumber(test_number.to_string()))
            })?;

        let id = self.conn.last_insert_rowid();
        info!(id, %test_number, material = %draft.material_name, "created packing material");

        self.get_packing_material(id)?
            .ok_or_else(|| InventoryError::NotFound {
                kind: RecordKind::PackingMaterial.label(),
                id: id.to_string(),
            })
    }

    /// Apply a partial update; `None` if no such record
    pub fn update_packing_material(
        &mut self,
        id: i64,
        fields: &[PackingMaterialField],
    ) -> Result<Option<PackingMaterial>> {
        let new_number = fields.iter().find_map(|f| match f {
            PackingMaterialField::TestNumber(tn) => Some(*tn),
            _ => None,
        });
        if let Some(ref tn) = new_number {
            check_type_code(RecordKind::PackingMaterial, tn)?;
        }

        if fields.is_empty() {
            return self.get_packing_material(id);
        }

        let changed = self
            .update_fields("packing_materials", id, fields)
            .map_err(|e| match e {
                InventoryError::Database(err) => map_write_error(err, || {
                    InventoryError::DuplicateTestNumber(
                        new_number.map(|tn| tn.to_string()).unwrap_or_default(),
                    )
                }),
                other => other,
            })?;

        if changed == 0 {
            debug!(id, "packing material not found for update");
            return Ok(None);
        }
        self.get_packing_material(id)
    }

    /// Delete a packing material; true iff a row was removed
    pub fn delete_packing_material(&mut self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM packing_materials WHERE id = ?1", params![id])?;
        if removed > 0 {
            info!(id, "deleted packing material");
        }
        Ok(removed > 0)
    }
}
