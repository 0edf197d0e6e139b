//! Raw material master queries

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use super::{map_write_error, InventoryStore, MASTER_TABLE};
use crate::core::error::{InventoryError, Result};
use crate::core::expand;
use crate::entities::{MasterDraft, MasterField, RawMaterialDraft, RawMaterialMaster};

/// Maximum number of matches returned by a name search
pub const SEARCH_LIMIT: usize = 10;

const MASTER_LABEL: &str = "raw material master";

const MASTER_COLUMNS: &str = "id, name, shelf_life_days, net_weight, weight_unit, vendor, \
     country, storage_conditions, food_type, memo, created_at, updated_at";

fn master_from_row(row: &Row<'_>) -> rusqlite::Result<RawMaterialMaster> {
    Ok(RawMaterialMaster {
        id: row.get("id")?,
        name: row.get("name")?,
        shelf_life_days: row.get("shelf_life_days")?,
        net_weight: row.get("net_weight")?,
        weight_unit: row.get("weight_unit")?,
        vendor: row.get("vendor")?,
        country: row.get("country")?,
        storage_conditions: row.get("storage_conditions")?,
        food_type: row.get("food_type")?,
        memo: row.get("memo")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Escape LIKE wildcards so the query matches literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl InventoryStore {
    /// All masters, by name
    pub fn list_masters(&self) -> Result<Vec<RawMaterialMaster>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY name ASC",
            MASTER_COLUMNS, MASTER_TABLE
        ))?;
        let rows = stmt.query_map([], master_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn get_master(&self, id: i64) -> Result<Option<RawMaterialMaster>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE id = ?1", MASTER_COLUMNS, MASTER_TABLE),
                params![id],
                master_from_row,
            )
            .optional()?)
    }

    pub fn get_master_by_name(&self, name: &str) -> Result<Option<RawMaterialMaster>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE name = ?1", MASTER_COLUMNS, MASTER_TABLE),
                params![name],
                master_from_row,
            )
            .optional()?)
    }

    /// Masters whose name contains `query`, at most [`SEARCH_LIMIT`], by name
    pub fn search_masters(&self, query: &str) -> Result<Vec<RawMaterialMaster>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name ASC LIMIT ?2",
            MASTER_COLUMNS, MASTER_TABLE
        ))?;
        let rows = stmt.query_map(
            params![like_pattern(query), SEARCH_LIMIT as i64],
            master_from_row,
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn create_master(&mut self, draft: &MasterDraft) -> Result<RawMaterialMaster> {
        draft.validate()?;

        self.conn
            .execute(
                &format!(
                    r#"INSERT INTO {} (
                        name, shelf_life_days, net_weight, weight_unit, vendor, country,
                        storage_conditions, food_type, memo
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                    MASTER_TABLE
                ),
                params![
                    draft.name,
                    draft.shelf_life_days,
                    draft.net_weight,
                    draft.weight_unit,
                    draft.vendor,
                    draft.country,
                    draft.storage_conditions,
                    draft.food_type,
                    draft.memo,
                ],
            )
            .map_err(|e| map_write_error(e, || InventoryError::DuplicateMasterName(draft.name.clone())))?;

        let id = self.conn.last_insert_rowid();
        info!(id, name = %draft.name, "created raw material master");

        self.get_master(id)?.ok_or_else(|| InventoryError::NotFound {
            kind: MASTER_LABEL,
            id: id.to_string(),
        })
    }

    /// Apply a partial update; `None` if no such master
    pub fn update_master(
        &mut self,
        id: i64,
        fields: &[MasterField],
    ) -> Result<Option<RawMaterialMaster>> {
        if fields.is_empty() {
            return self.get_master(id);
        }

        let new_name = fields.iter().find_map(|f| match f {
            MasterField::Name(name) => Some(name.clone()),
            _ => None,
        });

        let changed = self
            .update_fields(MASTER_TABLE, id, fields)
            .map_err(|e| match e {
                InventoryError::Database(err) => map_write_error(err, || {
                    InventoryError::DuplicateMasterName(new_name.clone().unwrap_or_default())
                }),
                other => other,
            })?;

        if changed == 0 {
            debug!(id, "master not found for update");
            return Ok(None);
        }
        self.get_master(id)
    }

    /// Delete a master; records already expanded from it are untouched
    pub fn delete_master(&mut self, id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", MASTER_TABLE),
            params![id],
        )?;
        if removed > 0 {
            info!(id, "deleted raw material master");
        }
        Ok(removed > 0)
    }

    /// Look up a master and expand it into a raw material draft
    pub fn expand_master(
        &self,
        master_id: i64,
        manufacturing_date: NaiveDate,
        receiving_quantity: f64,
        quantity: i64,
    ) -> Result<RawMaterialDraft> {
        let master = self
            .get_master(master_id)?
            .ok_or_else(|| InventoryError::NotFound {
                kind: MASTER_LABEL,
                id: master_id.to_string(),
            })?;
        expand::expand(&master, manufacturing_date, receiving_quantity, quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("sug"), "%sug%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
