//! Database schema initialization

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::InventoryStore;
use crate::core::error::{InventoryError, Result};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

impl InventoryStore {
    /// Create tables and triggers if missing, then check the stored version
    pub(super) fn init_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Raw material receiving records
            CREATE TABLE IF NOT EXISTS raw_materials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                test_number TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                receiving_quantity REAL NOT NULL DEFAULT 0,
                net_weight REAL NOT NULL DEFAULT 0,
                weight_unit TEXT NOT NULL CHECK(weight_unit IN ('kg', 'g', 'mg')),
                quantity INTEGER NOT NULL DEFAULT 0,
                manufacturing_date TEXT NOT NULL,
                expire_date TEXT NOT NULL,
                vendor TEXT NOT NULL,
                country TEXT NOT NULL,
                storage_conditions TEXT NOT NULL CHECK(storage_conditions IN ('Room Temperature', 'Freezing Temperature', 'Refrigerating Temperature')),
                food_type TEXT,
                memo TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_raw_materials_name ON raw_materials(name);
            CREATE INDEX IF NOT EXISTS idx_raw_materials_created ON raw_materials(created_at);

            -- Packing material receiving records
            CREATE TABLE IF NOT EXISTS packing_materials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                test_number TEXT NOT NULL UNIQUE,
                product_name TEXT NOT NULL,
                material_name TEXT NOT NULL,
                receiving_quantity INTEGER NOT NULL DEFAULT 0,
                lot_number TEXT NOT NULL,
                expire_date TEXT NOT NULL,
                result INTEGER NOT NULL DEFAULT 1 CHECK(result IN (0, 1)),
                category TEXT NOT NULL,
                vendor TEXT NOT NULL,
                memo TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_packing_materials_created ON packing_materials(created_at);

            -- Raw material catalog
            CREATE TABLE IF NOT EXISTS raw_material_masters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                shelf_life_days INTEGER NOT NULL CHECK(shelf_life_days >= 0),
                net_weight REAL NOT NULL DEFAULT 0,
                weight_unit TEXT NOT NULL CHECK(weight_unit IN ('kg', 'g', 'mg')),
                vendor TEXT NOT NULL,
                country TEXT NOT NULL,
                storage_conditions TEXT NOT NULL CHECK(storage_conditions IN ('Room Temperature', 'Freezing Temperature', 'Refrigerating Temperature')),
                food_type TEXT,
                memo TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            -- updated_at advances on every executed UPDATE
            CREATE TRIGGER IF NOT EXISTS update_raw_materials_timestamp
            AFTER UPDATE ON raw_materials
            BEGIN
                UPDATE raw_materials SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
            END;

            CREATE TRIGGER IF NOT EXISTS update_packing_materials_timestamp
            AFTER UPDATE ON packing_materials
            BEGIN
                UPDATE packing_materials SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
            END;

            CREATE TRIGGER IF NOT EXISTS update_raw_material_masters_timestamp
            AFTER UPDATE ON raw_material_masters
            BEGIN
                UPDATE raw_material_masters SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
            END;
            "#,
        )?;

        match self.stored_schema_version()? {
            Some(found) if found != SCHEMA_VERSION => Err(InventoryError::UnsupportedSchema {
                found,
                expected: SCHEMA_VERSION,
            }),
            Some(_) => Ok(()),
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
                info!(version = SCHEMA_VERSION, "initialized inventory schema");
                Ok(())
            }
        }
    }

    fn stored_schema_version(&self) -> Result<Option<i32>> {
        Ok(self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get::<_, Option<i32>>(0)
            })
            .optional()?
            .flatten())
    }

    /// Version recorded in the database file
    pub fn schema_version(&self) -> Result<i32> {
        Ok(self.stored_schema_version()?.unwrap_or(SCHEMA_VERSION))
    }
}
