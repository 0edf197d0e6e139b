//! Raw material master: reusable catalog template used to prefill receiving records

use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::entities::common::{
    blank_to_none, double_option, require_non_negative, require_text, FieldUpdate,
    StorageCondition, WeightUnit,
};

/// A persisted catalog entry, unique by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterialMaster {
    pub id: i64,
    pub name: String,

    /// Days from manufacturing date to expire date
    pub shelf_life_days: u32,
    pub net_weight: f64,
    pub weight_unit: WeightUnit,
    pub vendor: String,
    pub country: String,
    pub storage_conditions: StorageCondition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,

    #[serde(rename = "created_at")]
    pub created_at: NaiveDateTime,

    #[serde(rename = "updated_at")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterDraft {
    pub name: String,
    pub shelf_life_days: u32,
    pub net_weight: f64,
    pub weight_unit: WeightUnit,
    pub vendor: String,
    pub country: String,
    pub storage_conditions: StorageCondition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl MasterDraft {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("vendor", &self.vendor)?;
        require_text("country", &self.country)?;
        require_non_negative("net weight", self.net_weight)?;
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.vendor = self.vendor.trim().to_string();
        self.country = self.country.trim().to_string();
        self.food_type = blank_to_none(self.food_type);
        self.memo = blank_to_none(self.memo);
        self
    }
}

/// Updatable master columns
#[derive(Debug, Clone, PartialEq)]
pub enum MasterField {
    Name(String),
    ShelfLifeDays(u32),
    NetWeight(f64),
    WeightUnit(WeightUnit),
    Vendor(String),
    Country(String),
    StorageConditions(StorageCondition),
    FoodType(Option<String>),
    Memo(Option<String>),
}

impl FieldUpdate for MasterField {
    fn column(&self) -> &'static str {
        match self {
            MasterField::Name(_) => "name",
            MasterField::ShelfLifeDays(_) => "shelf_life_days",
            MasterField::NetWeight(_) => "net_weight",
            MasterField::WeightUnit(_) => "weight_unit",
            MasterField::Vendor(_) => "vendor",
            MasterField::Country(_) => "country",
            MasterField::StorageConditions(_) => "storage_conditions",
            MasterField::FoodType(_) => "food_type",
            MasterField::Memo(_) => "memo",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            MasterField::Name(v) => require_text("name", v),
            MasterField::Vendor(v) => require_text("vendor", v),
            MasterField::Country(v) => require_text("country", v),
            MasterField::NetWeight(v) => require_non_negative("net weight", *v),
            _ => Ok(()),
        }
    }
}

impl ToSql for MasterField {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            MasterField::Name(v) | MasterField::Vendor(v) | MasterField::Country(v) => v.to_sql(),
            MasterField::ShelfLifeDays(v) => v.to_sql(),
            MasterField::NetWeight(v) => v.to_sql(),
            MasterField::WeightUnit(v) => v.to_sql(),
            MasterField::StorageConditions(v) => v.to_sql(),
            MasterField::FoodType(v) | MasterField::Memo(v) => v.to_sql(),
        }
    }
}

/// Partial master update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MasterPatch {
    pub name: Option<String>,
    pub shelf_life_days: Option<u32>,
    pub net_weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub vendor: Option<String>,
    pub country: Option<String>,
    pub storage_conditions: Option<StorageCondition>,
    #[serde(default, deserialize_with = "double_option")]
    pub food_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub memo: Option<Option<String>>,
}

impl MasterPatch {
    pub fn into_fields(self) -> Vec<MasterField> {
        let mut fields = Vec::new();
        if let Some(v) = self.name {
            fields.push(MasterField::Name(v.trim().to_string()));
        }
        if let Some(v) = self.shelf_life_days {
            fields.push(MasterField::ShelfLifeDays(v));
        }
        if let Some(v) = self.net_weight {
            fields.push(MasterField::NetWeight(v));
        }
        if let Some(v) = self.weight_unit {
            fields.push(MasterField::WeightUnit(v));
        }
        if let Some(v) = self.vendor {
            fields.push(MasterField::Vendor(v.trim().to_string()));
        }
        if let Some(v) = self.country {
            fields.push(MasterField::Country(v.trim().to_string()));
        }
        if let Some(v) = self.storage_conditions {
            fields.push(MasterField::StorageConditions(v));
        }
        if let Some(v) = self.food_type {
            fields.push(MasterField::FoodType(blank_to_none(v)));
        }
        if let Some(v) = self.memo {
            fields.push(MasterField::Memo(blank_to_none(v)));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shelf_life_must_be_non_negative_integer() {
        let parsed = serde_json::from_value::<MasterDraft>(serde_json::json!({
            "name": "Cocoa powder",
            "shelfLifeDays": -1,
            "netWeight": 20.0,
            "weightUnit": "kg",
            "vendor": "Barry",
            "country": "BE",
            "storageConditions": "Room Temperature"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_patch_clears_food_type() {
        let patch: MasterPatch =
            serde_json::from_str(r#"{"shelfLifeDays": 730, "foodType": null}"#).unwrap();
        assert_eq!(
            patch.into_fields(),
            vec![MasterField::ShelfLifeDays(730), MasterField::FoodType(None)]
        );
    }
}
