//! Raw material receiving record (test number prefix `AR`)

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::testno::TestNumber;
use crate::entities::common::{
    blank_to_none, double_option, require_non_negative, require_non_negative_int, require_text,
    FieldUpdate, StorageCondition, WeightUnit,
};

/// A persisted raw material receiving entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterial {
    pub id: i64,
    pub test_number: TestNumber,
    pub name: String,

    /// Total received amount (advisory: usually net weight x quantity)
    pub receiving_quantity: f64,

    /// Weight of one unit
    pub net_weight: f64,
    pub weight_unit: WeightUnit,

    /// Number of units received
    pub quantity: i64,

    pub manufacturing_date: NaiveDate,
    pub expire_date: NaiveDate,
    pub vendor: String,

    /// Country of origin
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

/// Raw material fields before a test number is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterialDraft {
    pub name: String,
    pub receiving_quantity: f64,
    pub net_weight: f64,
    pub weight_unit: WeightUnit,
    pub quantity: i64,
    pub manufacturing_date: NaiveDate,
    pub expire_date: NaiveDate,
    pub vendor: String,
    pub country: String,
    pub storage_conditions: StorageCondition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl RawMaterialDraft {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("vendor", &self.vendor)?;
        require_text("country", &self.country)?;
        require_non_negative("receiving quantity", self.receiving_quantity)?;
        require_non_negative("net weight", self.net_weight)?;
        require_non_negative_int("quantity", self.quantity)?;
        Ok(())
    }

    /// Trim required text and turn blank optional text into NULL
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.vendor = self.vendor.trim().to_string();
        self.country = self.country.trim().to_string();
        self.food_type = blank_to_none(self.food_type);
        self.memo = blank_to_none(self.memo);
        self
    }
}

/// A draft plus the test number it will be stored under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRawMaterial {
    pub test_number: TestNumber,
    #[serde(flatten)]
    pub draft: RawMaterialDraft,
}

/// Updatable raw material columns
#[derive(Debug, Clone, PartialEq)]
pub enum RawMaterialField {
    TestNumber(TestNumber),
    Name(String),
    ReceivingQuantity(f64),
    NetWeight(f64),
    WeightUnit(WeightUnit),
    Quantity(i64),
    ManufacturingDate(NaiveDate),
    ExpireDate(NaiveDate),
    Vendor(String),
    Country(String),
    StorageConditions(StorageCondition),
    FoodType(Option<String>),
    Memo(Option<String>),
}

impl FieldUpdate for RawMaterialField {
    fn column(&self) -> &'static str {
        match self {
            RawMaterialField::TestNumber(_) => "test_number",
            RawMaterialField::Name(_) => "name",
            RawMaterialField::ReceivingQuantity(_) => "receiving_quantity",
            RawMaterialField::NetWeight(_) => "net_weight",
            RawMaterialField::WeightUnit(_) => "weight_unit",
            RawMaterialField::Quantity(_) => "quantity",
            RawMaterialField::ManufacturingDate(_) => "manufacturing_date",
            RawMaterialField::ExpireDate(_) => "expire_date",
            RawMaterialField::Vendor(_) => "vendor",
            RawMaterialField::Country(_) => "country",
            RawMaterialField::StorageConditions(_) => "storage_conditions",
            RawMaterialField::FoodType(_) => "food_type",
            RawMaterialField::Memo(_) => "memo",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            RawMaterialField::Name(v) => require_text("name", v),
            RawMaterialField::Vendor(v) => require_text("vendor", v),
            RawMaterialField::Country(v) => require_text("country", v),
            RawMaterialField::ReceivingQuantity(v) => require_non_negative("receiving quantity", *v),
            RawMaterialField::NetWeight(v) => require_non_negative("net weight", *v),
            RawMaterialField::Quantity(v) => require_non_negative_int("quantity", *v),
            _ => Ok(()),
        }
    }
}

impl ToSql for RawMaterialField {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            RawMaterialField::TestNumber(v) => v.to_sql(),
            RawMaterialField::Name(v) | RawMaterialField::Vendor(v) | RawMaterialField::Country(v) => {
                v.to_sql()
            }
            RawMaterialField::ReceivingQuantity(v) | RawMaterialField::NetWeight(v) => v.to_sql(),
            RawMaterialField::WeightUnit(v) => v.to_sql(),
            RawMaterialField::Quantity(v) => v.to_sql(),
            RawMaterialField::ManufacturingDate(v) | RawMaterialField::ExpireDate(v) => v.to_sql(),
            RawMaterialField::StorageConditions(v) => v.to_sql(),
            RawMaterialField::FoodType(v) | RawMaterialField::Memo(v) => v.to_sql(),
        }
    }
}

/// Partial raw material update as it arrives over the bridge or from `raw edit`
///
/// Absent fields are left untouched. `foodType`/`memo` may be set to `null`
/// to clear them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawMaterialPatch {
    pub test_number: Option<TestNumber>,
    pub name: Option<String>,
    pub receiving_quantity: Option<f64>,
    pub net_weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub quantity: Option<i64>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expire_date: Option<NaiveDate>,
    pub vendor: Option<String>,
    pub country: Option<String>,
    pub storage_conditions: Option<StorageCondition>,
    #[serde(default, deserialize_with = "double_option")]
    pub food_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub memo: Option<Option<String>>,
}

impl RawMaterialPatch {
    pub fn into_fields(self) -> Vec<RawMaterialField> {
        let mut fields = Vec::new();
        if let Some(v) = self.test_number {
            fields.push(RawMaterialField::TestNumber(v));
        }
        if let Some(v) = self.name {
            fields.push(RawMaterialField::Name(v.trim().to_string()));
        }
        if let Some(v) = self.receiving_quantity {
            fields.push(RawMaterialField::ReceivingQuantity(v));
        }
        if let Some(v) = self.net_weight {
            fields.push(RawMaterialField::NetWeight(v));
        }
        if let Some(v) = self.weight_unit {
            fields.push(RawMaterialField::WeightUnit(v));
        }
        if let Some(v) = self.quantity {
            fields.push(RawMaterialField::Quantity(v));
        }
        if let Some(v) = self.manufacturing_date {
            fields.push(RawMaterialField::ManufacturingDate(v));
        }
        if let Some(v) = self.expire_date {
            fields.push(RawMaterialField::ExpireDate(v));
        }
        if let Some(v) = self.vendor {
            fields.push(RawMaterialField::Vendor(v.trim().to_string()));
        }
        if let Some(v) = self.country {
            fields.push(RawMaterialField::Country(v.trim().to_string()));
        }
        if let Some(v) = self.storage_conditions {
            fields.push(RawMaterialField::StorageConditions(v));
        }
        if let Some(v) = self.food_type {
            fields.push(RawMaterialField::FoodType(blank_to_none(v)));
        }
        if let Some(v) = self.memo {
            fields.push(RawMaterialField::Memo(blank_to_none(v)));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> RawMaterialDraft {
        RawMaterialDraft {
            name: "  Sugar ".into(),
            receiving_quantity: 250.0,
            net_weight: 25.0,
            weight_unit: WeightUnit::Kg,
            quantity: 10,
            manufacturing_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            expire_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            vendor: "Daehan".into(),
            country: "KR".into(),
            storage_conditions: StorageCondition::Room,
            food_type: Some(" ".into()),
            memo: None,
        }
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut bad = draft();
        bad.vendor = String::new();
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.quantity = -3;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_draft_normalized() {
        let d = draft().normalized();
        assert_eq!(d.name, "Sugar");
        assert_eq!(d.food_type, None);
    }

    #[test]
    fn test_patch_maps_to_columns() {
        let patch: RawMaterialPatch = serde_json::from_str(
            r#"{"receivingQuantity": 12.5, "storageConditions": "Freezing Temperature", "memo": null}"#,
        )
        .unwrap();
        let fields = patch.into_fields();
        let columns: Vec<&str> = fields.iter().map(|f| f.column()).collect();
        assert_eq!(columns, vec!["receiving_quantity", "storage_conditions", "memo"]);
        assert_eq!(fields[2], RawMaterialField::Memo(None));
    }

    #[test]
    fn test_patch_absent_optional_is_untouched() {
        let patch: RawMaterialPatch = serde_json::from_str(r#"{"name": "Salt"}"#).unwrap();
        assert_eq!(patch.food_type, None);
        assert_eq!(patch.into_fields(), vec![RawMaterialField::Name("Salt".into())]);
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result = serde_json::from_str::<RawMaterialPatch>(r#"{"id": 4}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_raw_material_flattens_draft() {
        let json = serde_json::json!({
            "testNumber": "AR25060101",
            "name": "Sugar",
            "receivingQuantity": 250.0,
            "netWeight": 25.0,
            "weightUnit": "kg",
            "quantity": 10,
            "manufacturingDate": "2025-06-01",
            "expireDate": "2026-06-01",
            "vendor": "Daehan",
            "country": "KR",
            "storageConditions": "Room Temperature"
        });
        let new: NewRawMaterial = serde_json::from_value(json).unwrap();
        assert_eq!(new.test_number.to_string(), "AR25060101");
        assert_eq!(new.draft.quantity, 10);
        assert_eq!(new.draft.memo, None);
    }
}
