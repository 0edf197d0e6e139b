//! Packing material receiving record (test number prefix `AP`)

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::testno::TestNumber;
use crate::entities::common::{
    blank_to_none, double_option, require_non_negative_int, require_text, FieldUpdate,
};

/// A persisted packing material receiving entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingMaterial {
    pub id: i64,
    pub test_number: TestNumber,

    /// Product the packaging is for
    pub product_name: String,
    pub material_name: String,
    pub receiving_quantity: i64,

    /// Supplier's manufacturing lot
    pub lot_number: String,
    pub expire_date: NaiveDate,

    /// Incoming inspection verdict: pass (true) or fail (false)
    pub result: bool,
    pub category: String,
    pub vendor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,

    #[serde(rename = "created_at")]
    pub created_at: NaiveDateTime,

    #[serde(rename = "updated_at")]
    pub updated_at: NaiveDateTime,
}

fn default_result() -> bool {
    true
}

/// Packing material fields before a test number is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingMaterialDraft {
    pub product_name: String,
    pub material_name: String,
    pub receiving_quantity: i64,
    pub lot_number: String,
    pub expire_date: NaiveDate,
    #[serde(default = "default_result")]
    pub result: bool,
    pub category: String,
    pub vendor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl PackingMaterialDraft {
    pub fn validate(&self) -> Result<()> {
        require_text("product name", &self.product_name)?;
        require_text("material name", &self.material_name)?;
        require_text("lot number", &self.lot_number)?;
        require_text("category", &self.category)?;
        require_text("vendor", &self.vendor)?;
        require_non_negative_int("receiving quantity", self.receiving_quantity)?;
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.product_name = self.product_name.trim().to_string();
        self.material_name = self.material_name.trim().to_string();
        self.lot_number = self.lot_number.trim().to_string();
        self.category = self.category.trim().to_string();
        self.vendor = self.vendor.trim().to_string();
        self.memo = blank_to_none(self.memo);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPackingMaterial {
    pub test_number: TestNumber,
    #[serde(flatten)]
    pub draft: PackingMaterialDraft,
}

/// Updatable packing material columns
#[derive(Debug, Clone, PartialEq)]
pub enum PackingMaterialField {
    TestNumber(TestNumber),
    ProductName(String),
    MaterialName(String),
    ReceivingQuantity(i64),
    LotNumber(String),
    ExpireDate(NaiveDate),
    Result(bool),
    Category(String),
    Vendor(String),
    Memo(Option<String>),
}

impl FieldUpdate for PackingMaterialField {
    fn column(&self) -> &'static str {
        match self {
            PackingMaterialField::TestNumber(_) => "test_number",
            PackingMaterialField::ProductName(_) => "product_name",
            PackingMaterialField::MaterialName(_) => "material_name",
            PackingMaterialField::ReceivingQuantity(_) => "receiving_quantity",
            PackingMaterialField::LotNumber(_) => "lot_number",
            PackingMaterialField::ExpireDate(_) => "expire_date",
            PackingMaterialField::Result(_) => "result",
            PackingMaterialField::Category(_) => "category",
            PackingMaterialField::Vendor(_) => "vendor",
            PackingMaterialField::Memo(_) => "memo",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            PackingMaterialField::ProductName(v) => require_text("product name", v),
            PackingMaterialField::MaterialName(v) => require_text("material name", v),
            PackingMaterialField::LotNumber(v) => require_text("lot number", v),
            PackingMaterialField::Category(v) => require_text("category", v),
            PackingMaterialField::Vendor(v) => require_text("vendor", v),
            PackingMaterialField::ReceivingQuantity(v) => {
                require_non_negative_int("receiving quantity", *v)
            }
            _ => Ok(()),
        }
    }
}

impl ToSql for PackingMaterialField {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            PackingMaterialField::TestNumber(v) => v.to_sql(),
            PackingMaterialField::ProductName(v)
            | PackingMaterialField::MaterialName(v)
            | PackingMaterialField::LotNumber(v)
            | PackingMaterialField::Category(v)
            | PackingMaterialField::Vendor(v) => v.to_sql(),
            PackingMaterialField::ReceivingQuantity(v) => v.to_sql(),
            PackingMaterialField::ExpireDate(v) => v.to_sql(),
            PackingMaterialField::Result(v) => v.to_sql(),
            PackingMaterialField::Memo(v) => v.to_sql(),
        }
    }
}

/// Partial packing material update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackingMaterialPatch {
    pub test_number: Option<TestNumber>,
    pub product_name: Option<String>,
    pub material_name: Option<String>,
    pub receiving_quantity: Option<i64>,
    pub lot_number: Option<String>,
    pub expire_date: Option<NaiveDate>,
    pub result: Option<bool>,
    pub category: Option<String>,
    pub vendor: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub memo: Option<Option<String>>,
}

impl PackingMaterialPatch {
    pub fn into_fields(self) -> Vec<PackingMaterialField> {
        let mut fields = Vec::new();
        if let Some(v) = self.test_number {
            fields.push(PackingMaterialField::TestNumber(v));
        }
        if let Some(v) = self.product_name {
            fields.push(PackingMaterialField::ProductName(v.trim().to_string()));
        }
        if let Some(v) = self.material_name {
            fields.push(PackingMaterialField::MaterialName(v.trim().to_string()));
        }
        if let Some(v) = self.receiving_quantity {
            fields.push(PackingMaterialField::ReceivingQuantity(v));
        }
        if let Some(v) = self.lot_number {
            fields.push(PackingMaterialField::LotNumber(v.trim().to_string()));
        }
        if let Some(v) = self.expire_date {
            fields.push(PackingMaterialField::ExpireDate(v));
        }
        if let Some(v) = self.result {
            fields.push(PackingMaterialField::Result(v));
        }
        if let Some(v) = self.category {
            fields.push(PackingMaterialField::Category(v.trim().to_string()));
        }
        if let Some(v) = self.vendor {
            fields.push(PackingMaterialField::Vendor(v.trim().to_string()));
        }
        if let Some(v) = self.memo {
            fields.push(PackingMaterialField::Memo(blank_to_none(v)));
        }
        fields
    }
}
