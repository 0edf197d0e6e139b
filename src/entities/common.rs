//! Value types shared by the record collections

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::error::{InventoryError, Result};
use crate::core::testno::TypeCode;

/// Packing weight unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    G,
    Mg,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::G => "g",
            WeightUnit::Mg => "mg",
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kg),
            "g" => Ok(WeightUnit::G),
            "mg" => Ok(WeightUnit::Mg),
            _ => Err(format!("Invalid weight unit: {}. Use kg, g, or mg", s)),
        }
    }
}

/// Required storage temperature band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageCondition {
    #[default]
    #[serde(rename = "Room Temperature")]
    Room,
    #[serde(rename = "Freezing Temperature")]
    Freezing,
    #[serde(rename = "Refrigerating Temperature")]
    Refrigerating,
}

impl StorageCondition {
    /// Stored form, matching the column CHECK constraint
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageCondition::Room => "Room Temperature",
            StorageCondition::Freezing => "Freezing Temperature",
            StorageCondition::Refrigerating => "Refrigerating Temperature",
        }
    }
}

impl std::fmt::Display for StorageCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StorageCondition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.trim_end_matches(" temperature") {
            "room" | "ambient" => Ok(StorageCondition::Room),
            "freezing" | "frozen" => Ok(StorageCondition::Freezing),
            "refrigerating" | "refrigerated" | "chilled" => Ok(StorageCondition::Refrigerating),
            _ => Err(format!(
                "Invalid storage condition: {}. Use room, freezing, or refrigerating",
                s
            )),
        }
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

sql_text_enum!(WeightUnit);
sql_text_enum!(StorageCondition);

/// The two receiving collections that carry test numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    RawMaterial,
    PackingMaterial,
}

impl RecordKind {
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::RawMaterial => "raw_materials",
            RecordKind::PackingMaterial => "packing_materials",
        }
    }

    pub fn type_code(&self) -> TypeCode {
        match self {
            RecordKind::RawMaterial => TypeCode::Ar,
            RecordKind::PackingMaterial => TypeCode::Ap,
        }
    }

    /// Human-readable name used in messages
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::RawMaterial => "raw material",
            RecordKind::PackingMaterial => "packing material",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One column assignment of a partial update
///
/// Each entity has a tagged enum implementing this, so the set of updatable
/// columns is fixed at compile time.
pub trait FieldUpdate: ToSql {
    /// Storage column the value is written to
    fn column(&self) -> &'static str;

    /// Check the value before any SQL runs
    fn validate(&self) -> Result<()>;
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InventoryError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(InventoryError::validation(format!(
            "{} must be a non-negative number (got {})",
            field, value
        )));
    }
    Ok(())
}

pub(crate) fn require_non_negative_int(field: &str, value: i64) -> Result<()> {
    if value < 0 {
        return Err(InventoryError::validation(format!(
            "{} must not be negative (got {})",
            field, value
        )));
    }
    Ok(())
}

/// Empty optional text is stored as NULL
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_unit_parse() {
        assert_eq!("kg".parse::<WeightUnit>().unwrap(), WeightUnit::Kg);
        assert_eq!("G".parse::<WeightUnit>().unwrap(), WeightUnit::G);
        assert_eq!(" mg ".parse::<WeightUnit>().unwrap(), WeightUnit::Mg);
        assert!("lb".parse::<WeightUnit>().is_err());
    }

    #[test]
    fn test_storage_condition_parse() {
        assert_eq!(
            "Room Temperature".parse::<StorageCondition>().unwrap(),
            StorageCondition::Room
        );
        assert_eq!(
            "freezing".parse::<StorageCondition>().unwrap(),
            StorageCondition::Freezing
        );
        assert_eq!(
            "refrigerating_temperature".parse::<StorageCondition>().unwrap(),
            StorageCondition::Refrigerating
        );
        assert!("warm".parse::<StorageCondition>().is_err());
    }

    #[test]
    fn test_storage_condition_serde_uses_stored_form() {
        let json = serde_json::to_string(&StorageCondition::Refrigerating).unwrap();
        assert_eq!(json, "\"Refrigerating Temperature\"");
        let parsed: StorageCondition = serde_json::from_str("\"Freezing Temperature\"").unwrap();
        assert_eq!(parsed, StorageCondition::Freezing);
    }

    #[test]
    fn test_record_kind_codes() {
        assert_eq!(RecordKind::RawMaterial.type_code(), TypeCode::Ar);
        assert_eq!(RecordKind::PackingMaterial.type_code(), TypeCode::Ap);
        assert_eq!(RecordKind::PackingMaterial.table(), "packing_materials");
    }

    #[test]
    fn test_validation_helpers() {
        assert!(require_text("name", "Sugar").is_ok());
        assert!(require_text("name", "   ").is_err());
        assert!(require_non_negative("net weight", 0.0).is_ok());
        assert!(require_non_negative("net weight", -0.5).is_err());
        assert!(require_non_negative("net weight", f64::NAN).is_err());
        assert!(require_non_negative_int("quantity", -1).is_err());
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some("note".into())), Some("note".into()));
    }
}
