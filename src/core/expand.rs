//! Master expansion: turn a catalog entry into a raw material draft

use chrono::{Days, NaiveDate};

use crate::core::error::{InventoryError, Result};
use crate::entities::{RawMaterialDraft, RawMaterialMaster};

/// Expire date for goods made on `manufacturing_date` with the given shelf life
///
/// Plain day arithmetic: 730 days from 2025-01-01 is 2027-01-01.
pub fn expire_date(manufacturing_date: NaiveDate, shelf_life_days: u32) -> Result<NaiveDate> {
    manufacturing_date
        .checked_add_days(Days::new(u64::from(shelf_life_days)))
        .ok_or_else(|| {
            InventoryError::validation(format!(
                "expire date overflows: {} + {} days",
                manufacturing_date, shelf_life_days
            ))
        })
}

/// Advisory total: one unit's net weight times the unit count
pub fn receiving_quantity(net_weight: f64, count: i64) -> f64 {
    net_weight * count as f64
}

/// Build a draft from a master; quantities come from the caller
///
/// Attributes are copied, not referenced, so later edits or deletion of the
/// master never reach records created from the draft.
pub fn expand(
    master: &RawMaterialMaster,
    manufacturing_date: NaiveDate,
    receiving_quantity: f64,
    quantity: i64,
) -> Result<RawMaterialDraft> {
    Ok(RawMaterialDraft {
        name: master.name.clone(),
        receiving_quantity,
        net_weight: master.net_weight,
        weight_unit: master.weight_unit,
        quantity,
        manufacturing_date,
        expire_date: expire_date(manufacturing_date, master.shelf_life_days)?,
        vendor: master.vendor.clone(),
        country: master.country.clone(),
        storage_conditions: master.storage_conditions,
        food_type: master.food_type.clone(),
        memo: master.memo.clone(),
    })
}
