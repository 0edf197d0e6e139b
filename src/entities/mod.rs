//! Record types for the three collections

pub mod common;
pub mod master;
pub mod packing_material;
pub mod raw_material;

pub use common::{FieldUpdate, RecordKind, StorageCondition, WeightUnit};
pub use master::{MasterDraft, MasterField, MasterPatch, RawMaterialMaster};
pub use packing_material::{
    NewPackingMaterial, PackingMaterial, PackingMaterialDraft, PackingMaterialField,
    PackingMaterialPatch,
};
pub use raw_material::{
    NewRawMaterial, RawMaterial, RawMaterialDraft, RawMaterialField, RawMaterialPatch,
};
