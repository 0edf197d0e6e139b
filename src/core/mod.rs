//! Core module - inventory types, rules and storage

pub mod config;
pub mod error;
pub mod expand;
pub mod logging;
pub mod store;
pub mod testno;

pub use config::Config;
pub use error::{InventoryError, Result};
pub use store::{InventoryStore, StoreStats, DB_FILE, SCHEMA_VERSION};
pub use testno::{next_test_number, TestNumber, TestNumberError, TypeCode};
