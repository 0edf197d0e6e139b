//! lilerp: receiving inventory for a food factory
//!
//! Raw materials and packing materials are received under daily test numbers
//! (`AR25060103`, `AP25060101`) and kept in a single SQLite file. A master
//! catalog of known raw materials fills in details on receipt and derives
//! expire dates from shelf life.

pub mod bridge;
pub mod cli;
pub mod core;
pub mod entities;
