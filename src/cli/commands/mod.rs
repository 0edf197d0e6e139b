//! CLI command implementations

pub mod bridge;
pub mod completions;
pub mod config;
pub mod db;
pub mod master;
pub mod pack;
pub mod raw;
