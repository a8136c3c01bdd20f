//! crop-advisor adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `reference`: TOML reference tables, including the built-in defaults
//! - `classifier`: Crop classifier adapters (stub, external command, centroid model)
//! - `forecast`: Weather forecast adapters (fixed, Open-Meteo)

mod reference_toml;

pub mod classifier;
pub mod forecast;

/// Re-exports for reference table adapters
pub mod reference {
    pub use crate::reference_toml::{
        BuiltinReferenceRepo, TomlReferenceRepo, parse_reference_tables,
    };
}
