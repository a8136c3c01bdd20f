//! crop-advisor domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `reference`: The immutable economic reference store
//! - `usecases`: Ranking, recommendation and soil amendment logic
//! - `policy`: Soil alert thresholds

pub mod model;
pub mod policy;
pub mod ports;
pub mod reference;
pub mod usecases;

pub use model::*;
pub use ports::*;
pub use reference::{ClassMapping, EconomicReferenceStore, ReferenceTables};
