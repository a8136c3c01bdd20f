//! TOML-backed economic reference tables

use crop_advisor_domain::{
    ClassMapping, CropEconomics, EconomicReferenceStore, Nutrient, ReferenceError, ReferenceRepo,
    ReferenceTables,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default tables shipped with the binary
const BUILTIN_TABLES: &str = include_str!("../data/reference_tables.toml");

/// On-disk shape of a reference tables file
#[derive(Deserialize)]
struct ReferenceFile {
    #[serde(default = "default_area_multiplier")]
    area_multiplier: f64,
    #[serde(default)]
    fertilizer_costs: BTreeMap<String, f64>,
    #[serde(default)]
    crop: Vec<CropEconomics>,
    #[serde(default)]
    class: Vec<ClassMapping>,
}

fn default_area_multiplier() -> f64 {
    crop_advisor_domain::reference::DEFAULT_AREA_MULTIPLIER
}

/// Parse TOML reference tables; `source_name` is used in error messages
pub fn parse_reference_tables(
    content: &str,
    source_name: &str,
) -> Result<EconomicReferenceStore, ReferenceError> {
    let file: ReferenceFile = toml::from_str(content).map_err(|e| ReferenceError::Parse {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })?;

    let mut fertilizer_costs = BTreeMap::new();
    for (symbol, cost) in file.fertilizer_costs {
        let nutrient: Nutrient = symbol.parse().map_err(|message| ReferenceError::Parse {
            source_name: source_name.to_string(),
            message,
        })?;
        fertilizer_costs.insert(nutrient, cost);
    }

    let store = EconomicReferenceStore::from_tables(ReferenceTables {
        area_multiplier: file.area_multiplier,
        fertilizer_costs,
        crops: file.crop,
        classes: file.class,
    })?;

    tracing::debug!(
        source = %source_name,
        crops = store.len(),
        fingerprint = %store.fingerprint(),
        "Loaded reference tables"
    );

    Ok(store)
}

/// Reference tables read from a TOML file
pub struct TomlReferenceRepo {
    path: PathBuf,
}

impl TomlReferenceRepo {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceRepo for TomlReferenceRepo {
    fn load(&self) -> Result<EconomicReferenceStore, ReferenceError> {
        let content = std::fs::read_to_string(&self.path)?;
        parse_reference_tables(&content, &self.path.display().to_string())
    }
}

/// The tables compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinReferenceRepo;

impl BuiltinReferenceRepo {
    /// Raw TOML of the built-in tables, e.g. as a starting point for a custom file
    pub fn source() -> &'static str {
        BUILTIN_TABLES
    }
}

impl ReferenceRepo for BuiltinReferenceRepo {
    fn load(&self) -> Result<EconomicReferenceStore, ReferenceError> {
        parse_reference_tables(BUILTIN_TABLES, "builtin")
    }
}
