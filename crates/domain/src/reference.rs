//! Economic reference store
//!
//! Immutable per-crop economic constants plus the classifier class map. The
//! store is validated once when built and then shared read-only (usually via
//! `Arc`) with the ranking engine and the amendment advisor.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use crate::model::{CropEconomics, Nutrient, YieldBasis};
use crate::ports::ReferenceError;

/// Per-hectare scaling applied to per-area yields
pub const DEFAULT_AREA_MULTIPLIER: f64 = 10_000.0;

/// Maps a classifier class id to a crop name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMapping {
    pub id: u32,
    pub crop: String,
}

/// Raw reference tables, as read from a data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTables {
    #[serde(default = "default_area_multiplier")]
    pub area_multiplier: f64,
    pub fertilizer_costs: BTreeMap<Nutrient, f64>,
    #[serde(default, rename = "crop")]
    pub crops: Vec<CropEconomics>,
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassMapping>,
}

fn default_area_multiplier() -> f64 {
    DEFAULT_AREA_MULTIPLIER
}

/// Validated, read-only economic reference tables
#[derive(Debug, Clone)]
pub struct EconomicReferenceStore {
    crops: Vec<CropEconomics>,
    index: HashMap<String, usize>,
    class_map: BTreeMap<u32, String>,
    fertilizer_costs: BTreeMap<Nutrient, f64>,
    area_multiplier: f64,
    fingerprint: String,
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9_]+$").expect("Valid regex"))
}

fn ensure_finite(crop: &str, field: &str, value: f64) -> Result<(), ReferenceError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ReferenceError::Validation(format!(
            "{} of '{}' is not finite: {}",
            field, crop, value
        )))
    }
}

impl EconomicReferenceStore {
    /// Validate raw tables and build the store.
    ///
    /// Crop order is preserved from the input so listings are reproducible.
    pub fn from_tables(tables: ReferenceTables) -> Result<Self, ReferenceError> {
        if !tables.area_multiplier.is_finite() || tables.area_multiplier <= 0.0 {
            return Err(ReferenceError::Validation(format!(
                "area_multiplier must be positive, got {}",
                tables.area_multiplier
            )));
        }

        for nutrient in Nutrient::ALL {
            match tables.fertilizer_costs.get(&nutrient) {
                Some(cost) if cost.is_finite() => {}
                Some(cost) => {
                    return Err(ReferenceError::Validation(format!(
                        "fertilizer cost for {} is not finite: {}",
                        nutrient, cost
                    )));
                }
                None => {
                    return Err(ReferenceError::Validation(format!(
                        "missing fertilizer cost for {}",
                        nutrient
                    )));
                }
            }
        }

        let mut index = HashMap::with_capacity(tables.crops.len());
        for (pos, crop) in tables.crops.iter().enumerate() {
            if !name_pattern().is_match(&crop.name) {
                return Err(ReferenceError::InvalidName(crop.name.clone()));
            }
            if index.insert(crop.name.clone(), pos).is_some() {
                return Err(ReferenceError::DuplicateCrop(crop.name.clone()));
            }

            ensure_finite(&crop.name, "average_yield", crop.average_yield)?;
            ensure_finite(&crop.name, "market_price", crop.market_price)?;
            ensure_finite(&crop.name, "seed_cost", crop.seed_cost)?;
            ensure_finite(&crop.name, "maintenance_cost", crop.maintenance_cost)?;
            ensure_finite(&crop.name, "growing_period", crop.growing_period)?;
            if crop.growing_period <= 0.0 {
                return Err(ReferenceError::Validation(format!(
                    "growing_period of '{}' must be > 0, got {}",
                    crop.name, crop.growing_period
                )));
            }
            for value in crop.optimal_conditions {
                ensure_finite(&crop.name, "optimal_conditions", value)?;
            }
        }

        let mut class_map = BTreeMap::new();
        for mapping in &tables.classes {
            if !index.contains_key(&mapping.crop) {
                return Err(ReferenceError::UnknownCrop(mapping.crop.clone()));
            }
            if class_map.insert(mapping.id, mapping.crop.clone()).is_some() {
                return Err(ReferenceError::Validation(format!(
                    "class id {} is mapped more than once",
                    mapping.id
                )));
            }
        }

        let fingerprint = compute_fingerprint(&tables);

        Ok(Self {
            crops: tables.crops,
            index,
            class_map,
            fertilizer_costs: tables.fertilizer_costs,
            area_multiplier: tables.area_multiplier,
            fingerprint,
        })
    }

    /// Known crop names in stable order
    pub fn list_crops(&self) -> Vec<&str> {
        self.crops.iter().map(|c| c.name.as_str()).collect()
    }

    /// All crop records in stable order
    pub fn crops(&self) -> &[CropEconomics] {
        &self.crops
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Look up a crop by name
    pub fn get(&self, name: &str) -> Result<&CropEconomics, ReferenceError> {
        self.index
            .get(name)
            .map(|&pos| &self.crops[pos])
            .ok_or_else(|| ReferenceError::UnknownCrop(name.to_string()))
    }

    /// Resolve a classifier class id to its crop name
    pub fn resolve_class_index(&self, class_id: u32) -> Result<&str, ReferenceError> {
        self.class_map
            .get(&class_id)
            .map(String::as_str)
            .ok_or(ReferenceError::UnknownClass(class_id))
    }

    /// Class mappings ordered by class id
    pub fn class_mappings(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.class_map.iter().map(|(id, crop)| (*id, crop.as_str()))
    }

    pub fn fertilizer_unit_cost(&self, nutrient: Nutrient) -> f64 {
        // Presence of every nutrient is checked in from_tables
        self.fertilizer_costs.get(&nutrient).copied().unwrap_or(0.0)
    }

    pub fn area_multiplier(&self) -> f64 {
        self.area_multiplier
    }

    /// Multiplier applied to `yield * price` when computing revenue
    pub fn revenue_multiplier(&self, crop: &CropEconomics) -> f64 {
        match crop.yield_basis {
            YieldBasis::PerArea => self.area_multiplier,
            YieldBasis::WholeField => 1.0,
        }
    }

    /// SHA-256 over the tables, for detecting drift between deployments
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Copy the store back into raw tables
    pub fn to_tables(&self) -> ReferenceTables {
        ReferenceTables {
            area_multiplier: self.area_multiplier,
            fertilizer_costs: self.fertilizer_costs.clone(),
            crops: self.crops.clone(),
            classes: self
                .class_map
                .iter()
                .map(|(id, crop)| ClassMapping {
                    id: *id,
                    crop: crop.clone(),
                })
                .collect(),
        }
    }
}

fn compute_fingerprint(tables: &ReferenceTables) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tables.area_multiplier.to_le_bytes());
    for (nutrient, cost) in &tables.fertilizer_costs {
        hasher.update(nutrient.symbol().as_bytes());
        hasher.update(cost.to_le_bytes());
    }
    for crop in &tables.crops {
        hasher.update(crop.name.as_bytes());
        for value in [
            crop.average_yield,
            crop.market_price,
            crop.seed_cost,
            crop.maintenance_cost,
            crop.growing_period,
        ] {
            hasher.update(value.to_le_bytes());
        }
        for value in crop.optimal_conditions {
            hasher.update(value.to_le_bytes());
        }
        hasher.update([matches!(crop.yield_basis, YieldBasis::WholeField) as u8]);
    }
    let mut classes: Vec<_> = tables.classes.iter().collect();
    classes.sort_by_key(|c| c.id);
    for class in classes {
        hasher.update(class.id.to_le_bytes());
        hasher.update(class.crop.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crop(name: &str) -> CropEconomics {
        CropEconomics {
            name: name.to_string(),
            average_yield: 2.0,
            market_price: 10.0,
            seed_cost: 100.0,
            maintenance_cost: 200.0,
            growing_period: 4.0,
            optimal_conditions: [50.0, 40.0, 30.0, 100.0, 6.5, 70.0, 24.0],
            yield_basis: YieldBasis::PerArea,
        }
    }

    fn fertilizer() -> BTreeMap<Nutrient, f64> {
        BTreeMap::from([(Nutrient::N, 20.0), (Nutrient::P, 30.0), (Nutrient::K, 25.0)])
    }

    fn tables(crops: Vec<CropEconomics>, classes: Vec<ClassMapping>) -> ReferenceTables {
        ReferenceTables {
            area_multiplier: DEFAULT_AREA_MULTIPLIER,
            fertilizer_costs: fertilizer(),
            crops,
            classes,
        }
    }

    fn mapping(id: u32, crop: &str) -> ClassMapping {
        ClassMapping {
            id,
            crop: crop.to_string(),
        }
    }

    #[test]
    fn test_list_crops_preserves_order() {
        let store = EconomicReferenceStore::from_tables(tables(
            vec![crop("rice"), crop("apple"), crop("maize")],
            vec![],
        ))
        .unwrap();

        assert_eq!(store.list_crops(), vec!["rice", "apple", "maize"]);
    }

    #[test]
    fn test_get_unknown_crop() {
        let store = EconomicReferenceStore::from_tables(tables(vec![crop("rice")], vec![])).unwrap();

        assert_eq!(store.get("rice").unwrap().name, "rice");
        assert!(matches!(
            store.get("wheat"),
            Err(ReferenceError::UnknownCrop(name)) if name == "wheat"
        ));
    }

    #[test]
    fn test_resolve_class_index() {
        let store = EconomicReferenceStore::from_tables(tables(
            vec![crop("rice"), crop("maize")],
            vec![mapping(20, "rice"), mapping(11, "maize")],
        ))
        .unwrap();

        assert_eq!(store.resolve_class_index(20).unwrap(), "rice");
        assert!(matches!(
            store.resolve_class_index(99),
            Err(ReferenceError::UnknownClass(99))
        ));
        let ids: Vec<_> = store.class_mappings().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![11, 20]);
    }

    #[test]
    fn test_rejects_duplicate_crop() {
        let result =
            EconomicReferenceStore::from_tables(tables(vec![crop("rice"), crop("rice")], vec![]));
        assert!(matches!(result, Err(ReferenceError::DuplicateCrop(_))));
    }

    #[test]
    fn test_rejects_invalid_name() {
        let result = EconomicReferenceStore::from_tables(tables(vec![crop("Rice")], vec![]));
        assert!(matches!(result, Err(ReferenceError::InvalidName(_))));
    }

    #[test]
    fn test_rejects_zero_growing_period() {
        let mut bad = crop("rice");
        bad.growing_period = 0.0;
        let result = EconomicReferenceStore::from_tables(tables(vec![bad], vec![]));
        assert!(matches!(result, Err(ReferenceError::Validation(msg)) if msg.contains("growing_period")));
    }

    #[test]
    fn test_rejects_class_mapped_to_unknown_crop() {
        let result = EconomicReferenceStore::from_tables(tables(
            vec![crop("rice")],
            vec![mapping(0, "wheat")],
        ));
        assert!(matches!(result, Err(ReferenceError::UnknownCrop(_))));
    }

    #[test]
    fn test_rejects_missing_fertilizer_cost() {
        let mut t = tables(vec![crop("rice")], vec![]);
        t.fertilizer_costs.remove(&Nutrient::P);
        let result = EconomicReferenceStore::from_tables(t);
        assert!(matches!(result, Err(ReferenceError::Validation(msg)) if msg.contains("P")));
    }

    #[test]
    fn test_empty_store_builds() {
        let store = EconomicReferenceStore::from_tables(tables(vec![], vec![])).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_revenue_multiplier_respects_yield_basis() {
        let mut coconut = crop("coconut");
        coconut.yield_basis = YieldBasis::WholeField;
        let store =
            EconomicReferenceStore::from_tables(tables(vec![crop("rice"), coconut], vec![]))
                .unwrap();

        let rice = store.get("rice").unwrap();
        let coconut = store.get("coconut").unwrap();
        assert_eq!(store.revenue_multiplier(rice), DEFAULT_AREA_MULTIPLIER);
        assert_eq!(store.revenue_multiplier(coconut), 1.0);
    }

    #[test]
    fn test_fingerprint_is_deterministic_and_sensitive() {
        let a = EconomicReferenceStore::from_tables(tables(vec![crop("rice")], vec![])).unwrap();
        let b = EconomicReferenceStore::from_tables(tables(vec![crop("rice")], vec![])).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut changed = crop("rice");
        changed.market_price = 11.0;
        let c = EconomicReferenceStore::from_tables(tables(vec![changed], vec![])).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_to_tables_round_trips_through_from_tables() {
        let original = EconomicReferenceStore::from_tables(tables(
            vec![crop("rice")],
            vec![mapping(20, "rice")],
        ))
        .unwrap();
        let rebuilt = EconomicReferenceStore::from_tables(original.to_tables()).unwrap();
        assert_eq!(original.fingerprint(), rebuilt.fingerprint());
    }
}
