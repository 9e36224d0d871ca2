// src/size_catalog.rs
//
// Object-size knowledge base. The engine only depends on the `SizeLookup`
// contract (label in, size record or absent out); the matching strategy
// behind it is swappable. The built-in catalog matches on trimmed,
// lowercased labels and ships entries for the detector's usual label set.

use crate::types::{KnownObjectSize, MeasurementAxis, ObjectCategory};
use std::collections::HashMap;

/// Label → known real-world size, or absent. Absent means size-based
/// ranging contributes nothing for that detection; it is never an error.
pub trait SizeLookup: Send {
    fn lookup(&self, label: &str) -> Option<KnownObjectSize>;
}

pub struct ObjectSizeCatalog {
    entries: HashMap<String, KnownObjectSize>,
}

impl ObjectSizeCatalog {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Catalog pre-loaded with typical real-world dimensions for common
    /// detector labels. Variability reflects how much individuals differ;
    /// reliability how much a box measurement of that class can be trusted.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        let entries = [
            // Humans
            entry("person", ObjectCategory::Human, MeasurementAxis::Height, 1.70, 0.08, 0.90, 0.35),
            // Vehicles
            entry("car", ObjectCategory::Vehicle, MeasurementAxis::Height, 1.50, 0.10, 0.85, 2.40),
            entry("truck", ObjectCategory::Vehicle, MeasurementAxis::Height, 3.20, 0.25, 0.70, 2.20),
            entry("bus", ObjectCategory::Vehicle, MeasurementAxis::Height, 3.10, 0.12, 0.80, 2.80),
            entry("motorcycle", ObjectCategory::Vehicle, MeasurementAxis::Height, 1.20, 0.15, 0.75, 1.60),
            entry("bicycle", ObjectCategory::Vehicle, MeasurementAxis::Height, 1.05, 0.12, 0.75, 1.60),
            entry("train", ObjectCategory::Vehicle, MeasurementAxis::Height, 4.00, 0.15, 0.65, 4.00),
            entry("boat", ObjectCategory::Vehicle, MeasurementAxis::Height, 1.80, 0.40, 0.45, 2.50),
            entry("airplane", ObjectCategory::Vehicle, MeasurementAxis::Height, 5.00, 0.45, 0.35, 5.00),
            // Wildlife and livestock
            entry("dog", ObjectCategory::Wildlife, MeasurementAxis::ShoulderHeight, 0.55, 0.35, 0.50, 1.30),
            entry("cat", ObjectCategory::Wildlife, MeasurementAxis::ShoulderHeight, 0.25, 0.20, 0.55, 1.40),
            entry("horse", ObjectCategory::Wildlife, MeasurementAxis::ShoulderHeight, 1.60, 0.12, 0.80, 1.20),
            entry("cow", ObjectCategory::Wildlife, MeasurementAxis::ShoulderHeight, 1.40, 0.12, 0.80, 1.60),
            entry("sheep", ObjectCategory::Wildlife, MeasurementAxis::ShoulderHeight, 0.75, 0.15, 0.70, 1.40),
            entry("bear", ObjectCategory::Wildlife, MeasurementAxis::ShoulderHeight, 1.00, 0.25, 0.60, 1.60),
            entry("deer", ObjectCategory::Wildlife, MeasurementAxis::ShoulderHeight, 0.95, 0.15, 0.75, 1.30),
            entry("elephant", ObjectCategory::Wildlife, MeasurementAxis::ShoulderHeight, 2.80, 0.20, 0.75, 1.50),
            entry("zebra", ObjectCategory::Wildlife, MeasurementAxis::ShoulderHeight, 1.30, 0.10, 0.80, 1.40),
            entry("giraffe", ObjectCategory::Wildlife, MeasurementAxis::Height, 4.80, 0.15, 0.80, 0.60),
            entry("bird", ObjectCategory::Wildlife, MeasurementAxis::Height, 0.25, 0.60, 0.25, 1.50),
            // Signs and street furniture
            entry("stop sign", ObjectCategory::Sign, MeasurementAxis::Width, 0.75, 0.05, 0.95, 1.00),
            entry("traffic light", ObjectCategory::Sign, MeasurementAxis::Height, 1.00, 0.15, 0.70, 0.40),
            entry("fire hydrant", ObjectCategory::Structure, MeasurementAxis::Height, 0.75, 0.15, 0.75, 0.50),
            entry("parking meter", ObjectCategory::Structure, MeasurementAxis::Height, 1.30, 0.12, 0.70, 0.30),
            entry("bench", ObjectCategory::Structure, MeasurementAxis::Width, 1.60, 0.25, 0.55, 3.00),
        ];

        for record in entries {
            catalog.insert(record);
        }
        catalog
    }

    pub fn insert(&mut self, record: KnownObjectSize) {
        self.entries.insert(normalize(&record.label), record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ObjectSizeCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SizeLookup for ObjectSizeCatalog {
    fn lookup(&self, label: &str) -> Option<KnownObjectSize> {
        self.entries.get(&normalize(label)).cloned()
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

fn entry(
    label: &str,
    category: ObjectCategory,
    axis: MeasurementAxis,
    size_m: f32,
    variability: f32,
    reliability: f32,
    expected_aspect: f32,
) -> KnownObjectSize {
    KnownObjectSize {
        label: label.to_string(),
        category,
        axis,
        size_m,
        variability,
        reliability,
        expected_aspect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_label() {
        let catalog = ObjectSizeCatalog::with_defaults();
        let person = catalog.lookup("person").unwrap();
        assert_eq!(person.category, ObjectCategory::Human);
        assert!((person.size_m - 1.70).abs() < 1e-6);
    }

    #[test]
    fn test_lookup_unknown_label_absent() {
        let catalog = ObjectSizeCatalog::with_defaults();
        assert!(catalog.lookup("sasquatch").is_none());
    }

    #[test]
    fn test_lookup_normalizes_case_and_whitespace() {
        let catalog = ObjectSizeCatalog::with_defaults();
        assert!(catalog.lookup("  Person ").is_some());
        assert!(catalog.lookup("STOP SIGN").is_some());
    }

    #[test]
    fn test_insert_overrides() {
        let mut catalog = ObjectSizeCatalog::with_defaults();
        catalog.insert(KnownObjectSize {
            label: "person".to_string(),
            category: ObjectCategory::Human,
            axis: MeasurementAxis::Height,
            size_m: 1.85,
            variability: 0.05,
            reliability: 0.95,
            expected_aspect: 0.35,
        });
        let person = catalog.lookup("person").unwrap();
        assert!((person.size_m - 1.85).abs() < 1e-6);
    }

    #[test]
    fn test_default_entries_well_formed() {
        let catalog = ObjectSizeCatalog::with_defaults();
        assert!(!catalog.is_empty());
        for label in ["person", "car", "deer", "stop sign", "horse"] {
            let record = catalog.lookup(label).unwrap();
            assert!(record.size_m > 0.0);
            assert!((0.0..=1.0).contains(&record.variability));
            assert!((0.0..=1.0).contains(&record.reliability));
            assert!(record.expected_aspect > 0.0);
        }
    }
}
