//! Compile-time registry of analysis regions.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a new city requires creating a TOML file in `regions/` and adding
//! a corresponding entry here.

use opportunity_map_grid_models::RegionDefinition;

use crate::GridError;

/// Number of registered regions. Enforced by a test.
#[cfg(test)]
const EXPECTED_REGION_COUNT: usize = 5;

/// Embedded TOML region definitions.
const REGION_TOMLS: &[(&str, &str)] = &[
    ("milan", include_str!("../regions/milan.toml")),
    ("copenhagen", include_str!("../regions/copenhagen.toml")),
    ("bologna", include_str!("../regions/bologna.toml")),
    ("rome", include_str!("../regions/rome.toml")),
    ("turin", include_str!("../regions/turin.toml")),
];

/// Returns all registered regions.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the registry tests.
#[must_use]
pub fn all_regions() -> Vec<RegionDefinition> {
    REGION_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse region '{name}': {e}"))
        })
        .collect()
}

/// Looks up a region by identifier (case-insensitive).
///
/// # Errors
///
/// Returns [`GridError::UnknownRegion`] if no region with that id is
/// configured.
pub fn find_region(id: &str) -> Result<RegionDefinition, GridError> {
    let regions = all_regions();
    let wanted = id.trim().to_lowercase();

    if let Some(region) = regions.iter().find(|r| r.id == wanted) {
        return Ok(region.clone());
    }

    Err(GridError::UnknownRegion {
        id: id.to_string(),
        available: regions
            .iter()
            .map(RegionDefinition::id)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_regions() {
        let regions = all_regions();
        assert_eq!(
            regions.len(),
            EXPECTED_REGION_COUNT,
            "Expected {EXPECTED_REGION_COUNT} regions, found {}. \
             Update EXPECTED_REGION_COUNT after adding/removing regions.",
            regions.len()
        );
    }

    #[test]
    fn region_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for region in &all_regions() {
            assert!(seen.insert(region.id.clone()), "Duplicate region ID: {}", region.id);
        }
    }

    #[test]
    fn region_ids_match_registry_names() {
        for ((name, _), region) in REGION_TOMLS.iter().zip(all_regions()) {
            assert_eq!(*name, region.id);
        }
    }

    #[test]
    fn all_regions_have_valid_bounds() {
        for region in &all_regions() {
            assert!(region.bounds.is_valid(), "Region {} has invalid bounds", region.id);
            let b = region.bounds;
            assert!(
                (b.south..=b.north).contains(&region.center.lat)
                    && (b.west..=b.east).contains(&region.center.lng),
                "Region {} center lies outside its bounds",
                region.id
            );
        }
    }

    #[test]
    fn finds_region_case_insensitively() {
        let region = find_region("Milan").unwrap();
        assert_eq!(region.id, "milan");
        assert_eq!(region.boundary_query(), "Milano, Lombardia, Italia");
        assert!((region.bounds.north - 45.535).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_region_lists_available() {
        let err = find_region("atlantis").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("atlantis"));
        assert!(message.contains("milan"));
        assert!(message.contains("copenhagen"));
    }
}
