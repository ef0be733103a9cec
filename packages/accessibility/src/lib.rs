#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Grid-based accessibility and opportunity scoring.
//!
//! The engine runs in stages over a fixed grid and facility set:
//!
//! 1. [`matrix::build_distance_matrix`] computes geodesic distances for
//!    every (cell, facility) pair.
//! 2. [`analyzer::analyze_accessibility`] reduces each row to walking-range
//!    counts, nearest and top-3 distances, and density.
//! 3. [`desert::classify_deserts`] flags underserved cells.
//! 4. [`scoring::score_supply`] produces composite opportunity scores, and
//!    [`scoring::score_demand`] re-scores them once population is known.

pub mod analyzer;
pub mod desert;
pub mod matrix;
pub mod progress;
pub mod scoring;

pub use analyzer::{DEFAULT_WALKING_DISTANCE_KM, analyze_accessibility};
pub use desert::{classify_deserts, is_desert};
pub use matrix::build_distance_matrix;
pub use progress::{NullProgress, ProgressCallback, null_progress};
pub use scoring::{score_demand, score_supply, summarize_scores, top_opportunities};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::f64::consts::PI;

    use opportunity_map_accessibility_models::ScoringPolicy;
    use opportunity_map_facility_models::Facility;
    use opportunity_map_grid_models::GridCell;

    use super::*;

    #[test]
    fn single_cell_single_facility() {
        let cells = vec![GridCell::from_center(0, 1.005, 1.005, 0.01, 0.01)];
        let facilities = vec![Facility {
            id: "f1".to_string(),
            name: "Only pharmacy".to_string(),
            category: "pharmacy".to_string(),
            lat: 1.005,
            lng: 1.006,
            rating: Some(4.0),
            metadata: BTreeMap::new(),
        }];

        let matrix = build_distance_matrix(&cells, &facilities, &null_progress());
        let distance = matrix.rows[0].distances_km[0];
        assert!((distance - 0.1113).abs() < 0.001, "distance {distance}");

        let access = analyze_accessibility(&cells, &matrix, DEFAULT_WALKING_DISTANCE_KM);
        let record = access[0];
        assert_eq!(record.services_within_walking, 1);
        assert!((record.nearest_distance_km - distance).abs() < f64::EPSILON);
        assert!((record.avg_distance_top3_km - distance).abs() < f64::EPSILON);
        assert!((record.density_per_km2 - 1.0 / PI).abs() < 1e-12);

        // One service within walking range is still too few.
        let deserts = classify_deserts(&access);
        assert_eq!(deserts.desert_cell_ids, vec![0]);
        assert!((deserts.percentage - 100.0).abs() < 1e-12);

        let scored = score_supply(&access);
        let opportunity = &scored[0];
        assert_eq!(opportunity.policy(), ScoringPolicy::SupplyOnly);
        // The only cell is also the densest one.
        assert!(opportunity.scores.competition_gap.abs() < 1e-12);
        assert!((opportunity.scores.accessibility_gap - distance / 3.0).abs() < 1e-12);
        assert!((opportunity.scores.viability - 1.0).abs() < f64::EPSILON);

        let expected = 10.0 * (0.40 * (distance / 3.0) + 0.20);
        assert!((opportunity.opportunity_score - expected).abs() < 1e-9);
        assert!((opportunity.opportunity_score - 2.148).abs() < 0.01);
    }

    #[test]
    fn no_facilities_pipeline() {
        let cells: Vec<_> = (0..4)
            .map(|i| GridCell::from_center(i, 45.46, 9.19, 0.0045, 0.0064))
            .collect();

        let matrix = build_distance_matrix(&cells, &[], &null_progress());
        let access = analyze_accessibility(&cells, &matrix, DEFAULT_WALKING_DISTANCE_KM);
        let scored = score_supply(&access);

        for record in &scored {
            assert!(record.accessibility.nearest_distance_km.is_infinite());
            assert_eq!(record.accessibility.services_within_walking, 0);
            assert!((record.scores.viability - 0.5).abs() < f64::EPSILON);
            assert!((record.scores.accessibility_gap - 1.0).abs() < f64::EPSILON);
            assert!((record.scores.competition_gap - 1.0).abs() < f64::EPSILON);
        }
        assert_eq!(classify_deserts(&access).desert_count(), 4);
    }
}
