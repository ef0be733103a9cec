#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types produced by the accessibility engine.
//!
//! The pipeline derives, per grid cell: a row of facility distances
//! ([`DistanceRow`]), an [`AccessibilityRecord`] reduced from that row, and
//! an [`OpportunityRecord`] scored under a [`ScoringPolicy`]. Demand-weighted
//! records carry their population inputs in a dedicated [`DemandScore`].

use opportunity_map_grid_models::CellId;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Distance between one grid cell and one facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord {
    /// Grid cell identifier.
    pub cell_id: CellId,
    /// Facility identifier.
    pub facility_id: String,
    /// Geodesic distance in kilometers.
    pub distance_km: f64,
}

/// Distances from one cell to every facility, in facility input order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceRow {
    /// Grid cell identifier.
    pub cell_id: CellId,
    /// `distances_km[i]` is the distance to facility `i`.
    pub distances_km: Vec<f64>,
}

/// Dense cell × facility distance matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceMatrix {
    /// Facility ids in column order.
    pub facility_ids: Vec<String>,
    /// One row per grid cell, in grid order.
    pub rows: Vec<DistanceRow>,
}

impl DistanceMatrix {
    /// Number of cell rows.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of facility columns.
    #[must_use]
    pub fn facility_count(&self) -> usize {
        self.facility_ids.len()
    }

    /// Iterates the matrix as flat records, row by row.
    pub fn records(&self) -> impl Iterator<Item = DistanceRecord> + '_ {
        self.rows.iter().flat_map(move |row| {
            row.distances_km
                .iter()
                .zip(&self.facility_ids)
                .map(move |(&distance_km, facility_id)| DistanceRecord {
                    cell_id: row.cell_id,
                    facility_id: facility_id.clone(),
                    distance_km,
                })
        })
    }
}

/// Per-cell accessibility metrics.
///
/// Distances are `+∞` when no facility exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityRecord {
    /// Grid cell identifier.
    pub cell_id: CellId,
    /// Latitude of the cell center.
    pub center_lat: f64,
    /// Longitude of the cell center.
    pub center_lng: f64,
    /// Facilities within the walking threshold (inclusive).
    pub services_within_walking: usize,
    /// Distance to the closest facility.
    pub nearest_distance_km: f64,
    /// Mean distance of the (up to) three closest facilities.
    pub avg_distance_top3_km: f64,
    /// Facilities within 1 km divided by the area of a 1 km circle.
    pub density_per_km2: f64,
}

/// Normalized supply-side sub-scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupplyScores {
    /// `1 - density / max_density` across the grid.
    pub competition_gap: f64,
    /// Nearest distance capped at 3 km, scaled to `[0, 1]`.
    pub accessibility_gap: f64,
    /// Whether local supply suggests a viable market.
    pub viability: f64,
}

/// Named weight sets for the composite opportunity score.
///
/// Scores produced under different policies are not comparable.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoringPolicy {
    /// 40 % competition gap, 40 % accessibility gap, 20 % viability.
    SupplyOnly,
    /// 30 % competition gap, 30 % accessibility gap, 30 % demand,
    /// 10 % viability, with a hard population floor.
    DemandWeighted,
}

/// Population inputs for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellPopulation {
    /// Grid cell identifier.
    pub cell_id: CellId,
    /// Raster estimate at the cell center.
    pub population: f64,
    /// Sum of center estimates of all cells within 1 km (self included).
    pub population_1km: f64,
}

/// Demand inputs and outputs of a demand-weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandScore {
    /// Raster estimate at the cell center.
    pub population: f64,
    /// Population within 1 km.
    pub population_1km: f64,
    /// `population_1km / max`, forced to 0 under the population floor.
    pub demand_score: f64,
    /// Supply-only score the cell had before demand weighting.
    pub opportunity_score_original: f64,
}

/// How an [`OpportunityRecord`] was scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBasis {
    /// Supply-side sub-scores only.
    SupplyOnly,
    /// Supply-side sub-scores plus population demand.
    DemandWeighted(DemandScore),
}

impl ScoreBasis {
    /// The policy discriminant.
    #[must_use]
    pub const fn policy(&self) -> ScoringPolicy {
        match self {
            Self::SupplyOnly => ScoringPolicy::SupplyOnly,
            Self::DemandWeighted(_) => ScoringPolicy::DemandWeighted,
        }
    }
}

/// Accessibility metrics plus a composite opportunity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpportunityRecord {
    /// Underlying accessibility metrics.
    pub accessibility: AccessibilityRecord,
    /// Supply-side sub-scores.
    pub scores: SupplyScores,
    /// Composite score in `[0, 10]`.
    pub opportunity_score: f64,
    /// Policy used, with its demand inputs when demand-weighted.
    pub basis: ScoreBasis,
}

impl OpportunityRecord {
    /// Grid cell identifier.
    #[must_use]
    pub const fn cell_id(&self) -> CellId {
        self.accessibility.cell_id
    }

    /// Cell center as `(lat, lng)`.
    #[must_use]
    pub const fn center(&self) -> (f64, f64) {
        (self.accessibility.center_lat, self.accessibility.center_lng)
    }

    /// Policy the score was computed under.
    #[must_use]
    pub const fn policy(&self) -> ScoringPolicy {
        self.basis.policy()
    }

    /// Demand inputs, if the record is demand-weighted.
    #[must_use]
    pub const fn demand(&self) -> Option<&DemandScore> {
        match &self.basis {
            ScoreBasis::SupplyOnly => None,
            ScoreBasis::DemandWeighted(demand) => Some(demand),
        }
    }

    /// The supply-only score this record had or would have had.
    #[must_use]
    pub fn supply_only_score(&self) -> f64 {
        self.demand()
            .map_or(self.opportunity_score, |d| d.opportunity_score_original)
    }
}

/// Service desert classification of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesertReport {
    /// Number of classified cells.
    pub total_cells: usize,
    /// Ids of cells classified as deserts, in grid order.
    pub desert_cell_ids: Vec<CellId>,
    /// Share of desert cells in percent; 0 for an empty grid.
    pub percentage: f64,
}

impl DesertReport {
    /// Number of desert cells.
    #[must_use]
    pub fn desert_count(&self) -> usize {
        self.desert_cell_ids.len()
    }
}

/// Summary statistics of opportunity scores over a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Number of scored cells.
    pub cells: usize,
    /// Minimum score, 0 for an empty grid.
    pub min: f64,
    /// Maximum score, 0 for an empty grid.
    pub max: f64,
    /// Mean score, 0 for an empty grid.
    pub mean: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_records_follow_row_then_facility_order() {
        let matrix = DistanceMatrix {
            facility_ids: vec!["a".into(), "b".into()],
            rows: vec![
                DistanceRow {
                    cell_id: 0,
                    distances_km: vec![1.0, 2.0],
                },
                DistanceRow {
                    cell_id: 1,
                    distances_km: vec![3.0, 4.0],
                },
            ],
        };

        let records: Vec<_> = matrix.records().collect();
        assert_eq!(records.len(), 4);
        assert_eq!(records[1].cell_id, 0);
        assert_eq!(records[1].facility_id, "b");
        assert!((records[2].distance_km - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn policy_names_round_trip() {
        assert_eq!(ScoringPolicy::SupplyOnly.to_string(), "supply_only");
        assert_eq!(
            "demand_weighted".parse::<ScoringPolicy>().unwrap(),
            ScoringPolicy::DemandWeighted
        );
    }
}
