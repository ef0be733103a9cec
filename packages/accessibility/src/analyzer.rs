//! Per-cell accessibility metrics.
//!
//! Each cell's record is derived only from that cell's own distance row,
//! so cells are reduced independently on the rayon pool.

use std::f64::consts::PI;

use opportunity_map_accessibility_models::{AccessibilityRecord, DistanceMatrix};
use opportunity_map_grid_models::GridCell;
use rayon::prelude::*;

/// Default walking threshold in kilometers.
pub const DEFAULT_WALKING_DISTANCE_KM: f64 = 1.0;

/// Radius of the circle used for density, in kilometers.
pub const DENSITY_RADIUS_KM: f64 = 1.0;

/// How many of the closest facilities are averaged.
const NEAREST_AVERAGE_COUNT: usize = 3;

/// Reduces one cell's distances to its accessibility metrics.
///
/// `distances_km` may be in any order; an empty slice yields `+∞`
/// distances and zero counts.
#[must_use]
pub fn reduce_cell(
    cell: &GridCell,
    distances_km: &[f64],
    walking_distance_km: f64,
) -> AccessibilityRecord {
    let mut sorted = distances_km.to_vec();
    sorted.sort_by(f64::total_cmp);

    let services_within_walking = sorted
        .iter()
        .take_while(|&&d| d <= walking_distance_km)
        .count();
    let within_density_radius = sorted
        .iter()
        .take_while(|&&d| d <= DENSITY_RADIUS_KM)
        .count();

    let nearest_distance_km = sorted.first().copied().unwrap_or(f64::INFINITY);

    let top = &sorted[..sorted.len().min(NEAREST_AVERAGE_COUNT)];
    #[allow(clippy::cast_precision_loss)]
    let avg_distance_top3_km = if top.is_empty() {
        f64::INFINITY
    } else {
        top.iter().sum::<f64>() / top.len() as f64
    };

    #[allow(clippy::cast_precision_loss)]
    let density_per_km2 =
        within_density_radius as f64 / (PI * DENSITY_RADIUS_KM * DENSITY_RADIUS_KM);

    AccessibilityRecord {
        cell_id: cell.cell_id,
        center_lat: cell.center_lat,
        center_lng: cell.center_lng,
        services_within_walking,
        nearest_distance_km,
        avg_distance_top3_km,
        density_per_km2,
    }
}

/// Computes accessibility metrics for every cell.
///
/// `matrix.rows` must be in the same order as `cells`, as produced by
/// [`crate::matrix::build_distance_matrix`].
#[must_use]
pub fn analyze_accessibility(
    cells: &[GridCell],
    matrix: &DistanceMatrix,
    walking_distance_km: f64,
) -> Vec<AccessibilityRecord> {
    log::info!("Analyzing accessibility (walking distance: {walking_distance_km} km)");

    debug_assert_eq!(cells.len(), matrix.rows.len());

    let records: Vec<AccessibilityRecord> = cells
        .par_iter()
        .zip(matrix.rows.par_iter())
        .map(|(cell, row)| {
            debug_assert_eq!(cell.cell_id, row.cell_id);
            reduce_cell(cell, &row.distances_km, walking_distance_km)
        })
        .collect();

    log::info!("Accessibility analysis complete for {} cells", records.len());

    records
}
