//! Dense cell × facility geodesic distances.
//!
//! This is the dominant cost of an analysis run (`cells × facilities`
//! geodesic evaluations). Rows are independent and computed on the rayon
//! pool; each row lands in its own slot so the output order is the grid
//! order regardless of scheduling.

use std::sync::Arc;

use opportunity_map_accessibility_models::{DistanceMatrix, DistanceRow};
use opportunity_map_facility_models::Facility;
use opportunity_map_grid_models::GridCell;
use opportunity_map_spatial::distance_km;
use rayon::prelude::*;

use crate::progress::ProgressCallback;

/// Computes the distance from every cell to every facility.
///
/// Within a row, facilities are enumerated in input order. `progress`
/// advances by one per completed row.
#[must_use]
pub fn build_distance_matrix(
    cells: &[GridCell],
    facilities: &[Facility],
    progress: &Arc<dyn ProgressCallback>,
) -> DistanceMatrix {
    log::info!(
        "Calculating distances: {} cells x {} facilities = {} pairs",
        cells.len(),
        facilities.len(),
        cells.len() * facilities.len()
    );

    progress.set_message("Calculating distances...".to_string());
    progress.set_total(cells.len() as u64);
    progress.set_position(0);

    let rows: Vec<DistanceRow> = cells
        .par_iter()
        .map(|cell| {
            let distances_km = facilities
                .iter()
                .map(|f| distance_km(cell.center_lat, cell.center_lng, f.lat, f.lng))
                .collect();
            progress.inc(1);
            DistanceRow {
                cell_id: cell.cell_id,
                distances_km,
            }
        })
        .collect();

    progress.finish(format!("Calculated distances for {} cells", cells.len()));

    DistanceMatrix {
        facility_ids: facilities.iter().map(|f| f.id.clone()).collect(),
        rows,
    }
}
