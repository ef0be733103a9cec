//! Population within walking range of each grid cell.
//!
//! Every cell center is sampled once, then each cell sums the samples of
//! all cells within [`POPULATION_RADIUS_KM`] (itself included). Neighbors
//! come from an R-tree over cell centers so the aggregation is roughly
//! linear in the number of cells.

use std::sync::Arc;

use opportunity_map_accessibility::ProgressCallback;
use opportunity_map_accessibility_models::CellPopulation;
use opportunity_map_grid_models::CellId;
use opportunity_map_spatial::PointIndex;
use rayon::prelude::*;

use crate::raster::PopulationRaster;

/// Radius over which population is aggregated, in kilometers.
pub const POPULATION_RADIUS_KM: f64 = 1.0;

/// Estimates point and 1 km population for each `(cell_id, (lat, lng))`.
///
/// Output order matches `centers`.
#[must_use]
pub fn estimate_populations(
    centers: &[(CellId, (f64, f64))],
    raster: &dyn PopulationRaster,
    progress: &Arc<dyn ProgressCallback>,
) -> Vec<CellPopulation> {
    log::info!("Sampling population at {} cell centers", centers.len());

    let points: Vec<(f64, f64)> = centers.iter().map(|&(_, point)| point).collect();
    let samples: Vec<f64> = points
        .par_iter()
        .map(|&(lat, lng)| raster.sample(lat, lng))
        .collect();

    log::info!("Aggregating population within {POPULATION_RADIUS_KM} km");

    let index = PointIndex::new(&points);

    progress.set_message("Aggregating population...".to_string());
    progress.set_total(centers.len() as u64);
    progress.set_position(0);

    let populations: Vec<CellPopulation> = centers
        .par_iter()
        .zip(samples.par_iter())
        .map(|(&(cell_id, (lat, lng)), &population)| {
            let population_1km: f64 = index
                .within_km(lat, lng, POPULATION_RADIUS_KM)
                .into_iter()
                .map(|idx| samples[idx])
                .sum();
            progress.inc(1);
            CellPopulation {
                cell_id,
                population,
                population_1km,
            }
        })
        .collect();

    progress.finish(format!("Population estimated for {} cells", centers.len()));

    let populated = populations.iter().filter(|p| p.population_1km > 0.0).count();
    log::info!(
        "Population within {POPULATION_RADIUS_KM} km: {populated}/{} cells populated",
        populations.len()
    );

    populations
}
