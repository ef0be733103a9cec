//! Demand-weighted re-scoring of stored analysis artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use opportunity_map_accessibility::scoring::POPULATION_FLOOR;
use opportunity_map_accessibility::{ProgressCallback, score_demand, summarize_scores};
use opportunity_map_accessibility_models::OpportunityRecord;
use opportunity_map_facility_models::ArtifactVersion;
use opportunity_map_grid::registry::find_region;
use opportunity_map_grid_models::CellId;
use opportunity_map_population::{GridRaster, PopulationRaster, estimate_populations, read_geotiff};

use crate::artifact::{read_records, write_records};
use crate::batch::ArtifactStatus;
use crate::{DataPaths, PipelineError};

/// Summary of an enrichment run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentStats {
    pub category: String,
    /// Artifact that was enriched.
    pub source_path: PathBuf,
    /// Enriched artifact written next to it.
    pub path: PathBuf,
    pub cells: usize,
    /// Sum of the center estimates of all cells.
    pub total_population: f64,
    /// Mean population within 1 km per cell.
    pub mean_population_1km: f64,
    /// Cells with anyone living within 1 km.
    pub populated_cells: usize,
    pub empty_cells: usize,
    pub original_mean_score: f64,
    pub new_mean_score: f64,
    /// Cells forced to zero by the population floor.
    pub zeroed_cells: usize,
}

/// Loads the population raster at `path`, cropped to the bounds of
/// `region_id`.
///
/// # Errors
///
/// Returns [`PipelineError`] if the region is unknown or the raster cannot
/// be read or does not cover the region. Both are configuration errors.
pub fn load_population_raster(path: &Path, region_id: &str) -> Result<GridRaster, PipelineError> {
    let region = find_region(region_id)?;
    let raster = read_geotiff(path, Some(&region.bounds))?;
    log::info!(
        "Population raster for {}: {}x{} px",
        region.id,
        raster.width(),
        raster.height()
    );
    Ok(raster)
}

/// Re-scores the stored analysis of `category` in `region_id` at
/// `version` with population demand and writes the `_enriched` artifact.
///
/// The boundary-filtered artifact is used when one exists for the same
/// version, otherwise the unfiltered one.
///
/// # Errors
///
/// Returns [`PipelineError`] if the region is unknown, no analysis
/// artifact exists, or an artifact cannot be read or written.
pub fn enrich(
    paths: &DataPaths,
    region_id: &str,
    category: &str,
    version: &ArtifactVersion,
    raster: &dyn PopulationRaster,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<EnrichmentStats, PipelineError> {
    let region = find_region(region_id)?;

    let filtered = paths.filtered_path(&region.id, category, version);
    let source_path = if filtered.exists() {
        filtered
    } else {
        paths.analysis_path(&region.id, category, version)
    };

    log::info!("Enriching {}", source_path.display());
    let records = read_records(&source_path)?;

    let centers: Vec<(CellId, (f64, f64))> = records
        .iter()
        .map(|r| (r.cell_id(), r.center()))
        .collect();
    let populations = estimate_populations(&centers, raster, progress);
    let enriched = score_demand(&records, &populations);

    let path = DataPaths::enriched_path(&source_path);
    write_records(&path, &enriched)?;

    let stats = summarize(category, source_path, path, &records, &enriched);
    log::info!(
        "{category}: population {:.0}, {}/{} cells populated, mean score {:.2} -> {:.2}, {} zeroed",
        stats.total_population,
        stats.populated_cells,
        stats.cells,
        stats.original_mean_score,
        stats.new_mean_score,
        stats.zeroed_cells
    );

    Ok(stats)
}

/// Enriches every analyzed category of `region_id` at `version`, in
/// alphabetical order.
///
/// `categories_progress` advances once per category and `cells_progress`
/// tracks the cells of the category in flight.
///
/// # Errors
///
/// Returns [`PipelineError`] if the region is unknown or the artifact
/// directory cannot be read. Failures of individual categories are
/// recorded in their [`ArtifactStatus`] instead.
pub fn enrich_all(
    paths: &DataPaths,
    region_id: &str,
    version: &ArtifactVersion,
    raster: &dyn PopulationRaster,
    categories_progress: &Arc<dyn ProgressCallback>,
    cells_progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<ArtifactStatus<EnrichmentStats>>, PipelineError> {
    let region = find_region(region_id)?;
    let categories = paths.analyzed_categories(&region.id, version)?;
    if categories.is_empty() {
        return Ok(Vec::new());
    }

    categories_progress.set_total(categories.len() as u64);
    categories_progress.set_position(0);

    let mut statuses = Vec::with_capacity(categories.len());
    for category in categories {
        categories_progress.set_message(category.clone());

        let result = enrich(paths, &region.id, &category, version, raster, cells_progress)
            .map_err(|e| {
                log::error!("Enrichment of {category} failed: {e}");
                e.to_string()
            });

        statuses.push(ArtifactStatus { category, result });
        categories_progress.inc(1);
    }

    let succeeded = statuses.iter().filter(|s| s.is_success()).count();
    categories_progress.finish(format!(
        "{succeeded}/{} categories enriched",
        statuses.len()
    ));

    Ok(statuses)
}

#[allow(clippy::cast_precision_loss)]
fn summarize(
    category: &str,
    source_path: PathBuf,
    path: PathBuf,
    original: &[OpportunityRecord],
    enriched: &[OpportunityRecord],
) -> EnrichmentStats {
    let demands: Vec<_> = enriched.iter().filter_map(OpportunityRecord::demand).collect();

    let total_population: f64 = demands.iter().map(|d| d.population).sum();
    let sum_1km: f64 = demands.iter().map(|d| d.population_1km).sum();
    let populated_cells = demands.iter().filter(|d| d.population_1km > 0.0).count();
    let zeroed_cells = demands
        .iter()
        .filter(|d| d.population_1km < POPULATION_FLOOR)
        .count();

    let original_mean = if original.is_empty() {
        0.0
    } else {
        original
            .iter()
            .map(OpportunityRecord::supply_only_score)
            .sum::<f64>()
            / original.len() as f64
    };

    EnrichmentStats {
        category: category.to_string(),
        source_path,
        path,
        cells: enriched.len(),
        total_population,
        mean_population_1km: if demands.is_empty() {
            0.0
        } else {
            sum_1km / demands.len() as f64
        },
        populated_cells,
        empty_cells: enriched.len() - populated_cells,
        original_mean_score: original_mean,
        new_mean_score: summarize_scores(enriched).mean,
        zeroed_cells,
    }
}

#[cfg(test)]
mod tests {
    use opportunity_map_accessibility::null_progress;
    use opportunity_map_accessibility_models::{
        AccessibilityRecord, ScoreBasis, ScoringPolicy, SupplyScores,
    };

    use super::*;
    use crate::analyze::tests::temp_root;

    struct DenseWest;

    impl PopulationRaster for DenseWest {
        fn sample(&self, _lat: f64, lng: f64) -> f64 {
            if lng < 9.2 { 400.0 } else { 0.0 }
        }
    }

    fn record(cell_id: usize, lat: f64, lng: f64, score: f64) -> OpportunityRecord {
        OpportunityRecord {
            accessibility: AccessibilityRecord {
                cell_id,
                center_lat: lat,
                center_lng: lng,
                services_within_walking: 0,
                nearest_distance_km: 2.5,
                avg_distance_top3_km: 2.8,
                density_per_km2: 0.0,
            },
            scores: SupplyScores {
                competition_gap: 1.0,
                accessibility_gap: 2.5 / 3.0,
                viability: 0.5,
            },
            opportunity_score: score,
            basis: ScoreBasis::SupplyOnly,
        }
    }

    fn write_analysis(paths: &DataPaths, version: &ArtifactVersion) {
        write_records(
            &paths.analysis_path("milan", "bakery", version),
            &[
                record(0, 45.46, 9.10, 8.3),
                record(1, 45.46, 9.30, 8.3),
            ],
        )
        .unwrap();
    }

    #[test]
    fn rescored_artifact_keeps_original_scores() {
        let root = temp_root("enrich");
        let paths = DataPaths::new(&root);
        let version: ArtifactVersion = "20250114".parse().unwrap();
        write_analysis(&paths, &version);

        let stats = enrich(&paths, "milan", "bakery", &version, &DenseWest, &null_progress())
            .unwrap();

        assert_eq!(stats.cells, 2);
        assert_eq!(stats.populated_cells, 1);
        assert_eq!(stats.empty_cells, 1);
        assert_eq!(stats.zeroed_cells, 1);
        assert!((stats.total_population - 400.0).abs() < f64::EPSILON);
        assert!((stats.original_mean_score - 8.3).abs() < 1e-9);
        assert!(stats.path.ends_with("milan_bakery_analysis_20250114_enriched.csv"));

        let enriched = read_records(&stats.path).unwrap();
        assert!(enriched.iter().all(|r| r.policy() == ScoringPolicy::DemandWeighted));
        assert!(enriched[1].opportunity_score.abs() < f64::EPSILON);
        assert!((enriched[1].supply_only_score() - 8.3).abs() < 1e-9);
        assert!(enriched[0].opportunity_score > 0.0);

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn prefers_filtered_artifact() {
        let root = temp_root("enrich_filtered");
        let paths = DataPaths::new(&root);
        let version: ArtifactVersion = "20250114".parse().unwrap();
        write_analysis(&paths, &version);
        write_records(
            &paths.filtered_path("milan", "bakery", &version),
            &[record(0, 45.46, 9.10, 8.3)],
        )
        .unwrap();

        let stats = enrich(&paths, "milan", "bakery", &version, &DenseWest, &null_progress())
            .unwrap();

        assert_eq!(stats.cells, 1);
        assert_eq!(stats.source_path, paths.filtered_path("milan", "bakery", &version));
        assert!(
            stats
                .path
                .ends_with("milan_bakery_analysis_filtered_20250114_enriched.csv")
        );

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn missing_artifact_is_reported() {
        let root = temp_root("enrich_missing");
        let paths = DataPaths::new(&root);
        let version: ArtifactVersion = "20250114".parse().unwrap();

        let err = enrich(&paths, "milan", "bakery", &version, &DenseWest, &null_progress())
            .unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactNotFound { .. }));

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn unreadable_raster_is_configuration_error() {
        let err = load_population_raster(Path::new("/nonexistent/pop.tif"), "milan").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn corrupt_artifact_does_not_stop_other_categories() {
        let root = temp_root("enrich_all");
        let paths = DataPaths::new(&root);
        let version: ArtifactVersion = "20250114".parse().unwrap();
        write_analysis(&paths, &version);
        std::fs::write(
            paths.analysis_path("milan", "atm", &version),
            "cell_id,center_lat\nnot-a-cell,45.46\n",
        )
        .unwrap();

        let statuses = enrich_all(
            &paths,
            "milan",
            &version,
            &DenseWest,
            &null_progress(),
            &null_progress(),
        )
        .unwrap();

        let names: Vec<&str> = statuses.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["atm", "bakery"]);
        assert!(!statuses[0].is_success());
        assert_eq!(statuses[1].result.as_ref().map(|s| s.cells), Ok(2));
        assert!(
            paths
                .processed_dir()
                .join("milan_bakery_analysis_20250114_enriched.csv")
                .exists()
        );

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn no_artifacts_yields_no_statuses() {
        let root = temp_root("enrich_all_empty");
        let paths = DataPaths::new(&root);
        let version: ArtifactVersion = "20250114".parse().unwrap();

        let statuses = enrich_all(
            &paths,
            "milan",
            &version,
            &DenseWest,
            &null_progress(),
            &null_progress(),
        )
        .unwrap();
        assert!(statuses.is_empty());

        std::fs::remove_dir_all(root).ok();
    }
}
