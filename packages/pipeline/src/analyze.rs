//! Single region/category analysis run.

use std::path::PathBuf;
use std::sync::Arc;

use opportunity_map_accessibility::{
    ProgressCallback, analyze_accessibility, build_distance_matrix, classify_deserts, is_desert,
    score_supply, summarize_scores, top_opportunities,
};
use opportunity_map_accessibility_models::{DesertReport, OpportunityRecord, ScoreSummary};
use opportunity_map_boundary::{BoundaryProvider, resolve_boundary};
use opportunity_map_facility::FacilitySource;
use opportunity_map_facility_models::ArtifactVersion;
use opportunity_map_grid::build_grid;
use opportunity_map_grid::registry::find_region;
use opportunity_map_grid_models::RegionDefinition;

use crate::artifact::write_records;
use crate::{AnalysisConfig, DataPaths, PipelineError};

/// Number of cells listed in run summaries.
pub const TOP_CELLS: usize = 5;

/// Collaborators and parameters shared by every run in a session.
pub struct AnalysisContext<'a> {
    /// Data directory layout.
    pub paths: &'a DataPaths,
    /// Grid and walking parameters.
    pub config: AnalysisConfig,
    /// Facility snapshot provider.
    pub facilities: &'a dyn FacilitySource,
    /// Boundary provider; failures degrade to the rectangular grid.
    pub boundaries: &'a dyn BoundaryProvider,
}

/// Result of a completed analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub region: RegionDefinition,
    pub category: String,
    pub version: ArtifactVersion,
    /// Facilities after deduplication.
    pub facility_count: usize,
    /// Cells in the rectangle before boundary clipping.
    pub rectangular_cells: usize,
    /// Whether the grid was clipped to a boundary.
    pub clipped: bool,
    /// Supply-only opportunity records in grid order.
    pub records: Vec<OpportunityRecord>,
    pub deserts: DesertReport,
    pub summary: ScoreSummary,
    pub analysis_path: PathBuf,
    pub deserts_path: PathBuf,
}

impl AnalysisOutcome {
    /// The `n` highest-scoring cells.
    #[must_use]
    pub fn top_cells(&self, n: usize) -> Vec<&OpportunityRecord> {
        top_opportunities(&self.records, n)
    }
}

/// Runs a supply-only analysis of `category` in `region_id` against the
/// facility snapshot at `version`, writing the analysis and desert
/// artifacts.
///
/// # Errors
///
/// Returns [`PipelineError`] for an unknown region, invalid parameters,
/// a missing or unreadable facility snapshot, or an artifact write
/// failure. A missing boundary is not an error.
pub async fn analyze(
    ctx: &AnalysisContext<'_>,
    region_id: &str,
    category: &str,
    version: &ArtifactVersion,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<AnalysisOutcome, PipelineError> {
    ctx.config.validate()?;
    let region = find_region(region_id)?;

    log::info!(
        "Analyzing {category} in {} (version {version}, {} km grid, {} km walking)",
        region.name,
        ctx.config.grid_spacing_km,
        ctx.config.walking_distance_km
    );

    let boundary = resolve_boundary(ctx.boundaries, &region).await;
    let grid = build_grid(&region.bounds, ctx.config.grid_spacing_km, boundary.as_ref())?;

    let facilities = ctx.facilities.load(&region.id, category, version)?;
    if facilities.is_empty() {
        log::warn!("No {category} facilities in {}; every cell is unserved", region.id);
    } else {
        log::info!("Loaded {} {category} facilities", facilities.len());
    }

    progress.set_message(format!("Distances for {category}..."));
    let matrix = build_distance_matrix(&grid.cells, &facilities, progress);
    let accessibility = analyze_accessibility(&grid.cells, &matrix, ctx.config.walking_distance_km);
    drop(matrix);

    let deserts = classify_deserts(&accessibility);
    let records = score_supply(&accessibility);
    let summary = summarize_scores(&records);

    log::info!(
        "Opportunity scores: min {:.2}, max {:.2}, mean {:.2}",
        summary.min,
        summary.max,
        summary.mean
    );

    let analysis_path = ctx.paths.analysis_path(&region.id, category, version);
    let deserts_path = ctx.paths.deserts_path(&region.id, category, version);
    write_records(&analysis_path, &records)?;
    write_records(
        &deserts_path,
        records.iter().filter(|r| is_desert(&r.accessibility)),
    )?;

    Ok(AnalysisOutcome {
        region,
        category: category.to_string(),
        version: version.clone(),
        facility_count: facilities.len(),
        rectangular_cells: grid.rectangular_count,
        clipped: grid.clipped,
        records,
        deserts,
        summary,
        analysis_path,
        deserts_path,
    })
}
