//! Post-hoc clipping of stored analysis artifacts to a region boundary.
//!
//! Useful when an analysis ran before a boundary was available and fell
//! back to the full rectangle. Scores are not recomputed; cells outside
//! the boundary are simply dropped.

use std::path::PathBuf;

use opportunity_map_accessibility_models::OpportunityRecord;
use opportunity_map_boundary::BoundaryProvider;
use opportunity_map_facility_models::ArtifactVersion;
use opportunity_map_grid::registry::find_region;
use opportunity_map_spatial::Boundary;

use crate::artifact::{read_records, write_records};
use crate::batch::ArtifactStatus;
use crate::{DataPaths, PipelineError};

/// Result of re-filtering one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefilterOutcome {
    pub category: String,
    /// Rows in the source artifact.
    pub original: usize,
    /// Rows inside the boundary.
    pub kept: usize,
    pub source_path: PathBuf,
    pub path: PathBuf,
}

impl RefilterOutcome {
    #[must_use]
    pub const fn removed(&self) -> usize {
        self.original - self.kept
    }

    /// Share of removed rows in percent; 0 for an empty artifact.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn removed_percentage(&self) -> f64 {
        if self.original == 0 {
            return 0.0;
        }
        self.removed() as f64 / self.original as f64 * 100.0
    }
}

/// Keeps the records whose cell center lies inside `boundary`.
#[must_use]
pub fn filter_records(records: Vec<OpportunityRecord>, boundary: &Boundary) -> Vec<OpportunityRecord> {
    boundary.retain(records, OpportunityRecord::center)
}

/// Clips the stored analysis of `category` in `region_id` at `version` to
/// the region boundary and writes the `_analysis_filtered_` artifact.
///
/// Always reads the unfiltered artifact, so repeated runs produce the
/// same output.
///
/// # Errors
///
/// Returns [`PipelineError`] if the region is unknown, the boundary is
/// unavailable, or an artifact cannot be read or written.
pub async fn refilter(
    paths: &DataPaths,
    boundaries: &dyn BoundaryProvider,
    region_id: &str,
    category: &str,
    version: &ArtifactVersion,
) -> Result<RefilterOutcome, PipelineError> {
    let region = find_region(region_id)?;
    let boundary = boundaries.boundary(&region).await?;
    clip_artifact(paths, &region.id, &boundary, category, version)
}

/// Clips every analyzed category of `region_id` at `version`, in
/// alphabetical order.
///
/// # Errors
///
/// Returns [`PipelineError`] only for problems shared by every category:
/// an unknown region, an unavailable boundary, or an unreadable artifact
/// directory. Failures of individual categories are recorded in their
/// [`ArtifactStatus`] instead.
pub async fn refilter_all(
    paths: &DataPaths,
    boundaries: &dyn BoundaryProvider,
    region_id: &str,
    version: &ArtifactVersion,
) -> Result<Vec<ArtifactStatus<RefilterOutcome>>, PipelineError> {
    let region = find_region(region_id)?;
    let categories = paths.analyzed_categories(&region.id, version)?;
    if categories.is_empty() {
        return Ok(Vec::new());
    }

    let boundary = boundaries.boundary(&region).await?;

    Ok(categories
        .into_iter()
        .map(|category| {
            let result = clip_artifact(paths, &region.id, &boundary, &category, version)
                .map_err(|e| {
                    log::error!("Re-filter of {category} failed: {e}");
                    e.to_string()
                });
            ArtifactStatus { category, result }
        })
        .collect())
}

fn clip_artifact(
    paths: &DataPaths,
    region: &str,
    boundary: &Boundary,
    category: &str,
    version: &ArtifactVersion,
) -> Result<RefilterOutcome, PipelineError> {
    let source_path = paths.analysis_path(region, category, version);
    let records = read_records(&source_path)?;
    let original = records.len();

    let kept = filter_records(records, boundary);
    let path = paths.filtered_path(region, category, version);
    write_records(&path, &kept)?;

    let outcome = RefilterOutcome {
        category: category.to_string(),
        original,
        kept: kept.len(),
        source_path,
        path,
    };

    log::info!(
        "{category}: kept {}/{original} cells, removed {} ({:.1}%)",
        outcome.kept,
        outcome.removed(),
        outcome.removed_percentage()
    );

    Ok(outcome)
}
