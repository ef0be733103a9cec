//! Runs every category with a facility snapshot for a region.
//!
//! [`ArtifactStatus`] is the per-category row of the passes over stored
//! artifacts ([`crate::refilter::refilter_all`], [`crate::enrich::enrich_all`]).

use std::sync::Arc;

use opportunity_map_accessibility::ProgressCallback;
use opportunity_map_facility_models::ArtifactVersion;
use opportunity_map_grid::registry::find_region;

use crate::analyze::{AnalysisContext, AnalysisOutcome, analyze};
use crate::PipelineError;

/// Per-category result of a batch run.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryOutcome {
    /// The analysis completed and its artifacts were written.
    Success {
        facilities: usize,
        cells: usize,
        deserts: usize,
        desert_percentage: f64,
        mean_score: f64,
        top_score: f64,
    },
    /// The analysis failed; other categories were unaffected.
    Failed {
        /// Rendered error.
        error: String,
    },
}

impl From<&AnalysisOutcome> for CategoryOutcome {
    fn from(outcome: &AnalysisOutcome) -> Self {
        Self::Success {
            facilities: outcome.facility_count,
            cells: outcome.records.len(),
            deserts: outcome.deserts.desert_count(),
            desert_percentage: outcome.deserts.percentage,
            mean_score: outcome.summary.mean,
            top_score: outcome.summary.max,
        }
    }
}

/// One row of the batch status table.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStatus {
    pub category: String,
    pub outcome: CategoryOutcome,
}

impl CategoryStatus {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, CategoryOutcome::Success { .. })
    }
}

/// Per-category result of a pass over stored analysis artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactStatus<T> {
    pub category: String,
    /// Operation result, or the rendered error of a failed category.
    pub result: Result<T, String>,
}

impl<T> ArtifactStatus<T> {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Analyzes every category that has a facility snapshot for `region_id`
/// at `version`, in alphabetical order.
///
/// `categories_progress` advances once per category and `cells_progress`
/// tracks the distance rows of the category in flight.
///
/// # Errors
///
/// Returns [`PipelineError`] only for problems that would affect every
/// category: invalid parameters, an unknown region, or an unreadable
/// snapshot directory. Failures of individual categories are recorded in
/// their [`CategoryStatus`] instead.
pub async fn analyze_all(
    ctx: &AnalysisContext<'_>,
    region_id: &str,
    version: &ArtifactVersion,
    categories_progress: &Arc<dyn ProgressCallback>,
    cells_progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<CategoryStatus>, PipelineError> {
    ctx.config.validate()?;
    let region = find_region(region_id)?;

    let categories = ctx.facilities.categories(&region.id, version)?;
    if categories.is_empty() {
        log::warn!(
            "No facility snapshots for {} at version {version}",
            region.id
        );
        return Ok(Vec::new());
    }

    log::info!(
        "Batch analysis of {} categories in {}: {}",
        categories.len(),
        region.name,
        categories.join(", ")
    );

    categories_progress.set_total(categories.len() as u64);
    categories_progress.set_position(0);

    let mut statuses = Vec::with_capacity(categories.len());
    for category in categories {
        categories_progress.set_message(category.clone());

        let outcome = match analyze(ctx, &region.id, &category, version, cells_progress).await {
            Ok(outcome) => CategoryOutcome::from(&outcome),
            Err(e) => {
                log::error!("Analysis of {category} failed: {e}");
                CategoryOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        statuses.push(CategoryStatus { category, outcome });
        categories_progress.inc(1);
    }

    let succeeded = statuses.iter().filter(|s| s.is_success()).count();
    categories_progress.finish(format!(
        "{succeeded}/{} categories analyzed",
        statuses.len()
    ));

    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use opportunity_map_accessibility::null_progress;
    use opportunity_map_boundary::CachedBoundaryProvider;
    use opportunity_map_facility::CsvFacilityStore;

    use super::*;
    use crate::analyze::tests::{coarse_config, temp_root, write_snapshot};
    use crate::DataPaths;

    #[tokio::test]
    async fn isolates_failing_categories() {
        let root = temp_root("batch");
        let paths = DataPaths::new(&root);
        write_snapshot(
            &paths,
            "milan_pharmacy_20250114.csv",
            &[("p1", 45.4642, 9.19)],
        );
        write_snapshot(&paths, "milan_bakery_20250114.csv", &[]);
        std::fs::write(
            paths.raw_dir().join("milan_gym_20250114.csv"),
            "place_id,name,lat\ng1,Gym,45.46\n",
        )
        .unwrap();
        write_snapshot(&paths, "milan_cafe_20240101.csv", &[("c1", 45.46, 9.19)]);

        let store = CsvFacilityStore::new(paths.raw_dir());
        let boundaries = CachedBoundaryProvider::offline(paths.boundaries_dir());
        let ctx = AnalysisContext {
            paths: &paths,
            config: coarse_config(),
            facilities: &store,
            boundaries: &boundaries,
        };
        let version: ArtifactVersion = "20250114".parse().unwrap();

        let statuses = analyze_all(&ctx, "milan", &version, &null_progress(), &null_progress())
            .await
            .unwrap();

        let names: Vec<&str> = statuses.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["bakery", "gym", "pharmacy"]);

        assert!(matches!(
            statuses[0].outcome,
            CategoryOutcome::Success { facilities: 0, .. }
        ));
        assert!(matches!(statuses[1].outcome, CategoryOutcome::Failed { .. }));
        assert!(matches!(
            statuses[2].outcome,
            CategoryOutcome::Success { facilities: 1, .. }
        ));

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn unknown_region_aborts_before_any_category() {
        let root = temp_root("batch_unknown");
        let paths = DataPaths::new(&root);
        let store = CsvFacilityStore::new(paths.raw_dir());
        let boundaries = CachedBoundaryProvider::offline(paths.boundaries_dir());
        let ctx = AnalysisContext {
            paths: &paths,
            config: coarse_config(),
            facilities: &store,
            boundaries: &boundaries,
        };
        let version: ArtifactVersion = "20250114".parse().unwrap();

        let result =
            analyze_all(&ctx, "atlantis", &version, &null_progress(), &null_progress()).await;
        assert!(result.unwrap_err().is_configuration());

        std::fs::remove_dir_all(root).ok();
    }
}
