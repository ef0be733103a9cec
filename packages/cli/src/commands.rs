//! Operations shared by the subcommands and the interactive menu.

use std::path::PathBuf;

use opportunity_map_boundary::{BoundaryError, CachedBoundaryProvider, NominatimBoundaryFetcher};
use opportunity_map_cli_utils::{IndicatifProgress, MultiProgress};
use opportunity_map_facility::{CsvFacilityStore, FacilitySource};
use opportunity_map_facility_models::ArtifactVersion;
use opportunity_map_grid::registry::{all_regions, find_region};
use opportunity_map_pipeline::report::{
    render_enrichment, render_enrichment_table, render_outcome, render_refilter_table,
    render_status_table,
};
use opportunity_map_pipeline::{
    AnalysisConfig, AnalysisContext, ArtifactStatus, DataPaths, PipelineError, analyze,
    analyze_all, enrich, enrich_all, load_population_raster, refilter, refilter_all,
};

/// Today's date as an artifact version (`YYYYMMDD`).
pub fn today_version() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

/// Parses `version`, defaulting to today's date.
pub fn parse_version(version: Option<&str>) -> Result<ArtifactVersion, Box<dyn std::error::Error>> {
    let raw = version.map_or_else(today_version, str::to_string);
    Ok(raw.parse()?)
}

/// Boundary cache under the data directory, with Nominatim as the
/// fallback unless `offline`.
pub fn boundary_provider(
    paths: &DataPaths,
    offline: bool,
) -> Result<CachedBoundaryProvider, BoundaryError> {
    if offline {
        return Ok(CachedBoundaryProvider::offline(paths.boundaries_dir()));
    }
    Ok(CachedBoundaryProvider::with_fetcher(
        paths.boundaries_dir(),
        NominatimBoundaryFetcher::new()?,
    ))
}

pub fn list_regions() {
    println!(
        "{:<12} {:<12} {:>9} {:>9} {:>9} {:>9}",
        "ID", "NAME", "NORTH", "SOUTH", "EAST", "WEST"
    );
    println!("{}", "-".repeat(66));
    for region in all_regions() {
        let b = region.bounds;
        println!(
            "{:<12} {:<12} {:>9.4} {:>9.4} {:>9.4} {:>9.4}",
            region.id, region.name, b.north, b.south, b.east, b.west
        );
    }
}

/// Categories with a facility snapshot for `region_id` at `version`.
pub fn categories(
    paths: &DataPaths,
    region_id: &str,
    version: &ArtifactVersion,
) -> Result<Vec<String>, PipelineError> {
    let region = find_region(region_id)?;
    let store = CsvFacilityStore::new(paths.raw_dir());
    Ok(store.categories(&region.id, version)?)
}

pub fn list_categories(
    paths: &DataPaths,
    region_id: &str,
    version: &ArtifactVersion,
) -> Result<(), Box<dyn std::error::Error>> {
    let categories = categories(paths, region_id, version)?;
    if categories.is_empty() {
        println!(
            "No facility snapshots for {region_id} at version {version} in {}",
            paths.raw_dir().display()
        );
        return Ok(());
    }
    for category in categories {
        println!("{category}");
    }
    Ok(())
}

pub async fn run_analyze(
    multi: &MultiProgress,
    paths: &DataPaths,
    config: AnalysisConfig,
    offline: bool,
    region_id: &str,
    category: &str,
    version: &ArtifactVersion,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = CsvFacilityStore::new(paths.raw_dir());
    let boundaries = boundary_provider(paths, offline)?;
    let ctx = AnalysisContext {
        paths,
        config,
        facilities: &store,
        boundaries: &boundaries,
    };

    let progress = IndicatifProgress::cells_bar(multi, "Computing distances...");
    let outcome = analyze(&ctx, region_id, category, version, &progress).await?;
    progress.finish_and_clear();

    println!();
    println!("{}", render_outcome(&outcome));
    Ok(())
}

pub async fn run_batch(
    multi: &MultiProgress,
    paths: &DataPaths,
    config: AnalysisConfig,
    offline: bool,
    region_id: &str,
    version: &ArtifactVersion,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = CsvFacilityStore::new(paths.raw_dir());
    let boundaries = boundary_provider(paths, offline)?;
    let ctx = AnalysisContext {
        paths,
        config,
        facilities: &store,
        boundaries: &boundaries,
    };

    let categories_bar = IndicatifProgress::steps_bar(multi, "Categories");
    let cells_bar = IndicatifProgress::cells_bar(multi, "Computing distances...");
    let statuses = analyze_all(&ctx, region_id, version, &categories_bar, &cells_bar).await?;
    cells_bar.finish_and_clear();

    println!();
    println!("{}", render_status_table(&statuses));
    Ok(())
}

/// Clips one category, or every analyzed category when `category` is
/// `None`, and prints a status table.
pub async fn run_refilter(
    paths: &DataPaths,
    offline: bool,
    region_id: &str,
    category: Option<&str>,
    version: &ArtifactVersion,
) -> Result<(), Box<dyn std::error::Error>> {
    let boundaries = boundary_provider(paths, offline)?;

    let statuses = match category {
        Some(category) => {
            let outcome = refilter(paths, &boundaries, region_id, category, version).await?;
            vec![ArtifactStatus {
                category: category.to_string(),
                result: Ok(outcome),
            }]
        }
        None => refilter_all(paths, &boundaries, region_id, version).await?,
    };

    if statuses.is_empty() {
        log::warn!("No analysis artifacts for {region_id} at version {version}");
        return Ok(());
    }

    println!();
    println!("{}", render_refilter_table(&statuses));
    Ok(())
}

/// Enriches one category in detail, or every analyzed category with a
/// status table when `category` is `None`.
pub fn run_enrich(
    multi: &MultiProgress,
    paths: &DataPaths,
    region_id: &str,
    category: Option<&str>,
    raster: Option<PathBuf>,
    version: &ArtifactVersion,
) -> Result<(), Box<dyn std::error::Error>> {
    let raster_path = match raster {
        Some(path) => path,
        None => paths
            .population_rasters()?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Config {
                message: format!(
                    "no population raster given and none found in {}",
                    paths.population_dir().display()
                ),
            })?,
    };
    let raster = load_population_raster(&raster_path, region_id)?;

    if let Some(category) = category {
        let progress = IndicatifProgress::cells_bar(multi, "Sampling population...");
        let stats = enrich(paths, region_id, category, version, &raster, &progress)?;
        progress.finish_and_clear();

        println!();
        println!("{}", render_enrichment(&stats));
        return Ok(());
    }

    let categories_bar = IndicatifProgress::steps_bar(multi, "Categories");
    let cells_bar = IndicatifProgress::cells_bar(multi, "Sampling population...");
    let statuses = enrich_all(paths, region_id, version, &raster, &categories_bar, &cells_bar)?;
    cells_bar.finish_and_clear();

    if statuses.is_empty() {
        log::warn!("No analysis artifacts for {region_id} at version {version}");
        return Ok(());
    }

    println!();
    println!("{}", render_enrichment_table(&statuses));
    Ok(())
}
