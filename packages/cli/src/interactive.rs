//! Menu-driven interface for running operations without memorizing flags.

use dialoguer::{Confirm, Input, Select};
use opportunity_map_cli_utils::MultiProgress;
use opportunity_map_facility_models::ArtifactVersion;
use opportunity_map_grid::registry::all_regions;
use opportunity_map_pipeline::{AnalysisConfig, DataPaths};

use crate::commands;

/// Top-level actions available in the interactive menu.
enum Action {
    Analyze,
    Batch,
    Refilter,
    Enrich,
    ListRegions,
    ListCategories,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Analyze,
        Self::Batch,
        Self::Refilter,
        Self::Enrich,
        Self::ListRegions,
        Self::ListCategories,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Analyze => "Analyze a category",
            Self::Batch => "Analyze all categories",
            Self::Refilter => "Clip stored results to boundary",
            Self::Enrich => "Enrich stored results with population",
            Self::ListRegions => "List regions",
            Self::ListCategories => "List categories",
        }
    }
}

/// Prompts for an action and its parameters, then runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub async fn run(multi: &MultiProgress, paths: &DataPaths) -> Result<(), Box<dyn std::error::Error>> {
    println!("Opportunity Map");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let action = &Action::ALL[idx];
    if matches!(action, Action::ListRegions) {
        commands::list_regions();
        return Ok(());
    }

    let region = select_region()?;
    let version = prompt_version()?;

    match action {
        Action::Analyze => {
            let category = select_category(paths, &region, &version)?;
            let config = prompt_config()?;
            let offline = prompt_offline()?;
            commands::run_analyze(multi, paths, config, offline, &region, &category, &version)
                .await?;
        }
        Action::Batch => {
            let config = prompt_config()?;
            let offline = prompt_offline()?;
            commands::run_batch(multi, paths, config, offline, &region, &version).await?;
        }
        Action::Refilter => {
            let offline = prompt_offline()?;
            commands::run_refilter(paths, offline, &region, None, &version).await?;
        }
        Action::Enrich => {
            commands::run_enrich(multi, paths, &region, None, None, &version)?;
        }
        Action::ListCategories => commands::list_categories(paths, &region, &version)?,
        Action::ListRegions => {}
    }

    Ok(())
}

fn select_region() -> Result<String, Box<dyn std::error::Error>> {
    let regions = all_regions();
    let labels: Vec<String> = regions
        .iter()
        .map(|r| format!("{} ({})", r.name, r.id))
        .collect();

    let idx = Select::new()
        .with_prompt("Region")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(regions[idx].id.clone())
}

fn prompt_version() -> Result<ArtifactVersion, Box<dyn std::error::Error>> {
    let raw: String = Input::new()
        .with_prompt("Version")
        .default(commands::today_version())
        .interact_text()?;
    commands::parse_version(Some(&raw))
}

fn select_category(
    paths: &DataPaths,
    region: &str,
    version: &ArtifactVersion,
) -> Result<String, Box<dyn std::error::Error>> {
    let categories = commands::categories(paths, region, version)?;

    if categories.is_empty() {
        println!("No facility snapshots found for {region} at version {version}.");
        let category: String = Input::new().with_prompt("Category").interact_text()?;
        return Ok(category.trim().to_string());
    }

    let idx = Select::new()
        .with_prompt("Category")
        .items(&categories)
        .default(0)
        .interact()?;

    Ok(categories[idx].clone())
}

fn prompt_config() -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let defaults = AnalysisConfig::default();

    let grid_spacing_km: f64 = Input::new()
        .with_prompt("Grid spacing (km)")
        .default(defaults.grid_spacing_km)
        .interact_text()?;
    let walking_distance_km: f64 = Input::new()
        .with_prompt("Walking distance (km)")
        .default(defaults.walking_distance_km)
        .interact_text()?;

    Ok(AnalysisConfig {
        grid_spacing_km,
        walking_distance_km,
    })
}

fn prompt_offline() -> Result<bool, Box<dyn std::error::Error>> {
    let fetch = Confirm::new()
        .with_prompt("Fetch missing boundaries from Nominatim?")
        .default(true)
        .interact()?;
    Ok(!fetch)
}
