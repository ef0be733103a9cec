#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line entry point for the opportunity map toolchain.
//!
//! Every operation is available as a subcommand; running without one
//! opens an interactive menu. Uses `indicatif-log-bridge` (via
//! [`opportunity_map_cli_utils::init_logger`]) so log lines and progress
//! bars never fight for the terminal.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use opportunity_map_accessibility::DEFAULT_WALKING_DISTANCE_KM;
use opportunity_map_grid_models::DEFAULT_GRID_SPACING_KM;
use opportunity_map_pipeline::{AnalysisConfig, DataPaths};

#[derive(Parser)]
#[command(
    name = "opportunity_map",
    about = "Grid-based service accessibility and opportunity analysis"
)]
struct Cli {
    /// Root of the data directory (raw/, processed/, boundaries/, population/)
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured regions
    Regions,
    /// List categories with a facility snapshot for a region
    Categories {
        /// Region identifier (e.g., "milan")
        region: String,
        /// Snapshot version (default: today, `YYYYMMDD`)
        #[arg(long)]
        version: Option<String>,
    },
    /// Analyze one category in a region
    Analyze {
        /// Region identifier (e.g., "milan")
        region: String,
        /// Facility category (e.g., "pharmacy")
        category: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Analyze every category with a snapshot and print a status table
    Batch {
        /// Region identifier (e.g., "milan")
        region: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Clip stored analysis artifacts to the region boundary
    Refilter {
        /// Region identifier (e.g., "milan")
        region: String,
        /// Only this category (default: every analyzed category)
        #[arg(long)]
        category: Option<String>,
        /// Artifact version (default: today, `YYYYMMDD`)
        #[arg(long)]
        version: Option<String>,
        /// Only use cached boundaries; never query Nominatim
        #[arg(long)]
        offline: bool,
    },
    /// Re-score stored analysis artifacts with population demand
    Enrich {
        /// Region identifier (e.g., "milan")
        region: String,
        /// Only this category (default: every analyzed category)
        #[arg(long)]
        category: Option<String>,
        /// Population GeoTIFF (default: first raster in population/)
        #[arg(long)]
        raster: Option<PathBuf>,
        /// Artifact version (default: today, `YYYYMMDD`)
        #[arg(long)]
        version: Option<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Facility snapshot and artifact version (default: today, `YYYYMMDD`)
    #[arg(long)]
    version: Option<String>,
    /// Grid spacing in km
    #[arg(long, default_value_t = DEFAULT_GRID_SPACING_KM)]
    spacing: f64,
    /// Walking distance threshold in km
    #[arg(long, default_value_t = DEFAULT_WALKING_DISTANCE_KM)]
    walking: f64,
    /// Only use cached boundaries; never query Nominatim
    #[arg(long)]
    offline: bool,
}

impl RunArgs {
    const fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            grid_spacing_km: self.spacing,
            walking_distance_km: self.walking,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = opportunity_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let paths = DataPaths::new(cli.data_dir);

    let Some(command) = cli.command else {
        return interactive::run(&multi, &paths).await;
    };

    match command {
        Commands::Regions => commands::list_regions(),
        Commands::Categories { region, version } => {
            let version = commands::parse_version(version.as_deref())?;
            commands::list_categories(&paths, &region, &version)?;
        }
        Commands::Analyze {
            region,
            category,
            run,
        } => {
            let version = commands::parse_version(run.version.as_deref())?;
            commands::run_analyze(
                &multi,
                &paths,
                run.config(),
                run.offline,
                &region,
                &category,
                &version,
            )
            .await?;
        }
        Commands::Batch { region, run } => {
            let version = commands::parse_version(run.version.as_deref())?;
            commands::run_batch(&multi, &paths, run.config(), run.offline, &region, &version)
                .await?;
        }
        Commands::Refilter {
            region,
            category,
            version,
            offline,
        } => {
            let version = commands::parse_version(version.as_deref())?;
            commands::run_refilter(&paths, offline, &region, category.as_deref(), &version)
                .await?;
        }
        Commands::Enrich {
            region,
            category,
            raster,
            version,
        } => {
            let version = commands::parse_version(version.as_deref())?;
            commands::run_enrich(
                &multi,
                &paths,
                &region,
                category.as_deref(),
                raster,
                &version,
            )?;
        }
    }

    Ok(())
}
