#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis runs over stored data.
//!
//! Ties the engine crates together into the operations the CLI exposes:
//!
//! - [`analyze::analyze`] runs one region/category/version end to end and
//!   writes the analysis and desert artifacts.
//! - [`batch::analyze_all`] runs every category with a facility snapshot,
//!   isolating per-category failures.
//! - [`refilter::refilter`] clips a stored analysis artifact to a boundary;
//!   [`refilter::refilter_all`] does so for every analyzed category.
//! - [`enrich::enrich`] re-scores a stored artifact with population demand;
//!   [`enrich::enrich_all`] does so for every analyzed category.
//!
//! All artifacts live under a [`DataPaths`] root and are addressed by an
//! explicit [`ArtifactVersion`].

pub mod analyze;
pub mod artifact;
pub mod batch;
pub mod config;
pub mod enrich;
pub mod refilter;
pub mod report;

pub use analyze::{AnalysisContext, AnalysisOutcome, analyze};
pub use batch::{ArtifactStatus, CategoryOutcome, CategoryStatus, analyze_all};
pub use config::{AnalysisConfig, DataPaths};
pub use enrich::{EnrichmentStats, enrich, enrich_all, load_population_raster};
use opportunity_map_boundary::BoundaryError;
use opportunity_map_facility::FacilityError;
pub use opportunity_map_facility_models::ArtifactVersion;
use opportunity_map_grid::GridError;
use opportunity_map_population::PopulationError;
pub use refilter::{RefilterOutcome, filter_records, refilter, refilter_all};

/// Errors that can occur during a pipeline operation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Region lookup or grid construction failed.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Facility snapshot could not be loaded.
    #[error(transparent)]
    Facility(#[from] FacilityError),

    /// Boundary could not be obtained where one is required.
    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    /// Population raster could not be loaded.
    #[error(transparent)]
    Population(#[from] PopulationError),

    /// Invalid analysis parameters.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored artifact the operation depends on does not exist.
    #[error("Artifact not found: {path}")]
    ArtifactNotFound {
        /// Expected artifact path.
        path: String,
    },

    /// A stored artifact row could not be converted back into a record.
    #[error("Conversion error in {path}: {message}")]
    Conversion {
        /// Artifact path.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    /// CSV reading or writing failed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Artifact path.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Filesystem error.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Whether this error is a fatal configuration problem rather than a
    /// data problem confined to one category.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Grid(_) | Self::Population(_) | Self::Config { .. }
        )
    }
}
