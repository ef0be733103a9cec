#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population rasters and per-cell demand estimates.
//!
//! A [`PopulationRaster`] is sampled at each grid cell center, and
//! [`enrich::estimate_populations`] sums those point estimates over every
//! cell within 1 km to produce the demand input of the demand-weighted
//! scoring policy.

pub mod enrich;
pub mod geotiff;
pub mod raster;

pub use enrich::{POPULATION_RADIUS_KM, estimate_populations};
pub use geotiff::read_geotiff;
pub use raster::{GridRaster, PopulationRaster};

/// Errors that can occur while loading population rasters.
///
/// All variants are configuration errors: demand-weighted scoring cannot
/// proceed without a usable raster.
#[derive(Debug, thiserror::Error)]
pub enum PopulationError {
    /// Raster file could not be opened.
    #[error("Cannot open population raster {path}: {source}")]
    Io {
        /// Raster path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// TIFF decoding failed.
    #[error("Cannot decode population raster {path}: {source}")]
    Tiff {
        /// Raster path.
        path: String,
        /// Underlying TIFF error.
        source: tiff::TiffError,
    },

    /// Raster lacks the tags needed to map pixels to coordinates.
    #[error("Population raster {path} is not georeferenced: {message}")]
    MissingGeoreference {
        /// Raster path.
        path: String,
        /// What is missing.
        message: String,
    },

    /// Raster dimensions or values are inconsistent.
    #[error("Invalid population raster: {message}")]
    InvalidRaster {
        /// Description of what went wrong.
        message: String,
    },
}
