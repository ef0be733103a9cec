#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region registry and analysis grid construction.
//!
//! Regions are defined as TOML files embedded at compile time (see
//! [`registry`]). The [`builder`] samples a regular lattice over a
//! region's rectangle at a configurable spacing and optionally clips it
//! to an administrative boundary polygon.

pub mod builder;
pub mod registry;

pub use builder::{GridBuild, GridSteps, build_grid};

use thiserror::Error;

/// Errors that can occur while resolving regions or building grids.
///
/// All variants are configuration errors and are fatal to an analysis run.
#[derive(Debug, Error)]
pub enum GridError {
    /// The requested region is not in the registry.
    #[error("Region '{id}' not configured. Available: {available}")]
    UnknownRegion {
        /// Requested region identifier.
        id: String,
        /// Comma-separated list of configured region identifiers.
        available: String,
    },

    /// Region bounds do not satisfy `north > south` and `east > west`.
    #[error(
        "Invalid region bounds: north={north}, south={south}, east={east}, west={west}"
    )]
    InvalidBounds {
        /// Northern edge.
        north: f64,
        /// Southern edge.
        south: f64,
        /// Eastern edge.
        east: f64,
        /// Western edge.
        west: f64,
    },

    /// Grid spacing is not a positive finite number of kilometers.
    #[error("Invalid grid spacing: {spacing_km} km")]
    InvalidSpacing {
        /// Offending spacing.
        spacing_km: f64,
    },
}
