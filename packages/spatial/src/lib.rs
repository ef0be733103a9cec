#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial primitives for the opportunity map.
//!
//! Provides the geodesic distance service used by every distance-based
//! stage, boundary polygons parsed from `GeoJSON` with point-in-polygon
//! filtering, and an R-tree point index for fixed-radius neighbor queries
//! over grid cell centers.

pub mod boundary;
pub mod distance;
pub mod index;

pub use boundary::Boundary;
pub use distance::{distance_km, validate_coordinate};
pub use index::PointIndex;

use thiserror::Error;

/// Errors that can occur during spatial operations.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A latitude/longitude pair was `NaN` or out of range.
    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate {
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lng: f64,
    },

    /// `GeoJSON` parsing or conversion failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The geometry was valid `GeoJSON` but not usable as a boundary.
    #[error("Unsupported boundary geometry: {message}")]
    UnsupportedGeometry {
        /// Description of what went wrong.
        message: String,
    },
}
