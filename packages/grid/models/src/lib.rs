#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region and analysis grid types.
//!
//! A region is a named rectangular area read from the embedded region
//! registry. An analysis grid is a row-major lattice of [`GridCell`]s
//! sampled over that rectangle and optionally clipped to the region's
//! administrative boundary.

use serde::{Deserialize, Serialize};

/// Identifier of a grid cell, unique and stable within one grid build.
pub type CellId = usize;

/// Default spacing between adjacent grid cell centers, in kilometers.
pub const DEFAULT_GRID_SPACING_KM: f64 = 0.5;

/// A latitude/longitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Rectangular bounds of a region in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    /// Northern edge (maximum latitude).
    pub north: f64,
    /// Southern edge (minimum latitude).
    pub south: f64,
    /// Eastern edge (maximum longitude).
    pub east: f64,
    /// Western edge (minimum longitude).
    pub west: f64,
}

impl RegionBounds {
    /// Whether `north > south` and `east > west` with finite edges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite())
            && self.north > self.south
            && self.east > self.west
    }

    /// Latitude halfway between the northern and southern edges.
    #[must_use]
    pub fn center_lat(&self) -> f64 {
        f64::midpoint(self.north, self.south)
    }
}

/// A configured analysis region, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDefinition {
    /// Unique region identifier used in artifact names (e.g. `"milan"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Representative center point.
    pub center: LatLng,
    /// Rectangular analysis bounds.
    pub bounds: RegionBounds,
    /// Free-text query for the boundary geocoding service. Falls back to
    /// the region id when absent.
    pub boundary_query: Option<String>,
}

impl RegionDefinition {
    /// Returns the region identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the query string used to look up the region boundary.
    #[must_use]
    pub fn boundary_query(&self) -> &str {
        self.boundary_query.as_deref().unwrap_or(&self.id)
    }
}

/// One sample unit of the analysis lattice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Row-major sequential identifier.
    pub cell_id: CellId,
    /// Latitude of the cell center.
    pub center_lat: f64,
    /// Longitude of the cell center.
    pub center_lng: f64,
    /// Southern edge of the cell.
    pub lat_min: f64,
    /// Northern edge of the cell.
    pub lat_max: f64,
    /// Western edge of the cell.
    pub lng_min: f64,
    /// Eastern edge of the cell.
    pub lng_max: f64,
}

impl GridCell {
    /// Creates a cell centered on `(center_lat, center_lng)` whose bounds
    /// extend half a step in each direction.
    #[must_use]
    pub fn from_center(
        cell_id: CellId,
        center_lat: f64,
        center_lng: f64,
        lat_step: f64,
        lng_step: f64,
    ) -> Self {
        Self {
            cell_id,
            center_lat,
            center_lng,
            lat_min: center_lat - lat_step / 2.0,
            lat_max: center_lat + lat_step / 2.0,
            lng_min: center_lng - lng_step / 2.0,
            lng_max: center_lng + lng_step / 2.0,
        }
    }

    /// The cell center as `(lat, lng)`.
    #[must_use]
    pub const fn center(&self) -> (f64, f64) {
        (self.center_lat, self.center_lng)
    }
}
