#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary polygons for analysis regions.
//!
//! Boundaries are an optional input: the grid builder clips to one when
//! it is available and falls back to the full rectangle otherwise. The
//! [`BoundaryProvider`] trait is the seam; [`CachedBoundaryProvider`] reads
//! `{region}_boundary.geojson` files and, on a miss, asks a
//! [`NominatimBoundaryFetcher`] and caches what it returns.

pub mod cached;
pub mod nominatim;

pub use cached::CachedBoundaryProvider;
pub use nominatim::NominatimBoundaryFetcher;

use async_trait::async_trait;
use opportunity_map_grid_models::RegionDefinition;
use opportunity_map_spatial::{Boundary, SpatialError};

/// Errors that can occur while obtaining a boundary.
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Boundary geometry could not be used.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// Cache file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The geocoder returned no boundary for the query.
    #[error("No boundary found for '{query}'")]
    NotFound {
        /// Query that was sent.
        query: String,
    },

    /// No cached boundary and no fetcher configured.
    #[error("No cached boundary for region '{region}' and fetching is disabled")]
    Unavailable {
        /// Region identifier.
        region: String,
    },
}

/// Supplies boundary polygons for configured regions.
#[async_trait]
pub trait BoundaryProvider: Send + Sync {
    /// Returns the boundary of `region`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if no usable boundary can be obtained.
    async fn boundary(&self, region: &RegionDefinition) -> Result<Boundary, BoundaryError>;
}

/// Asks `provider` for the boundary of `region`, degrading to `None`
/// with a warning on any failure.
pub async fn resolve_boundary(
    provider: &dyn BoundaryProvider,
    region: &RegionDefinition,
) -> Option<Boundary> {
    match provider.boundary(region).await {
        Ok(boundary) => {
            log::info!(
                "Using boundary for {} ({:.5} sq deg)",
                region.id,
                boundary.area_sq_deg()
            );
            Some(boundary)
        }
        Err(e) => {
            log::warn!(
                "Boundary unavailable for {} ({e}); using the rectangular grid",
                region.id
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use opportunity_map_grid_models::{LatLng, RegionBounds};

    use super::*;

    struct Failing;

    #[async_trait]
    impl BoundaryProvider for Failing {
        async fn boundary(&self, region: &RegionDefinition) -> Result<Boundary, BoundaryError> {
            Err(BoundaryError::Unavailable {
                region: region.id.clone(),
            })
        }
    }

    #[tokio::test]
    async fn failure_degrades_to_none() {
        let region = RegionDefinition {
            id: "testville".to_string(),
            name: "Testville".to_string(),
            center: LatLng { lat: 1.0, lng: 1.0 },
            bounds: RegionBounds {
                north: 1.1,
                south: 0.9,
                east: 1.1,
                west: 0.9,
            },
            boundary_query: None,
        };

        assert!(resolve_boundary(&Failing, &region).await.is_none());
    }
}
