//! `OpenStreetMap` Nominatim boundary lookups.
//!
//! Uses the search endpoint with `polygon_geojson=1` and returns the
//! geometry of the first match. Nominatim's usage policy requires an
//! identifying `User-Agent`.

use async_trait::async_trait;
use opportunity_map_grid_models::RegionDefinition;
use opportunity_map_spatial::Boundary;

use crate::{BoundaryError, BoundaryProvider};

/// Default Nominatim search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

const USER_AGENT: &str = concat!("opportunity-map/", env!("CARGO_PKG_VERSION"));

/// Fetches region boundaries from a Nominatim instance.
pub struct NominatimBoundaryFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl NominatimBoundaryFetcher {
    /// Creates a fetcher against the public Nominatim instance.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, BoundaryError> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates a fetcher against a custom search endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Http`] if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, BoundaryError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Looks up `query` and returns the `GeoJSON` geometry of the first
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the request fails, the response is not
    /// valid JSON, or nothing matched.
    pub async fn fetch_geometry(&self, query: &str) -> Result<serde_json::Value, BoundaryError> {
        log::info!("Fetching boundary for '{query}' from {}", self.endpoint);

        let body = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "geojson"),
                ("polygon_geojson", "1"),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let json: serde_json::Value = serde_json::from_str(&body)?;
        first_geometry(&json).ok_or_else(|| BoundaryError::NotFound {
            query: query.to_string(),
        })
    }
}

#[async_trait]
impl BoundaryProvider for NominatimBoundaryFetcher {
    async fn boundary(&self, region: &RegionDefinition) -> Result<Boundary, BoundaryError> {
        let geometry = self.fetch_geometry(region.boundary_query()).await?;
        Ok(Boundary::from_geojson_str(&geometry.to_string())?)
    }
}

/// Extracts `features[0].geometry` from a search response.
pub(crate) fn first_geometry(response: &serde_json::Value) -> Option<serde_json::Value> {
    response["features"]
        .as_array()?
        .first()
        .map(|feature| feature["geometry"].clone())
        .filter(|geometry| geometry.is_object())
}
