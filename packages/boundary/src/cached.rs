//! File-backed boundary cache.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use opportunity_map_grid_models::RegionDefinition;
use opportunity_map_spatial::Boundary;

use crate::nominatim::NominatimBoundaryFetcher;
use crate::{BoundaryError, BoundaryProvider};

/// Reads boundaries from `{dir}/{region}_boundary.geojson`, fetching and
/// caching them on a miss when a fetcher is configured.
pub struct CachedBoundaryProvider {
    dir: PathBuf,
    fetcher: Option<NominatimBoundaryFetcher>,
}

impl CachedBoundaryProvider {
    /// Creates a provider that only reads cached files.
    #[must_use]
    pub fn offline(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fetcher: None,
        }
    }

    /// Creates a provider that falls back to `fetcher` on a cache miss.
    #[must_use]
    pub fn with_fetcher(dir: impl Into<PathBuf>, fetcher: NominatimBoundaryFetcher) -> Self {
        Self {
            dir: dir.into(),
            fetcher: Some(fetcher),
        }
    }

    /// Path of the cached boundary for `region_id`.
    #[must_use]
    pub fn cache_path(&self, region_id: &str) -> PathBuf {
        self.dir.join(format!("{region_id}_boundary.geojson"))
    }

    /// Reads the cached boundary for `region_id`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the file exists but cannot be read or
    /// parsed.
    pub async fn load_cached(&self, region_id: &str) -> Result<Option<Boundary>, BoundaryError> {
        let path = self.cache_path(region_id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| io_error(&path, source))?;

        log::debug!("Loaded cached boundary {}", path.display());
        Ok(Some(Boundary::from_geojson_str(&content)?))
    }

    async fn store(&self, region_id: &str, geometry: &serde_json::Value) -> Result<(), BoundaryError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| io_error(&self.dir, source))?;

        let path = self.cache_path(region_id);
        tokio::fs::write(&path, serde_json::to_string(geometry)?)
            .await
            .map_err(|source| io_error(&path, source))?;

        log::info!("Boundary saved: {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl BoundaryProvider for CachedBoundaryProvider {
    async fn boundary(&self, region: &RegionDefinition) -> Result<Boundary, BoundaryError> {
        if let Some(boundary) = self.load_cached(&region.id).await? {
            return Ok(boundary);
        }

        let Some(fetcher) = &self.fetcher else {
            return Err(BoundaryError::Unavailable {
                region: region.id.clone(),
            });
        };

        let geometry = fetcher.fetch_geometry(region.boundary_query()).await?;
        let boundary = Boundary::from_geojson_str(&geometry.to_string())?;

        // A failed cache write does not invalidate the fetched boundary.
        if let Err(e) = self.store(&region.id, &geometry).await {
            log::warn!("Failed to cache boundary for {}: {e}", region.id);
        }

        Ok(boundary)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BoundaryError {
    BoundaryError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use opportunity_map_grid_models::{LatLng, RegionBounds};

    use super::*;

    fn temp_dir(test: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "opportunity_map_boundary_{test}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn region(id: &str) -> RegionDefinition {
        RegionDefinition {
            id: id.to_string(),
            name: id.to_string(),
            center: LatLng { lat: 1.005, lng: 1.005 },
            bounds: RegionBounds {
                north: 1.01,
                south: 1.0,
                east: 1.01,
                west: 1.0,
            },
            boundary_query: None,
        }
    }

    #[tokio::test]
    async fn reads_cached_geometry() {
        let dir = temp_dir("cached");
        std::fs::write(
            dir.join("testville_boundary.geojson"),
            r#"{"type":"Polygon","coordinates":[[[1.0,1.0],[1.01,1.0],[1.01,1.01],[1.0,1.01],[1.0,1.0]]]}"#,
        )
        .unwrap();

        let provider = CachedBoundaryProvider::offline(&dir);
        let boundary = provider.boundary(&region("testville")).await.unwrap();
        assert!(boundary.contains(1.005, 1.005));
        assert!(!boundary.contains(1.02, 1.005));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn offline_miss_is_unavailable() {
        let dir = temp_dir("miss");
        let provider = CachedBoundaryProvider::offline(&dir);

        assert!(provider.load_cached("nowhere").await.unwrap().is_none());
        let err = provider.boundary(&region("nowhere")).await.unwrap_err();
        assert!(matches!(err, BoundaryError::Unavailable { .. }));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn corrupt_cache_is_an_error() {
        let dir = temp_dir("corrupt");
        std::fs::write(dir.join("broken_boundary.geojson"), "{not json").unwrap();

        let provider = CachedBoundaryProvider::offline(&dir);
        assert!(provider.load_cached("broken").await.is_err());

        std::fs::remove_dir_all(dir).ok();
    }
}
