//! Analysis parameters and on-disk data layout.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use opportunity_map_accessibility::DEFAULT_WALKING_DISTANCE_KM;
use opportunity_map_facility_models::ArtifactVersion;
use opportunity_map_grid_models::DEFAULT_GRID_SPACING_KM;

use crate::PipelineError;

/// Tunable parameters of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Distance between neighboring grid cell centers, in kilometers.
    pub grid_spacing_km: f64,
    /// Threshold for `services_within_walking`, in kilometers.
    pub walking_distance_km: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            grid_spacing_km: DEFAULT_GRID_SPACING_KM,
            walking_distance_km: DEFAULT_WALKING_DISTANCE_KM,
        }
    }
}

impl AnalysisConfig {
    /// Checks that both distances are positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] naming the offending parameter.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (name, value) in [
            ("grid spacing", self.grid_spacing_km),
            ("walking distance", self.walking_distance_km),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PipelineError::Config {
                    message: format!("{name} must be a positive number of km, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Root of the data directory and the artifact naming scheme under it.
///
/// ```text
/// {root}/raw/{region}_{category}_{version}.csv
/// {root}/processed/{region}_{category}_analysis_{version}.csv
/// {root}/processed/{region}_{category}_analysis_filtered_{version}.csv
/// {root}/processed/{region}_{category}_deserts_{version}.csv
/// {root}/boundaries/{region}_boundary.geojson
/// {root}/population/*.tif
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Facility snapshots.
    #[must_use]
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    /// Analysis artifacts.
    #[must_use]
    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    /// Cached boundary geometries.
    #[must_use]
    pub fn boundaries_dir(&self) -> PathBuf {
        self.root.join("boundaries")
    }

    /// Population rasters.
    #[must_use]
    pub fn population_dir(&self) -> PathBuf {
        self.root.join("population")
    }

    #[must_use]
    pub fn analysis_path(&self, region: &str, category: &str, version: &ArtifactVersion) -> PathBuf {
        self.processed_dir()
            .join(format!("{region}_{category}_analysis_{version}.csv"))
    }

    #[must_use]
    pub fn filtered_path(&self, region: &str, category: &str, version: &ArtifactVersion) -> PathBuf {
        self.processed_dir()
            .join(format!("{region}_{category}_analysis_filtered_{version}.csv"))
    }

    #[must_use]
    pub fn deserts_path(&self, region: &str, category: &str, version: &ArtifactVersion) -> PathBuf {
        self.processed_dir()
            .join(format!("{region}_{category}_deserts_{version}.csv"))
    }

    /// Enriched counterpart of an analysis artifact: `x.csv` becomes
    /// `x_enriched.csv` in the same directory.
    #[must_use]
    pub fn enriched_path(source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        source.with_file_name(format!("{stem}_enriched.csv"))
    }

    /// Categories with an unfiltered analysis artifact for `region` at
    /// exactly `version`, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if the processed directory exists but
    /// cannot be read.
    pub fn analyzed_categories(
        &self,
        region: &str,
        version: &ArtifactVersion,
    ) -> Result<Vec<String>, PipelineError> {
        let dir = self.processed_dir();
        let prefix = format!("{region}_");
        let suffix = format!("_analysis_{version}.csv");

        let categories: BTreeSet<String> = list_file_names(&dir)?
            .into_iter()
            .filter_map(|name| {
                name.strip_prefix(&prefix)?
                    .strip_suffix(&suffix)
                    .filter(|category| !category.is_empty())
                    .map(str::to_string)
            })
            .collect();

        Ok(categories.into_iter().collect())
    }

    /// GeoTIFF files in the population directory, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if the directory exists but cannot be
    /// read.
    pub fn population_rasters(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let dir = self.population_dir();
        let mut rasters: Vec<PathBuf> = list_file_names(&dir)?
            .into_iter()
            .filter(|name| {
                let lower = name.to_lowercase();
                Path::new(&lower)
                    .extension()
                    .is_some_and(|ext| ext == "tif" || ext == "tiff")
            })
            .map(|name| dir.join(name))
            .collect();
        rasters.sort();
        Ok(rasters)
    }
}

fn list_file_names(dir: &Path) -> Result<Vec<String>, PipelineError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let io_err = |source| PipelineError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version() -> ArtifactVersion {
        "20250114".parse().unwrap()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!((config.grid_spacing_km - 0.5).abs() < f64::EPSILON);
        assert!((config.walking_distance_km - 1.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_distances() {
        for (spacing, walking) in [(0.0, 1.0), (0.5, -1.0), (f64::NAN, 1.0), (0.5, f64::INFINITY)] {
            let config = AnalysisConfig {
                grid_spacing_km: spacing,
                walking_distance_km: walking,
            };
            let err = config.validate().unwrap_err();
            assert!(err.is_configuration());
        }
    }

    #[test]
    fn artifact_names() {
        let paths = DataPaths::new("data");
        let v = version();

        assert_eq!(
            paths.analysis_path("milan", "pharmacy", &v),
            Path::new("data/processed/milan_pharmacy_analysis_20250114.csv")
        );
        assert_eq!(
            paths.filtered_path("milan", "pharmacy", &v),
            Path::new("data/processed/milan_pharmacy_analysis_filtered_20250114.csv")
        );
        assert_eq!(
            paths.deserts_path("milan", "pharmacy", &v),
            Path::new("data/processed/milan_pharmacy_deserts_20250114.csv")
        );
        assert_eq!(
            DataPaths::enriched_path(&paths.filtered_path("milan", "pharmacy", &v)),
            Path::new("data/processed/milan_pharmacy_analysis_filtered_20250114_enriched.csv")
        );
    }

    #[test]
    fn lists_analyzed_categories_for_exact_version() {
        let root = std::env::temp_dir().join(format!(
            "opportunity_map_pipeline_categories_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        let paths = DataPaths::new(&root);
        std::fs::create_dir_all(paths.processed_dir()).unwrap();

        for name in [
            "milan_pharmacy_analysis_20250114.csv",
            "milan_pharmacy_analysis_filtered_20250114.csv",
            "milan_pharmacy_deserts_20250114.csv",
            "milan_bakery_analysis_20250114.csv",
            "milan_gym_analysis_20250101.csv",
            "rome_cafe_analysis_20250114.csv",
        ] {
            std::fs::write(paths.processed_dir().join(name), "").unwrap();
        }

        let categories = paths.analyzed_categories("milan", &version()).unwrap();
        assert_eq!(categories, vec!["bakery", "pharmacy"]);

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn missing_directories_are_empty() {
        let paths = DataPaths::new("/nonexistent/opportunity_map");
        assert!(paths.analyzed_categories("milan", &version()).unwrap().is_empty());
        assert!(paths.population_rasters().unwrap().is_empty());
    }
}
