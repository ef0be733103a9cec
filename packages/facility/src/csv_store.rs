//! Flat-file facility snapshots.
//!
//! Snapshots live at `{raw_dir}/{region}_{category}_{version}.csv` with one
//! row per facility. Recognized columns are `place_id`, `name`, `type`,
//! `lat`, `lng` and `rating`; every other non-empty column is kept in
//! [`Facility::metadata`].

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use opportunity_map_facility_models::{ArtifactVersion, Facility};
use opportunity_map_spatial::validate_coordinate;

use crate::{FacilityError, FacilitySource, dedup_by_id};

const ID_COLUMN: &str = "place_id";
const NAME_COLUMN: &str = "name";
const CATEGORY_COLUMN: &str = "type";
const LAT_COLUMN: &str = "lat";
const LNG_COLUMN: &str = "lng";
const RATING_COLUMN: &str = "rating";

/// Reads facility snapshots from a directory of CSV files.
#[derive(Debug, Clone)]
pub struct CsvFacilityStore {
    raw_dir: PathBuf,
}

impl CsvFacilityStore {
    /// Creates a store rooted at `raw_dir`.
    #[must_use]
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    /// Path of the snapshot for `region`/`category` at `version`.
    #[must_use]
    pub fn snapshot_path(&self, region: &str, category: &str, version: &ArtifactVersion) -> PathBuf {
        self.raw_dir
            .join(format!("{region}_{category}_{version}.csv"))
    }
}

impl FacilitySource for CsvFacilityStore {
    fn load(
        &self,
        region: &str,
        category: &str,
        version: &ArtifactVersion,
    ) -> Result<Vec<Facility>, FacilityError> {
        let path = self.snapshot_path(region, category, version);
        if !path.is_file() {
            return Err(FacilityError::SnapshotNotFound {
                path: path.display().to_string(),
            });
        }

        log::info!("Loading facilities from {}", path.display());
        let facilities = read_snapshot(&path, category)?;
        let facilities = dedup_by_id(facilities);
        log::info!("Loaded {} {category} locations", facilities.len());

        Ok(facilities)
    }

    fn categories(
        &self,
        region: &str,
        version: &ArtifactVersion,
    ) -> Result<Vec<String>, FacilityError> {
        if !self.raw_dir.is_dir() {
            return Ok(Vec::new());
        }

        let io_err = |source| FacilityError::Io {
            path: self.raw_dir.display().to_string(),
            source,
        };

        let prefix = format!("{region}_");
        let suffix = format!("_{version}.csv");
        let mut categories = BTreeSet::new();

        for entry in std::fs::read_dir(&self.raw_dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            if let Some(category) = file_name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
                .filter(|c| !c.is_empty())
            {
                categories.insert(category.to_string());
            }
        }

        Ok(categories.into_iter().collect())
    }
}

/// Parses one snapshot file. `default_category` fills rows whose `type`
/// column is missing or empty.
fn read_snapshot(path: &Path, default_category: &str) -> Result<Vec<Facility>, FacilityError> {
    let csv_err = |source| FacilityError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let column = |name: &'static str| headers.iter().position(|h| h == name);
    let require = |name: &'static str| {
        column(name).ok_or_else(|| FacilityError::MissingColumn {
            path: path.display().to_string(),
            column: name,
        })
    };

    let id_idx = require(ID_COLUMN)?;
    let lat_idx = require(LAT_COLUMN)?;
    let lng_idx = require(LNG_COLUMN)?;
    let name_idx = column(NAME_COLUMN);
    let category_idx = column(CATEGORY_COLUMN);
    let rating_idx = column(RATING_COLUMN);
    let known = [
        Some(id_idx),
        Some(lat_idx),
        Some(lng_idx),
        name_idx,
        category_idx,
        rating_idx,
    ];

    let mut facilities = Vec::new();
    let mut skipped = 0_u64;

    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        let field = |idx: usize| record.get(idx).map_or("", str::trim);
        let optional = |idx: Option<usize>| idx.map(field).filter(|v| !v.is_empty());

        let id = field(id_idx);
        let coords = field(lat_idx)
            .parse::<f64>()
            .ok()
            .zip(field(lng_idx).parse::<f64>().ok())
            .filter(|&(lat, lng)| validate_coordinate(lat, lng).is_ok());

        let (Some((lat, lng)), false) = (coords, id.is_empty()) else {
            skipped += 1;
            log::trace!("  skipping row without id or valid coordinates: {record:?}");
            continue;
        };

        let metadata: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| !known.contains(&Some(*idx)))
            .filter_map(|(idx, header)| {
                let value = field(idx);
                (!value.is_empty()).then(|| (header.clone(), value.to_string()))
            })
            .collect();

        facilities.push(Facility {
            id: id.to_string(),
            name: optional(name_idx).unwrap_or_default().to_string(),
            category: optional(category_idx)
                .unwrap_or(default_category)
                .to_string(),
            lat,
            lng,
            rating: optional(rating_idx).and_then(|v| v.parse().ok()),
            metadata,
        });
    }

    if skipped > 0 {
        log::warn!(
            "Skipped {skipped} rows with missing ids or invalid coordinates in {}",
            path.display()
        );
    }

    Ok(facilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(test: &str) -> (CsvFacilityStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "opportunity_map_facility_{test}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        (CsvFacilityStore::new(&dir), dir)
    }

    fn version(v: &str) -> ArtifactVersion {
        v.parse().unwrap()
    }

    #[test]
    fn loads_snapshot_with_metadata() {
        let (store, dir) = temp_store("loads");
        std::fs::write(
            dir.join("milan_pharmacy_20250114.csv"),
            "place_id,name,type,lat,lng,rating,vicinity\n\
             p1,Farmacia Centrale,pharmacy,45.4642,9.1900,4.5,Via Roma 1\n\
             p2,Farmacia Nord,pharmacy,45.4800,9.2000,,\n",
        )
        .unwrap();

        let facilities = store
            .load("milan", "pharmacy", &version("20250114"))
            .unwrap();

        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[0].id, "p1");
        assert_eq!(facilities[0].rating, Some(4.5));
        assert_eq!(
            facilities[0].metadata.get("vicinity").map(String::as_str),
            Some("Via Roma 1")
        );
        assert_eq!(facilities[1].rating, None);
        assert!(facilities[1].metadata.is_empty());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn skips_invalid_rows_and_duplicates() {
        let (store, dir) = temp_store("invalid");
        std::fs::write(
            dir.join("milan_pharmacy_20250114.csv"),
            "place_id,name,lat,lng\n\
             p1,A,45.46,9.19\n\
             p2,B,not-a-number,9.19\n\
             p3,C,95.0,9.19\n\
             ,D,45.46,9.19\n\
             p1,E,45.47,9.20\n",
        )
        .unwrap();

        let facilities = store
            .load("milan", "pharmacy", &version("20250114"))
            .unwrap();

        assert_eq!(facilities.len(), 1);
        assert_eq!(facilities[0].name, "A");
        assert_eq!(facilities[0].category, "pharmacy");

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let (store, dir) = temp_store("missing");
        let err = store
            .load("milan", "bakery", &version("20250114"))
            .unwrap_err();
        assert!(matches!(err, FacilityError::SnapshotNotFound { .. }));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_required_column_is_reported() {
        let (store, dir) = temp_store("columns");
        std::fs::write(dir.join("milan_cafe_1.csv"), "place_id,name,lat\np1,A,45.0\n").unwrap();

        let err = store.load("milan", "cafe", &version("1")).unwrap_err();
        assert!(matches!(
            err,
            FacilityError::MissingColumn { column: "lng", .. }
        ));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn lists_categories_for_exact_version() {
        let (store, dir) = temp_store("categories");
        for name in [
            "milan_pharmacy_20250114.csv",
            "milan_convenience_store_20250114.csv",
            "milan_bakery_20241201.csv",
            "rome_pharmacy_20250114.csv",
            "notes.txt",
        ] {
            std::fs::write(dir.join(name), "place_id,lat,lng\n").unwrap();
        }

        let categories = store.categories("milan", &version("20250114")).unwrap();
        assert_eq!(categories, vec!["convenience_store", "pharmacy"]);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_directory_has_no_categories() {
        let store = CsvFacilityStore::new("/nonexistent/opportunity_map/raw");
        assert!(store.categories("milan", &version("1")).unwrap().is_empty());
    }
}
