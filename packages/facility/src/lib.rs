#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Facility snapshot access.
//!
//! The analysis core consumes an already-collected, deduplicated set of
//! [`Facility`] records. The [`FacilitySource`] trait abstracts where that
//! set comes from; [`CsvFacilityStore`] reads the flat CSV snapshots that
//! the collection step writes under `raw/`.

pub mod csv_store;

use std::collections::BTreeSet;

pub use csv_store::CsvFacilityStore;
use opportunity_map_facility_models::{ArtifactVersion, Facility};

/// Errors that can occur while reading facility snapshots.
#[derive(Debug, thiserror::Error)]
pub enum FacilityError {
    /// No snapshot exists for the requested region/category/version.
    #[error("No facility snapshot at {path}")]
    SnapshotNotFound {
        /// Expected snapshot path.
        path: String,
    },

    /// A required column is absent from the snapshot header.
    #[error("Snapshot {path} is missing required column '{column}'")]
    MissingColumn {
        /// Snapshot path.
        path: String,
        /// Missing column name.
        column: &'static str,
    },

    /// CSV parsing error.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Snapshot path.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// I/O error while listing snapshots.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Provider of facility sets for a region, category and explicit version.
pub trait FacilitySource: Send + Sync {
    /// Loads the facilities of `category` in `region` for `version`.
    ///
    /// The returned set contains each facility id at most once.
    ///
    /// # Errors
    ///
    /// Returns [`FacilityError`] if the snapshot is missing or unreadable.
    fn load(
        &self,
        region: &str,
        category: &str,
        version: &ArtifactVersion,
    ) -> Result<Vec<Facility>, FacilityError>;

    /// Lists the categories that have a snapshot for `region` at `version`,
    /// sorted alphabetically.
    ///
    /// # Errors
    ///
    /// Returns [`FacilityError`] if the snapshot location cannot be read.
    fn categories(
        &self,
        region: &str,
        version: &ArtifactVersion,
    ) -> Result<Vec<String>, FacilityError>;
}

/// Drops facilities whose id was already seen, keeping the first
/// occurrence and preserving input order.
#[must_use]
pub fn dedup_by_id(facilities: Vec<Facility>) -> Vec<Facility> {
    let before = facilities.len();
    let mut seen = BTreeSet::new();

    let unique: Vec<Facility> = facilities
        .into_iter()
        .filter(|f| seen.insert(f.id.clone()))
        .collect();

    let dropped = before - unique.len();
    if dropped > 0 {
        log::warn!("Dropped {dropped} duplicate facilities (kept first occurrence)");
    }

    unique
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn facility(id: &str, name: &str) -> Facility {
        Facility {
            id: id.to_string(),
            name: name.to_string(),
            category: "pharmacy".to_string(),
            lat: 45.46,
            lng: 9.19,
            rating: None,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let unique = dedup_by_id(vec![
            facility("a", "first"),
            facility("b", "other"),
            facility("a", "second"),
        ]);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "first");
        assert_eq!(unique[1].id, "b");
    }
}
