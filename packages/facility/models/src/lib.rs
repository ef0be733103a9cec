#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Facility records and the explicit version tag used to address stored
//! snapshots and analysis artifacts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One existing service location of a tracked category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// External unique identifier (e.g. a places-directory id).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category the facility was collected under (e.g. `"pharmacy"`).
    pub category: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Average user rating, when the directory provides one.
    pub rating: Option<f64>,
    /// Any additional columns carried by the snapshot.
    pub metadata: BTreeMap<String, String>,
}

impl Facility {
    /// The facility location as `(lat, lng)`.
    #[must_use]
    pub const fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Error returned when parsing an invalid [`ArtifactVersion`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid artifact version '{0}': expected a non-empty ASCII alphanumeric tag (dashes allowed)")]
pub struct InvalidArtifactVersion(pub String);

/// Caller-supplied identifier naming a facility snapshot or an analysis
/// output, typically a `YYYYMMDD` date stamp.
///
/// Versions never contain `_`, so they can be split unambiguously off the
/// end of an artifact file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactVersion(String);

impl ArtifactVersion {
    /// Returns the version tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ArtifactVersion {
    type Err = InvalidArtifactVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let valid = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');

        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidArtifactVersion(s.to_string()))
        }
    }
}

impl TryFrom<String> for ArtifactVersion {
    type Error = InvalidArtifactVersion;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactVersion> for String {
    fn from(value: ArtifactVersion) -> Self {
        value.0
    }
}

impl fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
