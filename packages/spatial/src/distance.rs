//! Geodesic distance between two WGS84 coordinates.
//!
//! Distances are measured on the ellipsoid with Karney's algorithm
//! (`geo::Geodesic`), not on flat degrees, so results stay accurate at
//! city scale regardless of latitude.

use geo::{Distance, Geodesic, Point};

use crate::SpatialError;

/// Returns the geodesic distance in kilometers between two points given
/// as `(lat, lng)` degrees.
///
/// The pair is put into a canonical order before measuring, which makes
/// the result bitwise symmetric. Identical points return exactly `0.0`.
///
/// Inputs must already be valid coordinates (see [`validate_coordinate`]);
/// the result is unspecified for `NaN` or out-of-range values.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn distance_km(a_lat: f64, a_lng: f64, b_lat: f64, b_lng: f64) -> f64 {
    if a_lat == b_lat && a_lng == b_lng {
        return 0.0;
    }

    let (from, to) = if (a_lat, a_lng) <= (b_lat, b_lng) {
        (Point::new(a_lng, a_lat), Point::new(b_lng, b_lat))
    } else {
        (Point::new(b_lng, b_lat), Point::new(a_lng, a_lat))
    };

    Geodesic.distance(from, to) / 1000.0
}

/// Checks that a coordinate is finite and within `[-90, 90]` latitude and
/// `[-180, 180]` longitude.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidCoordinate`] if either component is
/// `NaN`, infinite, or out of range.
pub fn validate_coordinate(lat: f64, lng: f64) -> Result<(), SpatialError> {
    if lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
    {
        Ok(())
    } else {
        Err(SpatialError::InvalidCoordinate { lat, lng })
    }
}
