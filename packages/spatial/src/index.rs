//! R-tree index over point coordinates for fixed-radius neighbor queries.
//!
//! Queries first select candidates from a lat/lng envelope that is
//! guaranteed to contain the whole search circle, then confirm each
//! candidate with an exact geodesic distance. This turns an all-pairs
//! radius aggregation from `O(n²)` into roughly `O(n · k)` where `k` is
//! the number of neighbors inside the radius.

use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use crate::distance::distance_km;

/// Lower bound on the length of one degree of latitude, in kilometers.
///
/// The true value ranges from ~110.57 km at the equator to ~111.69 km at
/// the poles.
const MIN_KM_PER_DEGREE: f64 = 110.0;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Spatial index over a fixed set of `(lat, lng)` points.
///
/// Each point is addressed by its position in the slice the index was
/// built from.
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
    points: Vec<(f64, f64)>,
}

impl PointIndex {
    /// Builds an index over `(lat, lng)` points.
    #[must_use]
    pub fn new(points: &[(f64, f64)]) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(idx, &(lat, lng))| GeomWithData::new([lng, lat], idx))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            points: points.to_vec(),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the indices of every point within `radius_km` geodesic
    /// distance of `(lat, lng)`, inclusive, in ascending index order.
    #[must_use]
    pub fn within_km(&self, lat: f64, lng: f64, radius_km: f64) -> Vec<usize> {
        let envelope = search_envelope(lat, lng, radius_km);

        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .filter(|&idx| {
                let (other_lat, other_lng) = self.points[idx];
                distance_km(lat, lng, other_lat, other_lng) <= radius_km
            })
            .collect();

        hits.sort_unstable();
        hits
    }
}

/// Computes a lng/lat envelope that fully contains the circle of
/// `radius_km` around the point.
fn search_envelope(lat: f64, lng: f64, radius_km: f64) -> AABB<[f64; 2]> {
    let d_lat = radius_km / MIN_KM_PER_DEGREE;

    // Longitude degrees shrink toward the poles, so size the window using
    // the most poleward latitude it can reach.
    let extreme_lat = (lat.abs() + d_lat).min(90.0);
    let cos = extreme_lat.to_radians().cos();
    let d_lng = if cos > 1e-6 {
        (radius_km / (MIN_KM_PER_DEGREE * cos)).min(360.0)
    } else {
        360.0
    };

    AABB::from_corners([lng - d_lng, lat - d_lat], [lng + d_lng, lat + d_lat])
}
