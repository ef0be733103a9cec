//! Administrative boundary polygons and point-in-polygon filtering.
//!
//! A [`Boundary`] wraps a single polygon (holes honored). Boundaries
//! sourced as a `MultiPolygon` keep only their largest member by planar
//! area; smaller members such as exclaves or islands are dropped. This
//! can remove valid parts of a real administrative area and is logged
//! whenever it happens.

use geo::{Area, BoundingRect, Contains, Geometry, MultiPolygon, Point, Polygon, Rect};
use geojson::GeoJson;

use crate::SpatialError;

/// A boundary polygon used to clip grids and stored analysis tables.
#[derive(Debug, Clone)]
pub struct Boundary {
    polygon: Polygon<f64>,
    envelope: Rect<f64>,
}

impl Boundary {
    /// Creates a boundary from a single polygon.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedGeometry`] if the polygon has an
    /// empty exterior ring.
    pub fn from_polygon(polygon: Polygon<f64>) -> Result<Self, SpatialError> {
        let envelope = polygon
            .bounding_rect()
            .ok_or_else(|| SpatialError::UnsupportedGeometry {
                message: "polygon has no exterior coordinates".to_string(),
            })?;

        Ok(Self { polygon, envelope })
    }

    /// Creates a boundary from the largest member of a `MultiPolygon`.
    ///
    /// Members are compared by unsigned planar area in square degrees. On an
    /// exact tie the first member wins.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedGeometry`] if the multi-polygon
    /// has no members.
    pub fn from_multi_polygon(multi: MultiPolygon<f64>) -> Result<Self, SpatialError> {
        let member_count = multi.0.len();
        let mut largest: Option<(f64, Polygon<f64>)> = None;

        for polygon in multi {
            let area = polygon.unsigned_area();
            match &largest {
                Some((best, _)) if area <= *best => {}
                _ => largest = Some((area, polygon)),
            }
        }

        let Some((area, polygon)) = largest else {
            return Err(SpatialError::UnsupportedGeometry {
                message: "multi-polygon has no members".to_string(),
            });
        };

        if member_count > 1 {
            log::warn!(
                "Boundary has {member_count} polygons; keeping the largest \
                 ({area:.6} sq deg) and dropping {} smaller fragment(s)",
                member_count - 1
            );
        }

        Self::from_polygon(polygon)
    }

    /// Creates a boundary from a `geo` geometry.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedGeometry`] for anything other
    /// than a `Polygon` or `MultiPolygon`.
    pub fn from_geometry(geometry: Geometry<f64>) -> Result<Self, SpatialError> {
        match geometry {
            Geometry::Polygon(polygon) => Self::from_polygon(polygon),
            Geometry::MultiPolygon(multi) => Self::from_multi_polygon(multi),
            other => Err(SpatialError::UnsupportedGeometry {
                message: format!("expected Polygon or MultiPolygon, got {}", kind(&other)),
            }),
        }
    }

    /// Parses a boundary from `GeoJSON` text.
    ///
    /// Accepts a bare geometry, a `Feature`, or a `FeatureCollection` (the
    /// first feature with a geometry is used).
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the text is not valid `GeoJSON` or does
    /// not contain a polygonal geometry.
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self, SpatialError> {
        let geojson: GeoJson = geojson_str.parse()?;

        let geometry = match geojson {
            GeoJson::Geometry(geometry) => Some(geometry),
            GeoJson::Feature(feature) => feature.geometry,
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .find_map(|feature| feature.geometry),
        };

        let Some(geometry) = geometry else {
            return Err(SpatialError::UnsupportedGeometry {
                message: "GeoJSON contains no geometry".to_string(),
            });
        };

        let geometry: Geometry<f64> = geometry.try_into()?;
        Self::from_geometry(geometry)
    }

    /// Returns the wrapped polygon.
    #[must_use]
    pub const fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Planar area of the polygon in square degrees.
    #[must_use]
    pub fn area_sq_deg(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    /// Whether the point lies strictly inside the polygon.
    ///
    /// Points exactly on the boundary line or inside a hole are outside.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        let min = self.envelope.min();
        let max = self.envelope.max();
        if lng < min.x || lng > max.x || lat < min.y || lat > max.y {
            return false;
        }

        self.polygon.contains(&Point::new(lng, lat))
    }

    /// Returns one flag per `(lat, lng)` point: `true` when inside.
    #[must_use]
    pub fn mask(&self, points: &[(f64, f64)]) -> Vec<bool> {
        points
            .iter()
            .map(|&(lat, lng)| self.contains(lat, lng))
            .collect()
    }

    /// Keeps only the items whose coordinate lies inside the boundary,
    /// preserving their original order.
    #[must_use]
    pub fn retain<T>(&self, items: Vec<T>, coordinate: impl Fn(&T) -> (f64, f64)) -> Vec<T> {
        items
            .into_iter()
            .filter(|item| {
                let (lat, lng) = coordinate(item);
                self.contains(lat, lng)
            })
            .collect()
    }
}

const fn kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
