//! Regular lattice sampling over a region's rectangle.
//!
//! Spacing is converted to degrees with the ~111 km-per-degree
//! approximation; the longitude step is widened by `1 / cos(lat)` at the
//! rectangle's center latitude so that cells are roughly square on the
//! ground. Cells are emitted row-major (latitude outer, longitude inner)
//! starting at the south-west corner and stepping inclusively up to the
//! north/east edges.

use opportunity_map_grid_models::{GridCell, RegionBounds};
use opportunity_map_spatial::Boundary;

use crate::GridError;

/// Kilometers per degree of latitude used for step conversion.
const KM_PER_DEGREE: f64 = 111.0;

/// Degree step sizes derived from a spacing in kilometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSteps {
    /// Latitude step in degrees.
    pub lat_step: f64,
    /// Longitude step in degrees, corrected for latitude compression.
    pub lng_step: f64,
}

impl GridSteps {
    /// Computes the steps for `spacing_km` over `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidBounds`] or [`GridError::InvalidSpacing`]
    /// if the inputs cannot produce a lattice.
    pub fn new(bounds: &RegionBounds, spacing_km: f64) -> Result<Self, GridError> {
        validate(bounds, spacing_km)?;

        let center_lat = bounds.center_lat().to_radians();

        Ok(Self {
            lat_step: spacing_km / KM_PER_DEGREE,
            lng_step: spacing_km / (KM_PER_DEGREE * center_lat.cos()),
        })
    }
}

/// Result of a grid build.
#[derive(Debug, Clone)]
pub struct GridBuild {
    /// Cells that survived boundary clipping, in id order.
    pub cells: Vec<GridCell>,
    /// Number of cells in the full rectangle before clipping.
    pub rectangular_count: usize,
    /// Whether a boundary polygon was applied.
    pub clipped: bool,
    /// Step sizes used to build the lattice.
    pub steps: GridSteps,
}

/// Builds the full rectangular lattice over `bounds`.
///
/// Ids are assigned sequentially from `0` in row-major order.
///
/// # Errors
///
/// Returns [`GridError`] if the bounds or spacing are invalid.
pub fn build_rectangular(
    bounds: &RegionBounds,
    spacing_km: f64,
) -> Result<(Vec<GridCell>, GridSteps), GridError> {
    let steps = GridSteps::new(bounds, spacing_km)?;

    let lats = inclusive_steps(bounds.south, bounds.north, steps.lat_step);
    let lngs = inclusive_steps(bounds.west, bounds.east, steps.lng_step);

    let mut cells = Vec::with_capacity(lats.len() * lngs.len());
    for &lat in &lats {
        for &lng in &lngs {
            cells.push(GridCell::from_center(
                cells.len(),
                lat,
                lng,
                steps.lat_step,
                steps.lng_step,
            ));
        }
    }

    Ok((cells, steps))
}

/// Builds the analysis grid, clipping to `boundary` when one is given.
///
/// Clipping happens after the full rectangle is generated, so surviving
/// cells keep the ids they had in the rectangle. An empty result is valid.
///
/// # Errors
///
/// Returns [`GridError`] if the bounds or spacing are invalid.
pub fn build_grid(
    bounds: &RegionBounds,
    spacing_km: f64,
    boundary: Option<&Boundary>,
) -> Result<GridBuild, GridError> {
    let (cells, steps) = build_rectangular(bounds, spacing_km)?;
    let rectangular_count = cells.len();

    log::info!(
        "Created {rectangular_count} grid cells ({spacing_km} km spacing, \
         lat_step={:.6}, lng_step={:.6})",
        steps.lat_step,
        steps.lng_step
    );

    let Some(boundary) = boundary else {
        log::info!("No boundary polygon; keeping the rectangular grid");
        return Ok(GridBuild {
            cells,
            rectangular_count,
            clipped: false,
            steps,
        });
    };

    let cells = boundary.retain(cells, GridCell::center);
    let removed = rectangular_count - cells.len();

    log::info!(
        "After boundary filter: {} cells ({removed} removed outside boundary)",
        cells.len()
    );

    Ok(GridBuild {
        cells,
        rectangular_count,
        clipped: true,
        steps,
    })
}

fn validate(bounds: &RegionBounds, spacing_km: f64) -> Result<(), GridError> {
    if !bounds.is_valid() {
        return Err(GridError::InvalidBounds {
            north: bounds.north,
            south: bounds.south,
            east: bounds.east,
            west: bounds.west,
        });
    }

    if !spacing_km.is_finite() || spacing_km <= 0.0 {
        return Err(GridError::InvalidSpacing { spacing_km });
    }

    Ok(())
}

/// Values `start, start + step, ...` up to and including `end`.
///
/// Each value is computed from its index rather than by repeated addition
/// so rounding error does not accumulate across long rows.
fn inclusive_steps(start: f64, end: f64, step: f64) -> Vec<f64> {
    let mut values = Vec::new();
    let mut i = 0_u32;

    loop {
        let value = f64::from(i).mul_add(step, start);
        if value > end {
            break;
        }
        values.push(value);
        i += 1;
    }

    values
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    const MILAN: RegionBounds = RegionBounds {
        north: 45.535,
        south: 45.395,
        east: 9.280,
        west: 9.065,
    };

    #[test]
    fn deterministic_ids_and_order() {
        let (first, _) = build_rectangular(&MILAN, 0.5).unwrap();
        let (second, _) = build_rectangular(&MILAN, 0.5).unwrap();

        assert_eq!(first, second);
        for (idx, cell) in first.iter().enumerate() {
            assert_eq!(cell.cell_id, idx);
        }
    }

    #[test]
    fn row_major_order() {
        let (cells, _) = build_rectangular(&MILAN, 0.5).unwrap();
        assert!((cells[0].center_lat - MILAN.south).abs() < 1e-12);
        assert!((cells[0].center_lng - MILAN.west).abs() < 1e-12);
        // Longitude varies fastest within a row.
        assert!((cells[1].center_lat - cells[0].center_lat).abs() < 1e-12);
        assert!(cells[1].center_lng > cells[0].center_lng);
    }

    #[test]
    fn milan_cell_count_matches_inclusive_stepping() {
        let lat_step = 0.5 / 111.0;
        let center = f64::midpoint(MILAN.north, MILAN.south);
        let lng_step = 0.5 / (111.0 * center.to_radians().cos());
        let rows = ((MILAN.north - MILAN.south) / lat_step).ceil();
        let cols = ((MILAN.east - MILAN.west) / lng_step).ceil();

        let (cells, _) = build_rectangular(&MILAN, 0.5).unwrap();

        #[allow(clippy::cast_precision_loss)]
        let count = cells.len() as f64;
        assert!((count - rows * cols).abs() < f64::EPSILON, "{count} vs {}", rows * cols);
        assert_eq!(cells.len(), 32 * 34);
    }

    #[test]
    fn cell_bounds_are_half_a_step() {
        let (cells, steps) = build_rectangular(&MILAN, 0.5).unwrap();
        let cell = cells[40];
        assert!((cell.lat_max - cell.lat_min - steps.lat_step).abs() < 1e-12);
        assert!((cell.lng_max - cell.lng_min - steps.lng_step).abs() < 1e-12);
        assert!((cell.center_lat - cell.lat_min - steps.lat_step / 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let bounds = RegionBounds {
            north: 45.0,
            south: 45.5,
            east: 9.2,
            west: 9.0,
        };
        assert!(matches!(
            build_grid(&bounds, 0.5, None),
            Err(GridError::InvalidBounds { .. })
        ));

        let equal = RegionBounds {
            north: 45.5,
            south: 45.0,
            east: 9.0,
            west: 9.0,
        };
        assert!(matches!(
            build_grid(&equal, 0.5, None),
            Err(GridError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn rejects_bad_spacing() {
        for spacing in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                build_grid(&MILAN, spacing, None),
                Err(GridError::InvalidSpacing { .. })
            ));
        }
    }

    #[test]
    fn coarse_spacing_yields_single_cell() {
        let bounds = RegionBounds {
            north: 1.01,
            south: 1.00,
            east: 1.01,
            west: 1.00,
        };
        let build = build_grid(&bounds, 2.0, None).unwrap();
        assert_eq!(build.cells.len(), 1);
        assert_eq!(build.rectangular_count, 1);
        assert!(!build.clipped);
    }

    #[test]
    fn boundary_clipping_keeps_ids() {
        // Western half of the Milan rectangle.
        let boundary = Boundary::from_polygon(polygon![
            (x: 9.0, y: 45.3),
            (x: 9.17, y: 45.3),
            (x: 9.17, y: 45.6),
            (x: 9.0, y: 45.6),
            (x: 9.0, y: 45.3),
        ])
        .unwrap();

        let build = build_grid(&MILAN, 0.5, Some(&boundary)).unwrap();

        assert!(build.clipped);
        assert_eq!(build.rectangular_count, 32 * 34);
        assert!(!build.cells.is_empty());
        assert!(build.cells.len() < build.rectangular_count);
        assert!(build.cells.iter().all(|c| c.center_lng < 9.17));
        assert!(build.cells.windows(2).all(|w| w[0].cell_id < w[1].cell_id));

        let (full, _) = build_rectangular(&MILAN, 0.5).unwrap();
        for cell in &build.cells {
            assert_eq!(full[cell.cell_id], *cell);
        }
    }

    #[test]
    fn boundary_excluding_everything_is_valid() {
        let boundary = Boundary::from_polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ])
        .unwrap();

        let build = build_grid(&MILAN, 0.5, Some(&boundary)).unwrap();
        assert!(build.cells.is_empty());
        assert_eq!(build.rectangular_count, 32 * 34);
    }
}
