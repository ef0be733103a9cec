//! North-up population grids in geographic coordinates.

use opportunity_map_grid_models::RegionBounds;

use crate::PopulationError;

/// A source of population estimates at arbitrary points.
pub trait PopulationRaster: Send + Sync {
    /// Estimated population of the pixel containing `(lat, lng)`.
    ///
    /// Returns `0.0` outside coverage and for no-data pixels.
    fn sample(&self, lat: f64, lng: f64) -> f64;
}

/// In-memory north-up raster with square-degree pixels.
///
/// Row 0 is the northern edge; column 0 is the western edge. Negative and
/// non-finite values are treated as no-data.
#[derive(Debug, Clone)]
pub struct GridRaster {
    west: f64,
    north: f64,
    pixel_width: f64,
    pixel_height: f64,
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl GridRaster {
    /// Creates a raster whose top-left corner is `(north, west)`.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::InvalidRaster`] if the pixel size is not
    /// positive or `values` does not hold `width * height` entries.
    pub fn new(
        west: f64,
        north: f64,
        pixel_width: f64,
        pixel_height: f64,
        width: usize,
        height: usize,
        values: Vec<f32>,
    ) -> Result<Self, PopulationError> {
        if !(pixel_width > 0.0 && pixel_height > 0.0) {
            return Err(PopulationError::InvalidRaster {
                message: format!("pixel size must be positive, got {pixel_width} x {pixel_height}"),
            });
        }

        if values.len() != width * height {
            return Err(PopulationError::InvalidRaster {
                message: format!(
                    "expected {width} x {height} = {} values, got {}",
                    width * height,
                    values.len()
                ),
            });
        }

        Ok(Self {
            west,
            north,
            pixel_width,
            pixel_height,
            width,
            height,
            values,
        })
    }

    /// Raster width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Raster height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn pixel_of(&self, lat: f64, lng: f64) -> Option<(usize, usize)> {
        let col = ((lng - self.west) / self.pixel_width).floor();
        let row = ((self.north - lat) / self.pixel_height).floor();

        let inside = col >= 0.0
            && row >= 0.0
            && col < self.width as f64
            && row < self.height as f64;

        inside.then(|| (row as usize, col as usize))
    }

    /// Copies the pixels covering `bounds` into a new raster.
    ///
    /// Returns `None` if `bounds` does not intersect the raster.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn crop(&self, bounds: &RegionBounds) -> Option<Self> {
        let clamp_col = |lng: f64| {
            ((lng - self.west) / self.pixel_width)
                .floor()
                .clamp(0.0, self.width as f64)
        };
        let clamp_row = |lat: f64| {
            ((self.north - lat) / self.pixel_height)
                .floor()
                .clamp(0.0, self.height as f64)
        };

        let (col_start, col_end, row_start, row_end) = (
            clamp_col(bounds.west) as usize,
            (clamp_col(bounds.east) as usize + 1).min(self.width),
            clamp_row(bounds.north) as usize,
            (clamp_row(bounds.south) as usize + 1).min(self.height),
        );

        if col_start >= col_end || row_start >= row_end {
            return None;
        }

        let width = col_end - col_start;
        let height = row_end - row_start;
        let mut values = Vec::with_capacity(width * height);
        for row in row_start..row_end {
            let offset = row * self.width;
            values.extend_from_slice(&self.values[offset + col_start..offset + col_end]);
        }

        Some(Self {
            west: (col_start as f64).mul_add(self.pixel_width, self.west),
            north: (row_start as f64).mul_add(-self.pixel_height, self.north),
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
            width,
            height,
            values,
        })
    }
}

impl PopulationRaster for GridRaster {
    fn sample(&self, lat: f64, lng: f64) -> f64 {
        self.pixel_of(lat, lng)
            .map(|(row, col)| f64::from(self.values[row * self.width + col]))
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0)
    }
}
