//! Single-band GeoTIFF population grids (e.g. `WorldPop` 100 m rasters).
//!
//! Georeferencing is read from the `ModelPixelScale` and `ModelTiepoint`
//! tags. Only north-up rasters in geographic coordinates are supported,
//! which is how `WorldPop` distributes its country mosaics.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use opportunity_map_grid_models::RegionBounds;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::PopulationError;
use crate::raster::GridRaster;

/// Loads a population raster, optionally keeping only the pixels that
/// cover `window`.
///
/// # Errors
///
/// Returns [`PopulationError`] if the file cannot be opened or decoded, or
/// lacks georeferencing tags.
pub fn read_geotiff(
    path: &Path,
    window: Option<&RegionBounds>,
) -> Result<GridRaster, PopulationError> {
    let display = path.display().to_string();
    let tiff_err = |source| PopulationError::Tiff {
        path: display.clone(),
        source,
    };
    let georef_err = |message: &str| PopulationError::MissingGeoreference {
        path: display.clone(),
        message: message.to_string(),
    };

    let file = File::open(path).map_err(|source| PopulationError::Io {
        path: display.clone(),
        source,
    })?;

    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(tiff_err)?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions().map_err(tiff_err)?;

    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| georef_err("missing ModelPixelScale tag"))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| georef_err("missing ModelTiepoint tag"))?;

    let (&[pixel_width, pixel_height, ..], &[tie_col, tie_row, _, tie_lng, tie_lat, ..]) =
        (scale.as_slice(), tiepoint.as_slice())
    else {
        return Err(georef_err("malformed ModelPixelScale or ModelTiepoint tag"));
    };

    let west = tie_col.mul_add(-pixel_width, tie_lng);
    let north = tie_row.mul_add(pixel_height, tie_lat);

    log::info!(
        "Reading population raster {display} ({width}x{height} px, {pixel_width:.6}° pixels)"
    );

    let values = to_f32(decoder.read_image().map_err(tiff_err)?);

    let raster = GridRaster::new(
        west,
        north,
        pixel_width,
        pixel_height,
        width as usize,
        height as usize,
        values,
    )?;

    let Some(window) = window else {
        return Ok(raster);
    };

    let cropped = raster
        .crop(window)
        .ok_or_else(|| PopulationError::InvalidRaster {
            message: format!("{display} does not cover the requested area"),
        })?;

    log::debug!(
        "Cropped population raster to {}x{} px",
        cropped.width(),
        cropped.height()
    );

    Ok(cropped)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn to_f32(image: DecodingResult) -> Vec<f32> {
    match image {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let err = read_geotiff(Path::new("/nonexistent/population.tif"), None).unwrap_err();
        assert!(matches!(err, PopulationError::Io { .. }));
    }

    #[test]
    fn non_tiff_is_decode_error() {
        let path = std::env::temp_dir().join(format!(
            "opportunity_map_population_not_tiff_{}.tif",
            std::process::id()
        ));
        std::fs::write(&path, b"definitely not a tiff").unwrap();

        let err = read_geotiff(&path, None).unwrap_err();
        assert!(matches!(err, PopulationError::Tiff { .. }));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn converts_integer_samples() {
        let values = to_f32(DecodingResult::I16(vec![-1, 0, 250]));
        assert_eq!(values, vec![-1.0, 0.0, 250.0]);
    }
}
