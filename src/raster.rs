use crate::error::{PipelineError, Result};
use gdal::raster::RasterBand;
use gdal::Dataset;
use log::{debug, info};
use ndarray::Array2;

/// GDAL-style six-element affine geotransform mapping pixel indices to
/// geographic coordinates.
#[derive(Debug, Clone, Copy)]
pub struct GeoTransform([f64; 6]);

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    /// Geographic coordinates of the pixel *center* at (row, col).
    ///
    /// The half-pixel offset matters: sampling at the corner instead would
    /// shift every downstream country assignment by half a pixel.
    pub fn pixel_to_lonlat(&self, row: usize, col: usize) -> (f64, f64) {
        let gt = &self.0;
        let x = col as f64 + 0.5;
        let y = row as f64 + 0.5;
        let lon = gt[0] + x * gt[1] + y * gt[2];
        let lat = gt[3] + x * gt[4] + y * gt[5];
        (lon, lat)
    }
}

/// Single-band DN grid with its affine transform. Read once per run,
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    pub data: Array2<f64>,
    pub transform: GeoTransform,
}

impl RasterGrid {
    pub fn new(data: Array2<f64>, transform: GeoTransform) -> Self {
        Self { data, transform }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }
}

#[derive(Debug, Clone)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub geotransform: [f64; 6],
    pub projection: String,
    pub nodata: Option<f64>,
}

/// Read band 1 of a GeoTIFF into memory along with its metadata.
pub fn read_raster(path: &str) -> Result<(RasterGrid, RasterMetadata)> {
    info!("Opening input raster: {}", path);
    let dataset = Dataset::open(path)?;

    let rasterband: RasterBand = dataset.rasterband(1)?;

    let width = rasterband.x_size() as usize;
    let height = rasterband.y_size() as usize;

    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions(width, height));
    }

    let nodata = rasterband.no_data_value();
    let geotransform = dataset.geo_transform()?;

    debug!("Raster dimensions: {}x{}", width, height);
    debug!("Geotransform: {:?}", geotransform);

    let buffer = rasterband.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
    let data_vec: Vec<f64> = buffer.into_iter().collect();
    let data = Array2::from_shape_vec((height, width), data_vec)?;

    let metadata = RasterMetadata {
        width,
        height,
        geotransform,
        projection: dataset.projection(),
        nodata,
    };

    Ok((RasterGrid::new(data, GeoTransform::new(geotransform)), metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_center_offset() {
        // 1-degree pixels anchored at (-180, 90), north-up.
        let gt = GeoTransform::new([-180.0, 1.0, 0.0, 90.0, 0.0, -1.0]);
        let (lon, lat) = gt.pixel_to_lonlat(0, 0);
        assert!((lon - -179.5).abs() < 1e-12);
        assert!((lat - 89.5).abs() < 1e-12);
    }

    #[test]
    fn test_transform_row_col_order() {
        let gt = GeoTransform::new([-180.0, 1.0, 0.0, 90.0, 0.0, -1.0]);
        // Row advances latitude, column advances longitude.
        let (lon, lat) = gt.pixel_to_lonlat(10, 3);
        assert!((lon - -176.5).abs() < 1e-12);
        assert!((lat - 79.5).abs() < 1e-12);
    }
}
