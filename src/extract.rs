use crate::raster::RasterGrid;

/// One valid raster pixel as a geographic point.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelRecord {
    pub lat: f64,
    pub lon: f64,
    pub dn: f64,
}

/// Whether a DN value is dropped before any further processing.
///
/// A pixel is invalid when its value is NaN or equals the no-data sentinel
/// exactly; nothing else is filtered here.
pub fn is_invalid(dn: f64, nodata: f64) -> bool {
    dn.is_nan() || dn == nodata
}

/// Lazy iterator over valid pixels in row-major order (row ascending, then
/// column ascending). Calling this again yields a fresh pass over the grid.
pub fn valid_pixels(grid: &RasterGrid, nodata: f64) -> impl Iterator<Item = PixelRecord> + '_ {
    grid.data.indexed_iter().filter_map(move |((row, col), &dn)| {
        if is_invalid(dn, nodata) {
            return None;
        }
        let (lon, lat) = grid.transform.pixel_to_lonlat(row, col);
        Some(PixelRecord { lat, lon, dn })
    })
}

/// Number of pixels the validity rule drops, for the extraction summary.
pub fn count_invalid(grid: &RasterGrid, nodata: f64) -> usize {
    grid.data.iter().filter(|&&dn| is_invalid(dn, nodata)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{GeoTransform, RasterGrid};
    use ndarray::arr2;

    fn test_grid(values: ndarray::Array2<f64>) -> RasterGrid {
        RasterGrid::new(values, GeoTransform::new([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]))
    }

    #[test]
    fn test_skips_nodata_and_nan() {
        let grid = test_grid(arr2(&[[5.0, 0.0], [f64::NAN, 3.0]]));
        let records: Vec<_> = valid_pixels(&grid, 0.0).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dn, 5.0);
        assert_eq!(records[1].dn, 3.0);
        assert_eq!(count_invalid(&grid, 0.0), 2);
    }

    #[test]
    fn test_row_major_order() {
        let grid = test_grid(arr2(&[[1.0, 2.0], [3.0, 4.0]]));
        let dns: Vec<f64> = valid_pixels(&grid, 0.0).map(|r| r.dn).collect();
        assert_eq!(dns, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_restartable() {
        let grid = test_grid(arr2(&[[1.0, 0.0], [3.0, 4.0]]));
        let first: Vec<_> = valid_pixels(&grid, 0.0).collect();
        let second: Vec<_> = valid_pixels(&grid, 0.0).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_nonzero_sentinel() {
        let grid = test_grid(arr2(&[[-9999.0, 2.0]]));
        let dns: Vec<f64> = valid_pixels(&grid, -9999.0).map(|r| r.dn).collect();
        assert_eq!(dns, vec![2.0]);
        // 0.0 is a legitimate value under a different sentinel
        let grid = test_grid(arr2(&[[0.0, 2.0]]));
        assert_eq!(valid_pixels(&grid, -9999.0).count(), 2);
    }

    #[test]
    fn test_coordinates_at_pixel_center() {
        let grid = test_grid(arr2(&[[7.0]]));
        let record = valid_pixels(&grid, 0.0).next().unwrap();
        assert!((record.lon - 0.5).abs() < 1e-12);
        assert!((record.lat - -0.5).abs() < 1e-12);
    }
}
