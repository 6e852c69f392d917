use crate::countries::CountryPolygon;
use crate::extract::{is_invalid, PixelRecord};
use crate::raster::RasterGrid;
use geo::{BoundingRect, Intersects, Point};
use log::{debug, info};
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};

/// A pixel record with its country assignment. `None` is a boundary-miss:
/// the point intersected no polygon. Misses are retained, not dropped, so
/// they can be counted separately from no-data pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub record: PixelRecord,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignStats {
    pub assigned: usize,
    pub unassigned: usize,
}

/// Bounding box of one polygon, carrying its position in the load order.
struct PolygonEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for PolygonEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over polygon bounding boxes. Candidate polygons come from the
/// tree; the exact test is geo's `intersects` predicate, so points on a
/// boundary count as inside (matching a left spatial join on "intersects").
pub struct CountryIndex<'a> {
    polygons: &'a [CountryPolygon],
    tree: RTree<PolygonEnvelope>,
}

impl<'a> CountryIndex<'a> {
    pub fn build(polygons: &'a [CountryPolygon]) -> Self {
        let envelopes: Vec<PolygonEnvelope> = polygons
            .iter()
            .enumerate()
            .filter_map(|(index, polygon)| {
                let rect = polygon.geom.bounding_rect()?;
                Some(PolygonEnvelope {
                    index,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();
        debug!("Built spatial index over {} polygon envelopes", envelopes.len());
        Self {
            polygons,
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// Country containing (lon, lat), or `None` for a boundary-miss.
    ///
    /// When overlapping polygons both intersect the point, the one loaded
    /// first wins; load order is stable, so the choice is deterministic.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&'a str> {
        let point = Point::new(lon, lat);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .filter(|candidate| self.polygons[candidate.index].geom.intersects(&point))
            .map(|candidate| candidate.index)
            .min()
            .map(|index| self.polygons[index].name.as_str())
    }
}

/// Label a point sequence one by one. Order of the input is preserved.
pub fn assign_points(
    points: impl Iterator<Item = PixelRecord>,
    index: &CountryIndex,
) -> (Vec<LabeledPoint>, AssignStats) {
    let labeled: Vec<LabeledPoint> = points
        .map(|record| {
            let country = index.locate(record.lon, record.lat).map(str::to_owned);
            LabeledPoint { record, country }
        })
        .collect();
    let stats = tally(&labeled);
    (labeled, stats)
}

/// Extract and label every valid pixel of a raster, sharding the grid by
/// row. Pixels are independent and the index is read-only, so the shards
/// need no coordination; row-major output order is preserved.
pub fn assign_grid(
    grid: &RasterGrid,
    nodata: f64,
    index: &CountryIndex,
) -> (Vec<LabeledPoint>, AssignStats) {
    let per_row: Vec<Vec<LabeledPoint>> = (0..grid.rows())
        .into_par_iter()
        .map(|row| {
            (0..grid.cols())
                .filter_map(|col| {
                    let dn = grid.data[[row, col]];
                    if is_invalid(dn, nodata) {
                        return None;
                    }
                    let (lon, lat) = grid.transform.pixel_to_lonlat(row, col);
                    let country = index.locate(lon, lat).map(str::to_owned);
                    Some(LabeledPoint {
                        record: PixelRecord { lat, lon, dn },
                        country,
                    })
                })
                .collect()
        })
        .collect();

    let labeled: Vec<LabeledPoint> = per_row.into_iter().flatten().collect();
    let stats = tally(&labeled);
    info!(
        "Assigned {} points to countries, {} boundary-misses",
        stats.assigned, stats.unassigned
    );
    (labeled, stats)
}

fn tally(labeled: &[LabeledPoint]) -> AssignStats {
    let assigned = labeled.iter().filter(|p| p.country.is_some()).count();
    AssignStats {
        assigned,
        unassigned: labeled.len() - assigned,
    }
}
