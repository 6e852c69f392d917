use crate::error::{PipelineError, Result};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::LayerAccess;
use gdal::Dataset;
use geo::{Geometry, MultiPolygon};
use log::{debug, info, warn};
use std::path::Path;

/// A named country boundary in EPSG:4326 (longitude/latitude degrees).
#[derive(Debug, Clone)]
pub struct CountryPolygon {
    pub name: String,
    pub geom: MultiPolygon<f64>,
}

/// Load country polygons from an OGR datasource (shapefile, GeoPackage, ...),
/// reprojecting to EPSG:4326 when the source CRS differs.
///
/// The load order of features is preserved; it is the stable ordering the
/// assigner's tie-break relies on. A missing or unparseable CRS is fatal,
/// since points could not be classified against it meaningfully.
pub fn load_countries(path: &Path, name_field: &str) -> Result<Vec<CountryPolygon>> {
    info!("Loading country boundaries: {}", path.display());
    let dataset = Dataset::open(path)?;
    let mut layer = dataset.layer(0)?;

    let source_srs = layer.spatial_ref().ok_or_else(|| {
        PipelineError::ProjectionMismatch(path.to_owned(), "layer has no CRS defined".into())
    })?;

    // Reprojection is set up once for the whole layer, never per feature.
    let reproject = match source_srs.auth_code() {
        Ok(4326) => {
            debug!("Boundary layer already in EPSG:4326");
            None
        }
        _ => {
            info!("Reprojecting boundary layer to EPSG:4326");
            let mut target = SpatialRef::from_epsg(4326)
                .map_err(|e| PipelineError::ProjectionMismatch(path.to_owned(), e.to_string()))?;
            target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
            let transform = CoordTransform::new(&source_srs, &target)
                .map_err(|e| PipelineError::ProjectionMismatch(path.to_owned(), e.to_string()))?;
            Some(transform)
        }
    };

    let mut polygons = Vec::new();
    let mut skipped = 0usize;

    for feature in layer.features() {
        let name = match feature.field_as_string_by_name(name_field)? {
            Some(name) if !name.is_empty() => name,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let Some(geometry) = feature.geometry() else {
            warn!("Feature '{}' has no geometry, skipping", name);
            skipped += 1;
            continue;
        };

        let geometry = match &reproject {
            Some(transform) => geometry.transform(transform)?,
            None => geometry.clone(),
        };

        let geom = match geometry.to_geo()? {
            Geometry::MultiPolygon(mp) => mp,
            Geometry::Polygon(p) => MultiPolygon(vec![p]),
            _ => {
                warn!("Feature '{}' has non-polygonal geometry, skipping", name);
                skipped += 1;
                continue;
            }
        };

        polygons.push(CountryPolygon { name, geom });
    }

    if polygons.is_empty() {
        return Err(PipelineError::EmptyBoundaries(path.to_owned()));
    }

    info!(
        "Loaded {} country polygons ({} features skipped)",
        polygons.len(),
        skipped
    );
    Ok(polygons)
}
