// Library exports for testing and reuse

pub mod aggregate;
pub mod assign;
pub mod cli;
pub mod concat;
pub mod countries;
pub mod error;
pub mod extract;
pub mod names;
pub mod raster;

// Re-export commonly used types
pub use aggregate::{aggregate, CountryYearTotal};
pub use assign::{assign_grid, assign_points, AssignStats, CountryIndex, LabeledPoint};
pub use concat::{concat_directory, concatenate, YearTable};
pub use countries::{load_countries, CountryPolygon};
pub use error::{PipelineError, Result};
pub use extract::{valid_pixels, PixelRecord};
pub use names::NameTable;
pub use raster::{read_raster, GeoTransform, RasterGrid, RasterMetadata};
