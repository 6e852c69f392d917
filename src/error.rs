use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Boundary dataset {0:?}: {1}")]
    ProjectionMismatch(PathBuf, String),

    #[error("No usable country polygons in {0:?}")]
    EmptyBoundaries(PathBuf),

    #[error("{file:?}: required columns 'country' and 'dn' not found after normalization")]
    MissingColumns { file: PathBuf },

    #[error("{file:?}: cannot parse year from '{token}'")]
    YearParse { file: PathBuf, token: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
