use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ntl-pipeline")]
#[command(about = "Aggregate night-time-light DN values by country and year")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Number of threads (default: all available)
    #[arg(short, long, value_name = "N", global = true)]
    pub threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract valid pixels from a raster and assign each to a country
    Extract {
        /// Input GeoTIFF path (single-band NTL raster)
        #[arg(short, long, value_name = "FILE")]
        raster: String,

        /// Country boundary datasource (shapefile or any OGR source)
        #[arg(short, long, value_name = "PATH")]
        boundaries: PathBuf,

        /// Attribute field holding the country name
        #[arg(long, value_name = "NAME", default_value = "COUNTRY")]
        name_field: String,

        /// Override no-data value (default: band metadata, else 0)
        #[arg(long, value_name = "VALUE")]
        nodata: Option<f64>,

        /// Output CSV path (per-pixel labeled points)
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Aggregate per-pixel CSVs into per-year country totals
    Aggregate {
        /// Directory of per-pixel CSVs named by year (e.g. 1993.csv)
        #[arg(short, long, value_name = "DIR")]
        input_dir: PathBuf,

        /// Directory for the cleaned per-year CSVs
        #[arg(short, long, value_name = "DIR")]
        output_dir: PathBuf,
    },

    /// Concatenate per-year cleaned CSVs into one country-year table
    Concat {
        /// Directory of cleaned per-year CSVs
        #[arg(short, long, value_name = "DIR")]
        input_dir: PathBuf,

        /// Output CSV path (country,year,dn)
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}
