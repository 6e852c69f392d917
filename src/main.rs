use clap::Parser;
use env_logger::Env;
use log::info;

use ntl_pipeline::cli::{Cli, Command};
use ntl_pipeline::error::Result;
use ntl_pipeline::names::NameTable;
use ntl_pipeline::{aggregate, assign, concat, countries, extract, raster};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Some(n_threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()
            .expect("Failed to build thread pool");
        info!("Using {} threads", n_threads);
    }

    let names = NameTable::builtin();

    match cli.command {
        Command::Extract {
            raster,
            boundaries,
            name_field,
            nodata,
            output,
        } => {
            let (grid, metadata) = raster::read_raster(&raster)?;
            info!("Raster size: {}x{}", metadata.width, metadata.height);

            // CLI override, then band metadata, then the NTL convention of 0
            let nodata = nodata.or(metadata.nodata).unwrap_or(0.0);
            info!("Using no-data sentinel: {}", nodata);

            let dropped = extract::count_invalid(&grid, nodata);
            info!(
                "{} of {} pixels are no-data or NaN",
                dropped,
                grid.rows() * grid.cols()
            );

            let polygons = countries::load_countries(&boundaries, &name_field)?;
            let index = assign::CountryIndex::build(&polygons);

            let (labeled, stats) = assign::assign_grid(&grid, nodata, &index);
            info!(
                "Extracted {} valid points ({} assigned, {} boundary-misses)",
                labeled.len(),
                stats.assigned,
                stats.unassigned
            );

            aggregate::write_labeled_csv(&output, &labeled)?;
        }

        Command::Aggregate {
            input_dir,
            output_dir,
        } => {
            std::fs::create_dir_all(&output_dir)?;
            let processed = aggregate::clean_directory(&input_dir, &output_dir, &names)?;
            info!("Aggregated {} per-year files", processed);
        }

        Command::Concat { input_dir, output } => {
            let totals = concat::concat_directory(&input_dir, &names)?;
            concat::write_concatenated_csv(&output, &totals)?;
        }
    }

    Ok(())
}
