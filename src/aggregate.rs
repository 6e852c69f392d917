use crate::assign::LabeledPoint;
use crate::error::{PipelineError, Result};
use crate::extract::PixelRecord;
use crate::names::NameTable;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One row of the aggregated dataset: summed DN for a canonical country in
/// one year. Aggregation guarantees a single row per (country, year) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryYearTotal {
    pub country: String,
    pub year: i32,
    pub dn: f64,
}

/// Sum DN by canonical country for one year.
///
/// Boundary-misses are dropped here (and counted, separately from the
/// no-data pixels the extractor never emitted). Canonicalization happens
/// before the group-by, so sub-national territories fold into their parent
/// country instead of producing spurious rows.
pub fn aggregate(labeled: &[LabeledPoint], year: i32, names: &NameTable) -> Vec<CountryYearTotal> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut misses = 0usize;

    for point in labeled {
        match &point.country {
            None => misses += 1,
            Some(raw) => {
                *totals.entry(names.canonical(raw).to_owned()).or_default() += point.record.dn;
            }
        }
    }

    debug!(
        "Year {}: {} countries, {} boundary-misses excluded from totals",
        year,
        totals.len(),
        misses
    );

    totals
        .into_iter()
        .map(|(country, dn)| CountryYearTotal { country, year, dn })
        .collect()
}

/// Year token of a per-year file: first `_`-separated piece of the stem,
/// e.g. `1993.csv` and `1993_cleaned.csv` both parse to 1993.
pub fn year_from_stem(path: &Path) -> Result<i32> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let token = stem.split('_').next().unwrap_or("");
    token.parse().map_err(|_| PipelineError::YearParse {
        file: path.to_owned(),
        token: token.to_owned(),
    })
}

/// Resolved positions of the recognized columns in a per-year CSV header.
/// Matching is case-insensitive and `dn_value` is accepted for `dn`.
pub(crate) struct CsvColumns {
    pub country: usize,
    pub dn: usize,
    pub lat: Option<usize>,
    pub lon: Option<usize>,
}

pub(crate) fn resolve_columns(headers: &csv::StringRecord, file: &Path) -> Result<CsvColumns> {
    let mut country = None;
    let mut dn = None;
    let mut lat = None;
    let mut lon = None;

    for (idx, header) in headers.iter().enumerate() {
        match header.trim().to_lowercase().as_str() {
            "country" => country = Some(idx),
            "dn" | "dn_value" => dn = Some(idx),
            "latitude" => lat = Some(idx),
            "longitude" => lon = Some(idx),
            _ => {}
        }
    }

    match (country, dn) {
        (Some(country), Some(dn)) => Ok(CsvColumns { country, dn, lat, lon }),
        _ => Err(PipelineError::MissingColumns { file: file.to_owned() }),
    }
}

/// Write the per-pixel extraction output: one row per labeled point, with
/// an empty COUNTRY field for boundary-misses.
pub fn write_labeled_csv(path: &Path, labeled: &[LabeledPoint]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Latitude", "Longitude", "DN", "COUNTRY"])?;
    for point in labeled {
        writer.write_record([
            point.record.lat.to_string(),
            point.record.lon.to_string(),
            point.record.dn.to_string(),
            point.country.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    info!("Wrote {} labeled points to {}", labeled.len(), path.display());
    Ok(())
}

/// Read a per-pixel CSV back into labeled points. Fails with
/// `MissingColumns` when the required columns are absent; rows whose DN
/// field does not parse are skipped with a warning.
pub fn read_labeled_csv(path: &Path) -> Result<Vec<LabeledPoint>> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns = resolve_columns(reader.headers()?, path)?;

    let mut labeled = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Ok(dn) = record.get(columns.dn).unwrap_or("").trim().parse::<f64>() else {
            warn!(
                "{}: skipping row with unparseable dn '{}'",
                path.display(),
                record.get(columns.dn).unwrap_or("")
            );
            continue;
        };
        let parse_coord = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };
        let country = match record.get(columns.country).map(str::trim) {
            Some("") | None => None,
            Some(name) => Some(name.to_owned()),
        };
        labeled.push(LabeledPoint {
            record: PixelRecord {
                lat: parse_coord(columns.lat),
                lon: parse_coord(columns.lon),
                dn,
            },
            country,
        });
    }
    Ok(labeled)
}

#[derive(Serialize)]
struct YearRow<'a> {
    country: &'a str,
    dn: f64,
}

/// Write the per-year cleaned table: `country,dn`, one row per country.
pub fn write_year_csv(path: &Path, totals: &[CountryYearTotal]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for total in totals {
        writer.serialize(YearRow { country: &total.country, dn: total.dn })?;
    }
    writer.flush()?;
    info!("Wrote {} country totals to {}", totals.len(), path.display());
    Ok(())
}

/// Aggregate every per-pixel CSV in `input_dir` into a per-year cleaned CSV
/// in `output_dir`. Files with a bad schema or an unparseable year are
/// skipped with a warning; the rest of the run continues.
pub fn clean_directory(input_dir: &Path, output_dir: &Path, names: &NameTable) -> Result<usize> {
    let mut processed = 0usize;
    for path in crate::concat::csv_files(input_dir)? {
        let year = match year_from_stem(&path) {
            Ok(year) => year,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let labeled = match read_labeled_csv(&path) {
            Ok(labeled) => labeled,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let totals = aggregate(&labeled, year, names);
        write_year_csv(&output_dir.join(format!("{year}.csv")), &totals)?;
        processed += 1;
    }
    Ok(processed)
}
