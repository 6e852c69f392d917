use crate::aggregate::{resolve_columns, year_from_stem, CountryYearTotal};
use crate::error::Result;
use crate::names::NameTable;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One per-year cleaned table, as loaded from disk.
#[derive(Debug, Clone)]
pub struct YearTable {
    pub year: i32,
    pub rows: Vec<(String, f64)>,
}

/// Merge per-year tables into one longitudinal table.
///
/// Partial sums accumulate in a single map keyed by (country, year) rather
/// than by repeated whole-table appends, so the merge is one pass and
/// order-independent. The alias table is re-applied (idempotent for rows
/// that were already canonical), then exclusion-set members are removed.
/// The result has exactly one row per (country, year) pair.
pub fn concatenate(
    tables: impl IntoIterator<Item = YearTable>,
    names: &NameTable,
) -> Vec<CountryYearTotal> {
    let mut totals: BTreeMap<(String, i32), f64> = BTreeMap::new();
    let mut excluded = 0usize;

    for table in tables {
        for (raw, dn) in table.rows {
            let canonical = names.canonical(&raw);
            if names.is_excluded(canonical) {
                debug!("Excluding entity '{}' ({})", canonical, table.year);
                excluded += 1;
                continue;
            }
            *totals.entry((canonical.to_owned(), table.year)).or_default() += dn;
        }
    }

    if excluded > 0 {
        info!("Removed {} rows for excluded entities", excluded);
    }

    totals
        .into_iter()
        .map(|((country, year), dn)| CountryYearTotal { country, year, dn })
        .collect()
}

/// CSV files directly under `dir`, sorted by name for a stable scan order.
pub(crate) fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
        .collect();
    files.sort();
    Ok(files)
}

/// Load one per-year cleaned CSV. The year comes from the file name; the
/// columns are matched case-insensitively with the `dn_value` alias.
pub fn read_year_table(path: &Path) -> Result<YearTable> {
    let year = year_from_stem(path)?;
    let mut reader = csv::Reader::from_path(path)?;
    let columns = resolve_columns(reader.headers()?, path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let country = record.get(columns.country).unwrap_or("").trim();
        if country.is_empty() {
            continue;
        }
        let Ok(dn) = record.get(columns.dn).unwrap_or("").trim().parse::<f64>() else {
            warn!(
                "{}: skipping row with unparseable dn '{}'",
                path.display(),
                record.get(columns.dn).unwrap_or("")
            );
            continue;
        };
        rows.push((country.to_owned(), dn));
    }
    Ok(YearTable { year, rows })
}

/// Concatenate every per-year CSV in a directory.
///
/// A file with a bad schema, an unparseable year, or a read failure is
/// skipped with a warning naming the file and reason; the run still
/// produces output for every file that loaded.
pub fn concat_directory(dir: &Path, names: &NameTable) -> Result<Vec<CountryYearTotal>> {
    let mut tables = Vec::new();
    for path in csv_files(dir)? {
        match read_year_table(&path) {
            Ok(table) => {
                info!("Loaded {} rows for year {}", table.rows.len(), table.year);
                tables.push(table);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(concatenate(tables, names))
}

/// Write the longitudinal table: `country,year,dn`.
pub fn write_concatenated_csv(path: &Path, totals: &[CountryYearTotal]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for total in totals {
        writer.serialize(total)?;
    }
    writer.flush()?;
    info!(
        "Wrote {} country-year rows to {}",
        totals.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;
    use std::fs;

    fn year_table(year: i32, rows: &[(&str, f64)]) -> YearTable {
        YearTable {
            year,
            rows: rows.iter().map(|&(c, dn)| (c.to_owned(), dn)).collect(),
        }
    }

    #[test]
    fn test_territory_folds_into_parent() {
        let tables = vec![year_table(1993, &[("Guadeloupe", 2.0), ("France", 10.0)])];
        let totals = concatenate(tables, &NameTable::builtin());
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].country, "France");
        assert_eq!(totals[0].year, 1993);
        assert_relative_eq!(totals[0].dn, 12.0);
    }

    #[test]
    fn test_no_duplicate_country_year_pairs() {
        let tables = vec![
            year_table(1993, &[("Jersey", 1.0), ("Guernsey", 2.0)]),
            year_table(1993, &[("United Kingdom", 4.0)]),
            year_table(1994, &[("United Kingdom", 8.0)]),
        ];
        let totals = concatenate(tables, &NameTable::builtin());
        let keys: HashSet<(&str, i32)> =
            totals.iter().map(|t| (t.country.as_str(), t.year)).collect();
        assert_eq!(keys.len(), totals.len());
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn test_order_independent_merge() {
        let a = year_table(1993, &[("France", 1.0)]);
        let b = year_table(1994, &[("France", 2.0)]);
        let c = year_table(1995, &[("France", 4.0)]);
        let names = NameTable::builtin();

        let batched = concatenate(vec![a.clone(), b.clone(), c.clone()], &names);
        let reversed = concatenate(vec![c, b, a], &names);
        assert_eq!(batched, reversed);
    }

    #[test]
    fn test_pairwise_merge_associative() {
        // Concatenating [1,2,3] then [4] equals merging all four at once:
        // the output of concatenate is a valid input table set again.
        let names = NameTable::builtin();
        let years: Vec<YearTable> = (1..=4)
            .map(|i| year_table(1990 + i, &[("Chile", i as f64)]))
            .collect();

        let all_at_once = concatenate(years.clone(), &names);

        let first_three = concatenate(years[..3].to_vec(), &names);
        let as_tables: Vec<YearTable> = first_three
            .into_iter()
            .map(|t| year_table(t.year, &[(t.country.as_str(), t.dn)]))
            .chain(std::iter::once(years[3].clone()))
            .collect();
        let pairwise = concatenate(as_tables, &names);

        assert_eq!(all_at_once, pairwise);
    }

    #[test]
    fn test_excluded_entities_never_appear() {
        let tables = vec![year_table(1993, &[("Vatican City", 3.0), ("Italy", 5.0)])];
        let totals = concatenate(tables, &NameTable::builtin());
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].country, "Italy");
    }

    #[test]
    fn test_directory_driver_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1993.csv"), "country,dn\nFrance,10.0\nGuadeloupe,2.0\n")
            .unwrap();
        fs::write(dir.path().join("1994.csv"), "COUNTRY,DN_value\nFrance,7.5\n").unwrap();
        // bad schema: no dn column
        fs::write(dir.path().join("1995.csv"), "country,luminosity\nFrance,1.0\n").unwrap();
        // year token not an integer
        fs::write(dir.path().join("notes.csv"), "country,dn\nFrance,1.0\n").unwrap();

        let totals = concat_directory(dir.path(), &NameTable::builtin()).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].year, 1993);
        assert_relative_eq!(totals[0].dn, 12.0);
        assert_eq!(totals[1].year, 1994);
        assert_relative_eq!(totals[1].dn, 7.5);
    }

    #[test]
    fn test_concatenated_csv_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concatenated.csv");
        let totals = vec![CountryYearTotal {
            country: "France".to_owned(),
            year: 1993,
            dn: 12.0,
        }];
        write_concatenated_csv(&path, &totals).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "country,year,dn\nFrance,1993,12.0\n");
    }
}
