//! Country-name canonicalization.
//!
//! Boundary shapefiles name several sub-national territories as if they were
//! independent countries. The alias table folds those into their parent
//! country before aggregation; the exclusion set removes entities with no
//! meaningful merge target. Both are fixed tables loaded once per run.

use log::debug;
use std::collections::{HashMap, HashSet};

/// Raw polygon-derived name -> canonical country name.
///
/// Canonical names never appear as keys, so applying the table twice is a
/// no-op (idempotence is asserted in tests).
const ALIASES: &[(&str, &str)] = &[
    ("Guadeloupe", "France"),
    ("Réunion", "France"),
    ("Mayotte", "France"),
    ("French Guiana", "France"),
    ("Martinique", "France"),
    ("French Southern Territories", "France"),
    ("Wallis and Futuna", "France"),
    ("Saint Barthelemy", "France"),
    ("Saint Pierre and Miquelon", "France"),
    ("Madeira", "Portugal"),
    ("Azores", "Portugal"),
    ("Guernsey", "United Kingdom"),
    ("Jersey", "United Kingdom"),
    ("Anguilla", "United Kingdom"),
    ("Montserrat", "United Kingdom"),
    ("Saint Helena", "United Kingdom"),
    ("Falkland Islands", "United Kingdom"),
    ("South Georgia and South Sandwich Islands", "United Kingdom"),
    ("British Indian Ocean Territory", "United Kingdom"),
    ("Norfolk Island", "Australia"),
    ("Christmas Island", "Australia"),
    ("Heard Island and McDonald Islands", "Australia"),
    ("Cocos Islands", "Australia"),
    ("Sint Maarten", "Netherlands"),
    ("Bonaire", "Netherlands"),
    ("Saba", "Netherlands"),
    ("Saint Eustatius", "Netherlands"),
    ("Niue", "New Zealand"),
    ("Canarias", "Spain"),
    ("Svalbard", "Norway"),
    ("Côte d'Ivoire", "Cote d'Ivoire"),
];

/// Entities removed entirely after canonicalization.
const EXCLUDED: &[&str] = &["Vatican City", "Saint Martin", "Cook Islands", "Bouvet Island"];

/// Immutable alias table plus exclusion set, shared read-only across a run.
#[derive(Debug, Clone)]
pub struct NameTable {
    aliases: HashMap<String, String>,
    excluded: HashSet<String>,
}

impl NameTable {
    /// The fixed table used by the production pipeline.
    pub fn builtin() -> Self {
        Self::from_tables(
            ALIASES.iter().map(|&(raw, canon)| (raw.to_owned(), canon.to_owned())),
            EXCLUDED.iter().map(|&name| name.to_owned()),
        )
    }

    pub fn from_tables(
        aliases: impl IntoIterator<Item = (String, String)>,
        excluded: impl IntoIterator<Item = String>,
    ) -> Self {
        let table = Self {
            aliases: aliases.into_iter().collect(),
            excluded: excluded.into_iter().collect(),
        };
        debug!(
            "Name table loaded: {} aliases, {} excluded entities",
            table.aliases.len(),
            table.excluded.len()
        );
        table
    }

    /// Canonical name for `raw`; names without an alias map to themselves.
    pub fn canonical<'a>(&'a self, raw: &'a str) -> &'a str {
        self.aliases.get(raw).map(String::as_str).unwrap_or(raw)
    }

    /// Whether `name` (already canonicalized) must be dropped from output.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }
}
