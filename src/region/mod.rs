// src/region/mod.rs

//! Country → region lookup.
//!
//! Matching is exact and case-sensitive. When the reference table lists a
//! country twice, the later row wins. Rows with an empty country or region
//! are skipped, so such a country resolves as unmapped.

use std::collections::HashMap;
use tracing::debug;

use crate::diagnostics::{DistinctList, Warning};
use crate::error::{PipelineError, Result};
use crate::table::WideTable;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionMap {
    lookup: HashMap<String, String>,
}

impl RegionMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RegionMap {
            lookup: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Reference table with literal country and region headers.
    pub fn from_named_columns(
        table: &WideTable,
        country_column: &str,
        region_column: &str,
    ) -> Result<Self> {
        let c = table.require_column(country_column)?;
        let r = table.require_column(region_column)?;
        Ok(Self::from_columns(table, c, r))
    }

    /// Reference table laid out as country, country-code, region (any
    /// further columns ignored). Headers are not consulted.
    pub fn from_positional(table: &WideTable) -> Result<Self> {
        if table.num_columns() < 3 {
            return Err(PipelineError::SchemaShapeMismatch {
                table: table.name().to_string(),
                expected: 3,
                found: table.num_columns(),
                layout: "Country, Country Code, Region".into(),
            });
        }
        Ok(Self::from_columns(table, 0, 2))
    }

    fn from_columns(table: &WideTable, country: usize, region: usize) -> Self {
        let pairs = (0..table.num_rows()).filter_map(|row| {
            Some((table.cell(row, country)?, table.cell(row, region)?))
        });
        let map = Self::from_pairs(pairs);
        debug!(table = %table.name(), entries = map.len(), "loaded region map");
        map
    }

    /// `None` means unmapped.
    pub fn resolve(&self, country: &str) -> Option<&str> {
        self.lookup.get(country).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

/// Resolves countries while remembering which ones missed, so a whole
/// invocation yields at most one unmapped warning.
#[derive(Debug)]
pub struct Resolver<'a> {
    map: &'a RegionMap,
    unmapped: DistinctList,
}

impl<'a> Resolver<'a> {
    pub fn new(map: &'a RegionMap) -> Self {
        Resolver {
            map,
            unmapped: DistinctList::default(),
        }
    }

    pub fn resolve(&mut self, country: &str) -> Option<&'a str> {
        let hit = self.map.resolve(country);
        if hit.is_none() {
            self.unmapped.push(country);
        }
        hit
    }

    /// The aggregated warning, if anything missed.
    pub fn finish(self) -> Option<Warning> {
        if self.unmapped.is_empty() {
            None
        } else {
            Some(Warning::UnmappedRegions {
                names: self.unmapped.into_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(headers: &[&str], rows: &[&[Option<&str>]]) -> WideTable {
        WideTable::from_rows(
            "regions.xlsx",
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn named_columns_exact_match_only() {
        let t = reference(
            &["国家名称", "所属区域"],
            &[&[Some("Japan"), Some("APAC")], &[Some("Germany"), Some("EU")]],
        );
        let map = RegionMap::from_named_columns(&t, "国家名称", "所属区域").unwrap();
        assert_eq!(map.resolve("Japan"), Some("APAC"));
        assert_eq!(map.resolve("japan"), None);
        assert_eq!(map.resolve(" Japan"), None);
    }

    #[test]
    fn missing_named_column_is_an_error() {
        let t = reference(&["Country", "Region"], &[]);
        let err = RegionMap::from_named_columns(&t, "国家名称", "所属区域").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn positional_uses_first_and_third_column_last_row_wins() {
        let t = reference(
            &["anything", "code", "whatever"],
            &[
                &[Some("Japan"), Some("JP"), Some("APAC")],
                &[Some("Mexico"), Some("MX"), None],
                &[Some("Japan"), Some("JP"), Some("Japan & Korea")],
            ],
        );
        let map = RegionMap::from_positional(&t).unwrap();
        assert_eq!(map.resolve("Japan"), Some("Japan & Korea"));
        assert_eq!(map.resolve("Mexico"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn positional_needs_three_columns() {
        let t = reference(&["Country", "Region"], &[]);
        assert!(matches!(
            RegionMap::from_positional(&t).unwrap_err(),
            PipelineError::SchemaShapeMismatch { expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn resolution_is_pure() {
        let map = RegionMap::from_pairs([("Japan", "APAC")]);
        let mut a = Resolver::new(&map);
        let mut b = Resolver::new(&map);
        for c in ["Japan", "Wakanda", "Japan"] {
            assert_eq!(a.resolve(c), b.resolve(c));
        }
        assert_eq!(a.resolve("Japan"), map.resolve("Japan"));
    }

    #[test]
    fn one_warning_for_many_misses() {
        let map = RegionMap::from_pairs([("Japan", "APAC")]);
        let mut r = Resolver::new(&map);
        for c in ["Wakanda", "Japan", "Wakanda", "Genovia"] {
            r.resolve(c);
        }
        assert_eq!(
            r.finish(),
            Some(Warning::UnmappedRegions {
                names: vec!["Wakanda".into(), "Genovia".into()]
            })
        );

        let r = Resolver::new(&map);
        assert_eq!(r.finish(), None);
    }
}
