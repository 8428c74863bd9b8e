// src/report/mod.rs

//! Final report: constant metadata columns, fixed column order, sorting by
//! (Date, Region) and the `.xlsx` artifact.

pub mod xlsx;

use chrono::NaiveDateTime;
use std::cmp::Ordering;
use tracing::debug;

use crate::diagnostics::{DistinctList, Outcome, Warning};
use crate::error::Result;
use crate::pipeline::Platform;
use crate::process::aggregate::MergedRow;
use crate::process::date_parser::DateFormat;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedRecord {
    pub date: String,
    pub title: String,
    pub platform: String,
    pub region: Option<String>,
    pub units: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub platform: Platform,
    pub title: String,
    pub records: Vec<UnifiedRecord>,
}

impl Report {
    pub fn columns(&self) -> [&'static str; 6] {
        [
            "Date",
            "Title",
            "Platform",
            "Region",
            "Units",
            self.platform.revenue_column(),
        ]
    }

    pub fn file_name(&self) -> String {
        self.platform.output_file_name(&self.title)
    }

    pub fn to_artifact(&self) -> Result<Artifact> {
        Ok(Artifact {
            file_name: self.file_name(),
            mime: XLSX_MIME,
            bytes: xlsx::to_xlsx_bytes(self)?,
        })
    }
}

/// The downloadable file.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// How the Date column is ordered.
#[derive(Debug, Clone, Copy)]
pub enum DateOrdering<'a> {
    /// Plain string order; only valid for zero padded year-first dates.
    Lexicographic,
    /// Parse with the caller's format, sort by calendar value, render back
    /// with the same format. Unparsable dates keep their text and sort last.
    Chronological(&'a DateFormat),
}

/// Attach Title and Platform, sort by (Date, Region) and build the report.
/// Null regions sort after named ones for the same date.
pub fn assemble(
    rows: Vec<MergedRow>,
    platform: Platform,
    title: &str,
    ordering: DateOrdering<'_>,
) -> Outcome<Report> {
    let mut warnings = Vec::new();

    let mut keyed: Vec<(Option<NaiveDateTime>, MergedRow)> = match ordering {
        DateOrdering::Lexicographic => rows.into_iter().map(|r| (None, r)).collect(),
        DateOrdering::Chronological(format) => {
            let mut bad = DistinctList::default();
            let keyed: Vec<_> = rows
                .into_iter()
                .map(|r| {
                    let parsed = format.parse(&r.key.date);
                    if parsed.is_none() {
                        bad.push(&r.key.date);
                    }
                    (parsed, r)
                })
                .collect();
            if !bad.is_empty() {
                warnings.push(Warning::UnparsableDates {
                    format: format.pattern().to_string(),
                    values: bad.into_vec(),
                });
            }
            keyed
        }
    };

    keyed.sort_by(|(da, a), (db, b)| {
        let by_date = match ordering {
            DateOrdering::Lexicographic => a.key.date.cmp(&b.key.date),
            DateOrdering::Chronological(_) => nulls_last(da, db),
        };
        by_date.then_with(|| nulls_last(&a.key.region, &b.key.region))
    });

    let records: Vec<UnifiedRecord> = keyed
        .into_iter()
        .map(|(parsed, r)| {
            let date = match (ordering, parsed) {
                (DateOrdering::Chronological(format), Some(dt)) => format.render(&dt),
                _ => r.key.date,
            };
            UnifiedRecord {
                date,
                title: title.to_string(),
                platform: platform.label().to_string(),
                region: r.key.region,
                units: r.units,
                revenue: r.revenue,
            }
        })
        .collect();

    debug!(platform = %platform, rows = records.len(), "assembled report");
    Outcome::with_warnings(
        Report {
            platform,
            title: title.to_string(),
            records,
        },
        warnings,
    )
}

fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
