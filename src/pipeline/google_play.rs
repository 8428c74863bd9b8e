// src/pipeline/google_play.rs

//! Play Console exports: one or more Units CSVs and one or more Revenue CSVs,
//! each a row per date with one column per country (`"<metric>:<Country>"`),
//! plus a reference table with literal country / region headers.

use tracing::{info, instrument};

use crate::config::GooglePlaySettings;
use crate::diagnostics::{Outcome, Warning};
use crate::error::{PipelineError, Result};
use crate::process::{
    aggregate::{outer_merge, GroupKey, RegionAggregate},
    convert::{convert_value_columns, NumericRule},
    date_parser::DateFormat,
    melt::melt,
    utils::extract_country_name,
};
use crate::region::{RegionMap, Resolver};
use crate::report::{assemble, DateOrdering, Report};
use crate::table::WideTable;

use super::Platform;

#[derive(Debug, Clone)]
pub struct GooglePlayOptions {
    pub title: String,
    /// Interprets the input Date cells and renders the output ones.
    pub date_format: DateFormat,
    pub currency_prefix: String,
    pub date_column: String,
    /// Columns that are neither the row key nor a country series.
    pub excluded_columns: Vec<String>,
    pub country_column: String,
    pub region_column: String,
}

impl GooglePlayOptions {
    /// Stock column names and currency prefix with the given title and format.
    pub fn new(title: &str, date_format: DateFormat) -> Self {
        let d = GooglePlaySettings::default();
        GooglePlayOptions {
            title: title.to_string(),
            date_format,
            currency_prefix: d.currency_prefix,
            date_column: d.date_column,
            excluded_columns: d.excluded_columns,
            country_column: d.country_column,
            region_column: d.region_column,
        }
    }
}

/// Files in upload order.
#[derive(Debug, Clone, Default)]
pub struct GooglePlayInputs {
    pub units: Vec<WideTable>,
    pub revenue: Vec<WideTable>,
    pub regions: Option<WideTable>,
}

#[instrument(level = "info", skip_all, fields(title = %opts.title))]
pub fn run(inputs: GooglePlayInputs, opts: &GooglePlayOptions) -> Result<Outcome<Report>> {
    let mut missing = Vec::new();
    if inputs.units.is_empty() {
        missing.push("units files");
    }
    if inputs.revenue.is_empty() {
        missing.push("revenue files");
    }
    if inputs.regions.is_none() {
        missing.push("country/region reference table");
    }
    let regions = match inputs.regions {
        Some(r) if missing.is_empty() => r,
        _ => return Err(PipelineError::MissingInput(missing.join(", "))),
    };

    let map = RegionMap::from_named_columns(&regions, &opts.country_column, &opts.region_column)?;
    let units = WideTable::concat("units", &inputs.units)?;
    let revenue = WideTable::concat("revenue", &inputs.revenue)?;
    info!(
        units_rows = units.num_rows(),
        revenue_rows = revenue.num_rows(),
        regions = map.len(),
        "inputs loaded"
    );

    let mut resolver = Resolver::new(&map);
    let units_agg = aggregate_metric(&units, &NumericRule::Units, opts, &mut resolver)?;
    let revenue_rule = NumericRule::Revenue {
        currency_prefix: opts.currency_prefix.clone(),
    };
    let revenue_agg = aggregate_metric(&revenue, &revenue_rule, opts, &mut resolver)?;

    let mut warnings: Vec<Warning> = resolver.finish().into_iter().collect();
    let merged = outer_merge(&units_agg, &revenue_agg);
    info!(groups = merged.len(), "merged units and revenue");

    let assembled = assemble(
        merged,
        Platform::GooglePlay,
        &opts.title,
        DateOrdering::Chronological(&opts.date_format),
    );
    warnings.extend(assembled.warnings);
    Ok(Outcome::with_warnings(assembled.value, warnings))
}

/// Normalize, melt, resolve and group one metric table.
fn aggregate_metric(
    table: &WideTable,
    rule: &NumericRule,
    opts: &GooglePlayOptions,
    resolver: &mut Resolver<'_>,
) -> Result<RegionAggregate> {
    let date_idx = table.require_column(&opts.date_column)?;
    let value_idx: Vec<usize> = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| **h != opts.date_column && !opts.excluded_columns.contains(h))
        .map(|(i, _)| i)
        .collect();

    let batch = convert_value_columns(table, &value_idx, rule)?;
    let long = melt(&batch, &[date_idx], &value_idx)?;

    Ok(long
        .into_iter()
        .map(|rec| {
            let region = resolver.resolve(extract_country_name(&rec.category));
            let date = rec.ids.into_iter().next().flatten().unwrap_or_default();
            (GroupKey::new(date, region), rec.value)
        })
        .collect())
}
