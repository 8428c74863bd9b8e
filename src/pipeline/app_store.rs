// src/pipeline/app_store.rs

//! App Store Connect exports: a Units sheet and a Revenue sheet, each one row
//! per (Territory, Measure) with one column per month and a trailing Total,
//! plus a reference table laid out as country, country-code, region.
//!
//! The month headers are not read from the files. Both sheets are rebound
//! positionally to a fixed label list, so their column count must match that
//! list exactly.

use std::collections::HashMap;
use tracing::{info, instrument};

use crate::diagnostics::{Outcome, Warning};
use crate::error::{PipelineError, Result};
use crate::process::{
    aggregate::{outer_merge, GroupKey, RegionAggregate},
    convert::{convert_value_columns, NumericRule},
    date_parser::{month_labels, parse_month_label, render_ymd},
    melt::melt,
};
use crate::region::{RegionMap, Resolver};
use crate::report::{assemble, DateOrdering, Report};
use crate::table::WideTable;

use super::Platform;

pub const TERRITORY: &str = "Territory";
pub const MEASURE: &str = "Measure";
pub const TOTAL: &str = "Total";
pub const REGION: &str = "Region";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStoreOptions {
    pub title: String,
    /// Label of the first month column, `"Mon YYYY"`.
    pub first_month: String,
    pub month_count: usize,
}

impl Default for AppStoreOptions {
    fn default() -> Self {
        AppStoreOptions {
            title: Platform::AppStore.default_title().to_string(),
            first_month: "Jan 2023".into(),
            month_count: 17,
        }
    }
}

impl AppStoreOptions {
    /// Territory, Measure, every month label, Total.
    pub fn column_labels(&self) -> Result<Vec<String>> {
        let mut labels = vec![TERRITORY.to_string(), MEASURE.to_string()];
        labels.extend(month_labels(&self.first_month, self.month_count)?);
        labels.push(TOTAL.to_string());
        Ok(labels)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppStoreInputs {
    pub regions: Option<WideTable>,
    pub units: Option<WideTable>,
    pub revenue: Option<WideTable>,
}

#[instrument(level = "info", skip_all, fields(title = %opts.title))]
pub fn run(inputs: AppStoreInputs, opts: &AppStoreOptions) -> Result<Outcome<Report>> {
    let (regions, units, revenue) = match (inputs.regions, inputs.units, inputs.revenue) {
        (Some(g), Some(u), Some(r)) => (g, u, r),
        (g, u, r) => {
            let missing: Vec<&str> = [
                (g.is_none(), "country/region reference table"),
                (u.is_none(), "units sheet"),
                (r.is_none(), "revenue sheet"),
            ]
            .iter()
            .filter(|(absent, _)| *absent)
            .map(|(_, what)| *what)
            .collect();
            return Err(PipelineError::MissingInput(missing.join(", ")));
        }
    };

    let labels = opts.column_labels()?;
    let layout = format!(
        "{}, {}, {} .. {}, {}",
        TERRITORY,
        MEASURE,
        labels[2],
        labels[labels.len() - 2],
        TOTAL
    );
    // check both shapes before doing any work
    let units = units.rebind_headers(&labels, &layout)?;
    let revenue = revenue.rebind_headers(&labels, &layout)?;

    let map = RegionMap::from_positional(&regions)?;
    info!(
        units_rows = units.num_rows(),
        revenue_rows = revenue.num_rows(),
        regions = map.len(),
        "inputs loaded"
    );

    let dates: HashMap<&str, String> = labels[2..labels.len() - 1]
        .iter()
        .map(|l| Ok((l.as_str(), render_ymd(parse_month_label(l)?))))
        .collect::<Result<_>>()?;

    let mut resolver = Resolver::new(&map);
    let units_agg = aggregate_metric(units, &dates, &mut resolver)?;
    let revenue_agg = aggregate_metric(revenue, &dates, &mut resolver)?;

    let mut warnings: Vec<Warning> = resolver.finish().into_iter().collect();
    let merged = outer_merge(&units_agg, &revenue_agg);
    info!(groups = merged.len(), "merged units and revenue");

    let assembled = assemble(
        merged,
        Platform::AppStore,
        &opts.title,
        DateOrdering::Lexicographic,
    );
    warnings.extend(assembled.warnings);
    Ok(Outcome::with_warnings(assembled.value, warnings))
}

/// Attach regions, melt the month columns, cast and group one sheet.
fn aggregate_metric(
    table: WideTable,
    dates: &HashMap<&str, String>,
    resolver: &mut Resolver<'_>,
) -> Result<RegionAggregate> {
    let territory = table.text_column(0);
    let regions: Vec<Option<String>> = territory
        .iter()
        .map(|t| t.and_then(|t| resolver.resolve(t)).map(str::to_string))
        .collect();
    let table = table.with_column(REGION, regions)?;

    let region_idx = table.num_columns() - 1;
    let month_idx: Vec<usize> = (2..region_idx - 1).collect();
    let batch = convert_value_columns(&table, &month_idx, &NumericRule::Float)?;
    let long = melt(&batch, &[0, region_idx], &month_idx)?;

    Ok(long
        .into_iter()
        .map(|rec| {
            let date = dates
                .get(rec.category.as_str())
                .cloned()
                .unwrap_or(rec.category);
            let region = rec.ids.into_iter().nth(1).flatten();
            (
                GroupKey {
                    date,
                    region,
                },
                rec.value,
            )
        })
        .collect())
}
