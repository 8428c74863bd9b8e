use arrow::{
    array::{Array, ArrayRef, Float64Builder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::process::utils::clean_str;
use crate::table::WideTable;

/// How a raw value cell becomes a number.
///
/// The Play rules are deliberately asymmetric: a bad revenue cell aborts the
/// run while a bad units cell counts as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericRule {
    /// Drop every occurrence of the currency prefix and the thousands
    /// separators, then parse. Unparsable text is fatal.
    Revenue { currency_prefix: String },
    /// Drop thousands separators and parse; anything unparsable is `0`.
    /// The value is truncated toward zero.
    Units,
    /// Plain float cast of an already numeric cell. Unparsable text is fatal.
    Float,
}

impl NumericRule {
    /// `Ok(None)` marks a missing value, which adds nothing to a sum.
    pub fn apply(&self, raw: Option<&str>) -> std::result::Result<Option<f64>, NotNumeric> {
        match self {
            NumericRule::Revenue { currency_prefix } => {
                let Some(raw) = raw else { return Ok(None) };
                let stripped = if currency_prefix.is_empty() {
                    raw.replace(',', "")
                } else {
                    raw.replace(currency_prefix.as_str(), "").replace(',', "")
                };
                parse_strict(&stripped)
            }
            NumericRule::Units => {
                let v = raw
                    .map(|r| clean_str(&r.replace(',', "")))
                    .and_then(|s| s.parse::<f64>().ok())
                    .filter(|v| v.is_finite())
                    .map(f64::trunc)
                    .unwrap_or(0.0);
                Ok(Some(v))
            }
            NumericRule::Float => match raw {
                Some(raw) => parse_strict(raw),
                None => Ok(None),
            },
        }
    }
}

/// A cell rejected by a strict rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotNumeric;

fn parse_strict(s: &str) -> std::result::Result<Option<f64>, NotNumeric> {
    let c = clean_str(s);
    if c.is_empty() {
        return Ok(None);
    }
    match c.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) if v.is_infinite() => Err(NotNumeric),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(NotNumeric),
    }
}

/// Convert the selected columns of `table` to `Float64` under `rule`.
/// Other columns pass through as text, keeping their position.
pub fn convert_value_columns(
    table: &WideTable,
    value_columns: &[usize],
    rule: &NumericRule,
) -> Result<RecordBatch> {
    let batch = table.batch();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut out = Vec::with_capacity(batch.num_columns());

    for (idx, fld) in batch.schema().fields().iter().enumerate() {
        if !value_columns.contains(&idx) {
            fields.push(fld.as_ref().clone());
            out.push(batch.column(idx).clone());
            continue;
        }

        let sarr = table.text_column(idx);
        let mut b = Float64Builder::with_capacity(sarr.len());
        for (row, cell) in sarr.iter().enumerate() {
            let v = rule.apply(cell).map_err(|_| PipelineError::NumericParse {
                table: table.name().to_string(),
                column: fld.name().clone(),
                row,
                value: cell.unwrap_or_default().to_string(),
            })?;
            b.append_option(v);
        }
        fields.push(Field::new(fld.name(), DataType::Float64, true));
        out.push(Arc::new(b.finish()) as ArrayRef);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), out).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Float64Array;

    fn revenue() -> NumericRule {
        NumericRule::Revenue {
            currency_prefix: "USD ".into(),
        }
    }

    #[test]
    fn revenue_strips_prefix_and_separators() {
        assert_eq!(revenue().apply(Some("USD 1,000.00")), Ok(Some(1000.0)));
        assert_eq!(revenue().apply(Some("USD 1,234,567.5")), Ok(Some(1_234_567.5)));
        assert_eq!(revenue().apply(Some("12.5")), Ok(Some(12.5)));
        assert_eq!(revenue().apply(None), Ok(None));
        assert_eq!(revenue().apply(Some("nan")), Ok(None));
        assert_eq!(revenue().apply(Some("EUR 3.00")), Err(NotNumeric));
    }

    #[test]
    fn units_are_lenient_and_truncated() {
        let r = NumericRule::Units;
        assert_eq!(r.apply(Some("N/A")), Ok(Some(0.0)));
        assert_eq!(r.apply(Some("1,204")), Ok(Some(1204.0)));
        assert_eq!(r.apply(Some("7.9")), Ok(Some(7.0)));
        assert_eq!(r.apply(Some("-2.5")), Ok(Some(-2.0)));
        assert_eq!(r.apply(Some("inf")), Ok(Some(0.0)));
        assert_eq!(r.apply(None), Ok(Some(0.0)));
    }

    #[test]
    fn float_cast_is_strict() {
        let r = NumericRule::Float;
        assert_eq!(r.apply(Some("500")), Ok(Some(500.0)));
        assert_eq!(r.apply(Some(" 12.75 ")), Ok(Some(12.75)));
        assert_eq!(r.apply(None), Ok(None));
        assert_eq!(r.apply(Some("five")), Err(NotNumeric));
        assert_eq!(r.apply(Some("inf")), Err(NotNumeric));
    }

    #[test]
    fn converts_only_selected_columns() {
        let t = WideTable::from_rows(
            "units.csv",
            vec!["Date".into(), "Units:Japan".into(), "Notes".into()],
            vec![
                vec![Some("d1".into()), Some("N/A".into()), Some("x".into())],
                vec![Some("d2".into()), Some("1,500".into()), None],
            ],
        )
        .unwrap();

        let batch = convert_value_columns(&t, &[1], &NumericRule::Units).unwrap();
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Utf8);
        let units = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(units.value(0), 0.0);
        assert_eq!(units.value(1), 1500.0);
        assert_eq!(units.null_count(), 0);
    }

    #[test]
    fn bad_revenue_cell_names_its_location() {
        let t = WideTable::from_rows(
            "revenue.csv",
            vec!["Date".into(), "Revenue:Japan".into()],
            vec![
                vec![Some("d1".into()), Some("USD 1.00".into())],
                vec![Some("d2".into()), Some("pending".into())],
            ],
        )
        .unwrap();

        match convert_value_columns(&t, &[1], &revenue()).unwrap_err() {
            PipelineError::NumericParse {
                table,
                column,
                row,
                value,
            } => {
                assert_eq!(table, "revenue.csv");
                assert_eq!(column, "Revenue:Japan");
                assert_eq!(row, 1);
                assert_eq!(value, "pending");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
