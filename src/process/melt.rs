use arrow::{
    array::{Array, Float64Array, StringArray},
    record_batch::RecordBatch,
};

use crate::error::{PipelineError, Result};

/// One cell of a wide table, reshaped.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    /// Identifier cells of the source row, in `id_vars` order.
    pub ids: Vec<Option<String>>,
    /// Header of the value column the cell came from.
    pub category: String,
    pub value: Option<f64>,
}

/// Wide → long. `id_vars` must be `Utf8` columns and `value_vars` `Float64`
/// columns of `batch`. Records come out column-major: every row of the first
/// value column, then every row of the next.
pub fn melt(batch: &RecordBatch, id_vars: &[usize], value_vars: &[usize]) -> Result<Vec<LongRecord>> {
    let schema = batch.schema();
    let ids: Vec<&StringArray> = id_vars
        .iter()
        .map(|&i| {
            batch
                .column(i)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| wrong_type(schema.field(i).name(), "text"))
        })
        .collect::<Result<_>>()?;

    let mut out = Vec::with_capacity(batch.num_rows() * value_vars.len());
    for &v in value_vars {
        let name = schema.field(v).name();
        let values = batch
            .column(v)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| wrong_type(name, "numeric"))?;

        for row in 0..batch.num_rows() {
            out.push(LongRecord {
                ids: ids
                    .iter()
                    .map(|a| (!a.is_null(row)).then(|| a.value(row).to_string()))
                    .collect(),
                category: name.clone(),
                value: (!values.is_null(row)).then(|| values.value(row)),
            });
        }
    }
    Ok(out)
}

fn wrong_type(column: &str, wanted: &str) -> PipelineError {
    PipelineError::Arrow(arrow::error::ArrowError::InvalidArgumentError(format!(
        "melt: column `{}` is not {}",
        column, wanted
    )))
}
