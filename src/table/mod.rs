// src/table/mod.rs

//! Raw input tables.
//!
//! A [`WideTable`] keeps every cell exactly as the source file spelled it:
//! all columns are nullable `Utf8`, an empty cell is a null, and column order
//! is the file's order. Numeric coercion happens later in `process::convert`.

mod delimited;
mod sheet;

use arrow::{
    array::{Array, ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::Arc,
};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Input encodings the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    /// Anything calamine opens: xlsx, xls, xlsb, ods.
    Spreadsheet,
}

impl TableFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(TableFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(TableFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// Parse `bytes` in `format` into a table called `name`.
pub fn parse(name: &str, bytes: &[u8], format: TableFormat) -> Result<WideTable> {
    let (headers, rows) = match format {
        TableFormat::Csv => delimited::read_rows(bytes)?,
        TableFormat::Spreadsheet => sheet::read_rows(bytes)?,
    };
    debug!(table = %name, columns = headers.len(), rows = rows.len(), "parsed table");
    WideTable::from_rows(name, headers, rows)
}

/// Read and parse a file, choosing the format by extension.
pub fn load(path: &Path) -> Result<WideTable> {
    let format = TableFormat::from_path(path).ok_or_else(|| {
        PipelineError::MissingInput(format!(
            "{} (unsupported extension, expected .csv/.xlsx/.xls)",
            path.display()
        ))
    })?;
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    parse(&name, &bytes, format)
}

/// A wide table of raw text cells.
#[derive(Debug, Clone)]
pub struct WideTable {
    name: String,
    batch: RecordBatch,
}

impl WideTable {
    /// Build from a header row and data rows. Short rows are padded with nulls.
    pub fn from_rows(
        name: &str,
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self> {
        if headers.is_empty() {
            return Err(PipelineError::EmptyTable(name.to_string()));
        }

        let mut columns: Vec<Vec<Option<String>>> =
            vec![Vec::with_capacity(rows.len()); headers.len()];
        for row in rows {
            let mut cells = row.into_iter();
            for col in columns.iter_mut() {
                col.push(cells.next().flatten());
            }
        }

        let arrays = columns
            .into_iter()
            .map(|c| Arc::new(StringArray::from(c)) as ArrayRef)
            .collect();
        Self::from_arrays(name, &headers, arrays)
    }

    fn from_arrays(name: &str, headers: &[String], arrays: Vec<ArrayRef>) -> Result<Self> {
        let fields: Vec<Field> = headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8, true))
            .collect();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(WideTable {
            name: name.to_string(),
            batch,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn headers(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Index of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.batch
            .schema()
            .fields()
            .iter()
            .position(|f| f.name() == name)
    }

    /// Like [`column_index`](Self::column_index) but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    pub fn text_column(&self, idx: usize) -> &StringArray {
        self.batch
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("WideTable columns are always Utf8")
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        let arr = self.text_column(col);
        if arr.is_null(row) {
            None
        } else {
            Some(arr.value(row))
        }
    }

    /// Replace every header positionally. The label count must equal the
    /// column count; `layout` describes the expected shape for the error.
    pub fn rebind_headers(self, labels: &[String], layout: &str) -> Result<Self> {
        let found = self.num_columns();
        if labels.len() != found {
            return Err(PipelineError::SchemaShapeMismatch {
                table: self.name,
                expected: labels.len(),
                found,
                layout: layout.to_string(),
            });
        }
        let arrays = self.batch.columns().to_vec();
        Self::from_arrays(&self.name, labels, arrays)
    }

    /// Append a text column at the end.
    pub fn with_column(self, header: &str, values: Vec<Option<String>>) -> Result<Self> {
        let mut headers = self.headers();
        let mut arrays = self.batch.columns().to_vec();
        headers.push(header.to_string());
        arrays.push(Arc::new(StringArray::from(values)) as ArrayRef);
        Self::from_arrays(&self.name, &headers, arrays)
    }

    /// Stack tables row-wise in the given order. Columns are aligned by
    /// header; the result holds the union of headers in first-seen order and
    /// cells a table lacks become nulls. A header repeated inside one table
    /// keeps every copy: the n-th `X` of each table lines up with the n-th
    /// `X` of the others.
    pub fn concat(name: &str, tables: &[WideTable]) -> Result<Self> {
        let mut headers: Vec<String> = Vec::new();
        let mut slots: HashMap<(String, usize), usize> = HashMap::new();
        for t in tables {
            for key in occurrence_keys(t.headers()) {
                if !slots.contains_key(&key) {
                    slots.insert(key.clone(), headers.len());
                    headers.push(key.0);
                }
            }
        }

        let total: usize = tables.iter().map(|t| t.num_rows()).sum();
        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(total); headers.len()];
        for t in tables {
            let mut own: Vec<Option<usize>> = vec![None; headers.len()];
            for (idx, key) in occurrence_keys(t.headers()).into_iter().enumerate() {
                if let Some(&slot) = slots.get(&key) {
                    own[slot] = Some(idx);
                }
            }
            for (out, src) in columns.iter_mut().zip(own) {
                match src {
                    Some(idx) => {
                        let arr = t.text_column(idx);
                        out.extend(arr.iter().map(|v| v.map(str::to_string)));
                    }
                    None => out.extend(std::iter::repeat(None).take(t.num_rows())),
                }
            }
        }

        let arrays = columns
            .into_iter()
            .map(|c| Arc::new(StringArray::from(c)) as ArrayRef)
            .collect();
        Self::from_arrays(name, &headers, arrays)
    }
}

/// Pair each header with how many times it already appeared before it.
fn occurrence_keys(headers: Vec<String>) -> Vec<(String, usize)> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|h| {
            let n = seen.entry(h.clone()).or_insert(0);
            let key = (h, *n);
            *n += 1;
            key
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> WideTable {
        WideTable::from_rows(
            name,
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| {
                    r.iter()
                        .map(|c| (!c.is_empty()).then(|| c.to_string()))
                        .collect()
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            TableFormat::from_path(Path::new("units_2023.CSV")),
            Some(TableFormat::Csv)
        );
        assert_eq!(
            TableFormat::from_path(Path::new("sales.xls")),
            Some(TableFormat::Spreadsheet)
        );
        assert_eq!(TableFormat::from_path(Path::new("notes.pdf")), None);
    }

    #[test]
    fn short_rows_are_padded() {
        let t = table("t", &["Date", "A", "B"], &[&["d1", "1"]]);
        assert_eq!(t.cell(0, 1), Some("1"));
        assert_eq!(t.cell(0, 2), None);
    }

    #[test]
    fn concat_aligns_by_header() {
        let a = table("a", &["Date", "X:Japan"], &[&["d1", "1"]]);
        let b = table("b", &["Date", "X:Korea", "X:Japan"], &[&["d2", "5", "2"]]);
        let c = WideTable::concat("units", &[a, b]).unwrap();

        assert_eq!(c.headers(), vec!["Date", "X:Japan", "X:Korea"]);
        assert_eq!(c.num_rows(), 2);
        assert_eq!(c.cell(1, 0), Some("d2"));
        assert_eq!(c.cell(1, 1), Some("2"));
        assert_eq!(c.cell(0, 2), None);
        assert_eq!(c.cell(1, 2), Some("5"));
    }

    #[test]
    fn concat_keeps_repeated_headers() {
        let a = table("a", &["Date", "X:Japan", "X:Japan"], &[&["d1", "1", "2"]]);
        let b = table("b", &["Date", "X:Japan"], &[&["d2", "7"]]);
        let c = WideTable::concat("units", &[a, b]).unwrap();

        assert_eq!(c.headers(), vec!["Date", "X:Japan", "X:Japan"]);
        assert_eq!(c.cell(0, 1), Some("1"));
        assert_eq!(c.cell(0, 2), Some("2"));
        assert_eq!(c.cell(1, 1), Some("7"));
        assert_eq!(c.cell(1, 2), None);
    }

    #[test]
    fn rebind_rejects_wrong_arity() {
        let t = table("sales.xls", &["a", "b", "c"], &[&["1", "2", "3"]]);
        let err = t
            .clone()
            .rebind_headers(&["x".to_string(), "y".to_string()], "two columns")
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SchemaShapeMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));

        let labels: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let t = t.rebind_headers(&labels, "three columns").unwrap();
        assert_eq!(t.headers(), labels);
        assert_eq!(t.cell(0, 2), Some("3"));
    }

    #[test]
    fn empty_header_is_rejected() {
        let err = WideTable::from_rows("blank.csv", vec![], vec![]).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyTable(_)));
    }
}
