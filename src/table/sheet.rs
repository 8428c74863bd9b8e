use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use crate::error::{PipelineError, Result};

/// Read the first worksheet of a workbook. The first row is the header;
/// blank header cells are named `Unnamed: <i>` and fully blank rows dropped.
pub(super) fn read_rows(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<Option<String>>>)> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::Spreadsheet("workbook has no worksheets".into()))??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(r) => r
            .iter()
            .enumerate()
            .map(|(i, c)| cell_text(c).unwrap_or_else(|| format!("Unnamed: {}", i)))
            .collect(),
        None => Vec::new(),
    };

    let data = rows
        .map(|r| r.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|r| r.iter().any(Option::is_some))
        .collect();

    Ok((headers, data))
}

/// Render a cell as the text a CSV export would have carried.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE".into() } else { "FALSE".into() }),
        other => Some(other.to_string()),
    }
}
