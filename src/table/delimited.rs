use csv::ReaderBuilder;
use std::io::Cursor;

use crate::error::Result;

/// Read a CSV blob: first record is the header, every later record must have
/// the same field count, blank lines are skipped. Empty fields become `None`.
pub(super) fn read_rows(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<Option<String>>>)> {
    // Excel-saved exports often carry a UTF-8 BOM
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(bytes));

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|f| (!f.is_empty()).then(|| f.to_string()))
                .collect(),
        );
    }

    Ok((headers, rows))
}
