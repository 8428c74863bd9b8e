// src/report/xlsx.rs

//! Minimal single-sheet SpreadsheetML writer.
//!
//! Every zip entry carries the fixed DOS epoch as its modification time and
//! no document properties are written, so the same report always produces
//! the same bytes.

use std::fmt::Write as _;
use std::io::{Cursor, Seek, Write};
use zip::{write::SimpleFileOptions, CompressionMethod, DateTime, ZipWriter};

use super::{Report, UnifiedRecord};
use crate::error::{PipelineError, Result};

pub const SHEET_NAME: &str = "Sheet1";
/// Digits after the point for float columns.
pub const FLOAT_DECIMALS: usize = 10;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

/// Serialize `report` into `.xlsx` bytes.
pub fn to_xlsx_bytes(report: &Report) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    write_xlsx(report, &mut buf)?;
    Ok(buf.into_inner())
}

pub fn write_xlsx<W: Write + Seek>(report: &Report, out: W) -> Result<()> {
    let parts: [(&str, String); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/styles.xml", STYLES.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(report)?),
    ];

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(out);
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }
    zip.finish()?;
    Ok(())
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    )
}

fn sheet_xml(report: &Report) -> Result<String> {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    xml.push_str(r#"<row r="1">"#);
    for (c, name) in report.columns().iter().enumerate() {
        push_text(&mut xml, c, 1, name, 1);
    }
    xml.push_str("</row>");

    let columns = report.columns();
    let integer_units = report.platform.integer_units();
    for (i, rec) in report.records.iter().enumerate() {
        let r = i + 2;
        for (col, v) in [(4, rec.units), (5, rec.revenue)] {
            if !v.is_finite() {
                return Err(PipelineError::NonFiniteValue {
                    column: columns[col].to_string(),
                    row: r,
                });
            }
        }
        let _ = write!(xml, r#"<row r="{}">"#, r);
        push_record(&mut xml, r, rec, integer_units);
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    Ok(xml)
}

/// Numeric cells must be finite.
fn push_record(xml: &mut String, r: usize, rec: &UnifiedRecord, integer_units: bool) {
    push_text(xml, 0, r, &rec.date, 0);
    push_text(xml, 1, r, &rec.title, 0);
    push_text(xml, 2, r, &rec.platform, 0);
    if let Some(region) = &rec.region {
        push_text(xml, 3, r, region, 0);
    }
    let units = if integer_units {
        format!("{:.0}", rec.units)
    } else {
        format_float(rec.units)
    };
    push_number(xml, 4, r, &units);
    push_number(xml, 5, r, &format_float(rec.revenue));
}

/// Fixed ten-decimal rendering used for every float cell.
pub fn format_float(v: f64) -> String {
    format!("{:.*}", FLOAT_DECIMALS, v)
}

fn cell_ref(col: usize, row: usize) -> String {
    // six columns, single letters are enough
    format!("{}{}", (b'A' + col as u8) as char, row)
}

fn push_text(xml: &mut String, col: usize, row: usize, text: &str, style: u8) {
    let _ = write!(
        xml,
        r#"<c r="{}" s="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
        cell_ref(col, row),
        style,
        escape(text)
    );
}

fn push_number(xml: &mut String, col: usize, row: usize, value: &str) {
    let _ = write!(xml, r#"<c r="{}"><v>{}</v></c>"#, cell_ref(col, row), value);
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Platform;
    use std::io::Read;
    use zip::ZipArchive;

    fn report(platform: Platform) -> Report {
        Report {
            platform,
            title: "HOK".into(),
            records: vec![
                UnifiedRecord {
                    date: "Jan 01, 2023".into(),
                    title: "HOK".into(),
                    platform: platform.label().into(),
                    region: Some("APAC & <Oceania>".into()),
                    units: 12.0,
                    revenue: 1000.0,
                },
                UnifiedRecord {
                    date: "Jan 01, 2023".into(),
                    title: "HOK".into(),
                    platform: platform.label().into(),
                    region: None,
                    units: 0.0,
                    revenue: 0.125,
                },
            ],
        }
    }

    fn sheet_of(bytes: &[u8]) -> String {
        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut s = String::new();
        zip.by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut s)
            .unwrap();
        s
    }

    #[test]
    fn writes_header_and_fixed_precision_values() {
        let bytes = to_xlsx_bytes(&report(Platform::GooglePlay)).unwrap();
        let sheet = sheet_of(&bytes);

        assert!(sheet.contains(">Gross daily revenue</t>"));
        assert!(sheet.contains(r#"<c r="E2"><v>12</v></c>"#));
        assert!(sheet.contains(r#"<c r="F2"><v>1000.0000000000</v></c>"#));
        assert!(sheet.contains(r#"<c r="F3"><v>0.1250000000</v></c>"#));
        assert!(sheet.contains("APAC &amp; &lt;Oceania&gt;"));
        // null region leaves the cell out
        assert!(!sheet.contains(r#"r="D3""#));
    }

    #[test]
    fn app_store_units_are_floats() {
        let bytes = to_xlsx_bytes(&report(Platform::AppStore)).unwrap();
        let sheet = sheet_of(&bytes);
        assert!(sheet.contains(r#"<c r="E2"><v>12.0000000000</v></c>"#));
        assert!(sheet.contains(">Revenue</t>"));
    }

    #[test]
    fn overflowed_sum_is_refused() {
        let mut r = report(Platform::GooglePlay);
        r.records[1].revenue = f64::INFINITY;
        match to_xlsx_bytes(&r).unwrap_err() {
            PipelineError::NonFiniteValue { column, row } => {
                assert_eq!(column, "Gross daily revenue");
                assert_eq!(row, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut r = report(Platform::AppStore);
        r.records[0].units = f64::NAN;
        assert!(matches!(
            to_xlsx_bytes(&r).unwrap_err(),
            PipelineError::NonFiniteValue { row: 2, .. }
        ));
    }

    #[test]
    fn output_is_byte_identical_across_runs() {
        let a = to_xlsx_bytes(&report(Platform::AppStore)).unwrap();
        let b = to_xlsx_bytes(&report(Platform::AppStore)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn package_has_all_parts() {
        let bytes = to_xlsx_bytes(&report(Platform::AppStore)).unwrap();
        let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = zip.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/styles.xml",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
            ]
        );
    }
}
