//! Minimal SpreadsheetML (.xlsx) writer.
//!
//! Produces a single-sheet workbook: a bold header row followed by one row
//! per record. Text goes through a shared-strings table, integers and reals
//! are written as numeric cells.

use super::table::{Cell, OutputTable};
use crate::error::Result;
use indexmap::IndexSet;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Style 0 is the default, style 1 the bold header.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Write `table` as an .xlsx workbook at `path`, replacing any existing file.
pub fn write_xlsx(table: &OutputTable, path: &Path) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    let mut file = write_workbook(table, file)?;
    file.flush()?;
    Ok(())
}

/// Write the workbook package into any seekable sink.
pub fn write_workbook<W: Write + Seek>(table: &OutputTable, sink: W) -> Result<W> {
    let mut strings = SharedStrings::default();
    let sheet = sheet_xml(table, &mut strings);
    let workbook = workbook_xml();
    let shared = strings.to_xml();

    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(sink);

    let parts: [(&str, &str); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", &workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/styles.xml", STYLES),
        ("xl/sharedStrings.xml", &shared),
        ("xl/worksheets/sheet1.xml", &sheet),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?)
}

fn workbook_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
        ),
        SHEET_NAME
    )
}

#[derive(Default)]
struct SharedStrings {
    unique: IndexSet<String>,
    refs: usize,
}

impl SharedStrings {
    fn index_of(&mut self, s: &str) -> usize {
        self.refs += 1;
        match self.unique.get_index_of(s) {
            Some(i) => i,
            None => self.unique.insert_full(s.to_string()).0,
        }
    }

    fn to_xml(&self) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        let _ = write!(
            out,
            "\n<sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" count=\"{}\" uniqueCount=\"{}\">",
            self.refs,
            self.unique.len()
        );
        for s in &self.unique {
            let _ = write!(out, "<si><t xml:space=\"preserve\">{}</t></si>", xml_text(s));
        }
        out.push_str("</sst>");
        out
    }
}

fn sheet_xml(table: &OutputTable, strings: &mut SharedStrings) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push_str("\n<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\"><sheetData>");

    let header = table
        .header()
        .into_iter()
        .map(|label| if label.is_empty() { Cell::Empty } else { Cell::Text(label.to_string()) });
    write_row(&mut out, 1, header, 1, strings);

    for (i, row) in table.rows.iter().enumerate() {
        write_row(&mut out, i + 2, row.iter().cloned(), 0, strings);
    }

    out.push_str("</sheetData></worksheet>");
    out
}

fn write_row(
    out: &mut String,
    row_num: usize,
    cells: impl Iterator<Item = Cell>,
    style: u8,
    strings: &mut SharedStrings,
) {
    let _ = write!(out, "<row r=\"{}\">", row_num);
    for (col, cell) in cells.enumerate() {
        let cell_ref = format!("{}{}", column_name(col), row_num);
        let style_attr = if style == 0 { String::new() } else { format!(" s=\"{}\"", style) };
        match cell {
            Cell::Empty => {}
            Cell::Int(n) => {
                let _ = write!(out, "<c r=\"{}\"{}><v>{}</v></c>", cell_ref, style_attr, n);
            }
            Cell::Real(n) if n.is_finite() => {
                let _ = write!(out, "<c r=\"{}\"{}><v>{}</v></c>", cell_ref, style_attr, n);
            }
            // NaN and infinities have no numeric cell form.
            Cell::Real(n) => {
                let idx = strings.index_of(&n.to_string());
                let _ = write!(out, "<c r=\"{}\"{} t=\"s\"><v>{}</v></c>", cell_ref, style_attr, idx);
            }
            Cell::Text(s) => {
                let idx = strings.index_of(&s);
                let _ = write!(out, "<c r=\"{}\"{} t=\"s\"><v>{}</v></c>", cell_ref, style_attr, idx);
            }
        }
    }
    out.push_str("</row>");
}

/// Spreadsheet column letters: 0 -> A, 25 -> Z, 26 -> AA.
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Escape text for XML content, dropping characters XML 1.0 cannot carry.
fn xml_text(s: &str) -> String {
    let legal: String = s
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect();
    html_escape::encode_quoted_attribute(&legal).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn test_column_letters() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_escapes_markup_and_drops_controls() {
        assert_eq!(xml_text("a<b>&\u{1}c"), "a&lt;b&gt;&amp;c");
    }

    #[test]
    fn test_shared_strings_are_deduplicated() {
        let mut strings = SharedStrings::default();
        assert_eq!(strings.index_of("x"), 0);
        assert_eq!(strings.index_of("y"), 1);
        assert_eq!(strings.index_of("x"), 0);
        let xml = strings.to_xml();
        assert!(xml.contains("count=\"3\" uniqueCount=\"2\""));
    }

    #[test]
    fn test_package_has_all_parts() {
        let table = OutputTable {
            columns: vec![Some("Name".into()), Some("Age".into())],
            rows: vec![vec![Cell::Text("Bob".into()), Cell::Int(30)]],
        };
        let cursor = write_workbook(&table, Cursor::new(Vec::new())).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/sharedStrings.xml",
            "xl/worksheets/sheet1.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing {}", part);
        }

        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains(r#"<c r="A1" s="1" t="s"><v>0</v></c>"#));
        assert!(sheet.contains(r#"<c r="B2"><v>30</v></c>"#));
    }
}
