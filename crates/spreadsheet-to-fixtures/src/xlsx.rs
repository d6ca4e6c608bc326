//! Minimal SpreadsheetML package writer.

use std::io::{self, Cursor, Write};

use spreadsheet_to_core::address::column_to_letters;
use spreadsheet_to_core::CellValue;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::FixtureSheet;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Knobs for [`xlsx_bytes`].
#[derive(Debug, Clone)]
pub struct XlsxFixtureOptions {
    /// Write a `<dimension ref>` element in each sheet
    pub dimension: bool,
    /// Store text in `xl/sharedStrings.xml` rather than as inline strings
    pub shared_strings: bool,
    /// Write `r` attributes on rows and cells
    pub cell_refs: bool,
    /// Write the `name` attribute on `<sheet>` elements
    pub sheet_names: bool,
    /// Rows and columns written to `<dimension ref>` instead of the sheet's own size
    pub declared_size: Option<(u32, u32)>,
}

impl Default for XlsxFixtureOptions {
    fn default() -> Self {
        Self {
            dimension: true,
            shared_strings: true,
            cell_refs: true,
            sheet_names: true,
            declared_size: None,
        }
    }
}

/// Build a `.xlsx` file containing `sheets`.
pub fn xlsx_bytes(sheets: &[FixtureSheet], options: &XlsxFixtureOptions) -> io::Result<Vec<u8>> {
    let mut shared: Vec<String> = Vec::new();
    let parts: Vec<String> = sheets
        .iter()
        .map(|sheet| sheet_xml(sheet, &mut shared, options))
        .collect();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", file)?;
    zip.write_all(content_types(sheets.len(), options.shared_strings).as_bytes())?;

    zip.start_file("_rels/.rels", file)?;
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
        )
        .as_bytes(),
    )?;

    zip.start_file("xl/workbook.xml", file)?;
    let mut workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>"#
    );
    for (i, sheet) in sheets.iter().enumerate() {
        let name = if options.sheet_names {
            format!(r#" name="{}""#, escape(&sheet.name))
        } else {
            String::new()
        };
        workbook.push_str(&format!(
            r#"<sheet{name} sheetId="{id}" r:id="rId{id}"/>"#,
            id = i + 1
        ));
    }
    workbook.push_str("</sheets></workbook>");
    zip.write_all(workbook.as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", file)?;
    let mut rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_REL_NS}">"#
    );
    for i in 1..=sheets.len() {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    if options.shared_strings {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{REL_NS}/sharedStrings" Target="sharedStrings.xml"/>"#,
            sheets.len() + 1
        ));
    }
    rels.push_str("</Relationships>");
    zip.write_all(rels.as_bytes())?;

    if options.shared_strings {
        zip.start_file("xl/sharedStrings.xml", file)?;
        let mut sst = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="{MAIN_NS}" count="{n}" uniqueCount="{n}">"#,
            n = shared.len()
        );
        for s in &shared {
            sst.push_str(&format!("<si><t>{}</t></si>", escape(s)));
        }
        sst.push_str("</sst>");
        zip.write_all(sst.as_bytes())?;
    }

    for (i, part) in parts.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), file)?;
        zip.write_all(part.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn content_types(sheet_count: usize, shared_strings: bool) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    if shared_strings {
        xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    }
    xml.push_str("</Types>");
    xml
}

fn sheet_xml(sheet: &FixtureSheet, shared: &mut Vec<String>, options: &XlsxFixtureOptions) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{MAIN_NS}">"#
    );
    if options.dimension {
        let width = sheet.width();
        let span = if let Some((rows, columns)) = options.declared_size {
            format!("A1:{}{}", column_to_letters(columns - 1), rows)
        } else if sheet.rows.is_empty() || width == 0 {
            "A1".to_string()
        } else {
            format!("A1:{}{}", column_to_letters(width as u32 - 1), sheet.rows.len())
        };
        xml.push_str(&format!(r#"<dimension ref="{span}"/>"#));
    }

    xml.push_str("<sheetData>");
    for (r, row) in sheet.rows.iter().enumerate() {
        if options.cell_refs {
            xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        } else {
            xml.push_str("<row>");
        }
        for (c, value) in row.iter().enumerate() {
            let reference = if options.cell_refs {
                format!(r#" r="{}{}""#, column_to_letters(c as u32), r + 1)
            } else {
                String::new()
            };
            xml.push_str(&cell_xml(&reference, value, shared, options));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn cell_xml(
    reference: &str,
    value: &CellValue,
    shared: &mut Vec<String>,
    options: &XlsxFixtureOptions,
) -> String {
    match value {
        CellValue::Empty => format!("<c{reference}/>"),
        CellValue::Number(n) => format!("<c{reference}><v>{n}</v></c>"),
        CellValue::Boolean(b) => format!(r#"<c{reference} t="b"><v>{}</v></c>"#, u8::from(*b)),
        CellValue::Error(e) => format!(r#"<c{reference} t="e"><v>{}</v></c>"#, escape(e.as_str())),
        CellValue::String(s) if options.shared_strings => {
            let index = match shared.iter().position(|e| e == s) {
                Some(i) => i,
                None => {
                    shared.push(s.clone());
                    shared.len() - 1
                }
            };
            format!(r#"<c{reference} t="s"><v>{index}</v></c>"#)
        }
        CellValue::String(s) => {
            format!(r#"<c{reference} t="inlineStr"><is><t>{}</t></is></c>"#, escape(s))
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
