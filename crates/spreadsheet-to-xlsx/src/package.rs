//! Package-level parts: content types, `xl/workbook.xml` and its
//! relationships.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use zip::ZipArchive;

use crate::error::{XlsxError, XlsxResult};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const WORKBOOK_PART: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// A `<sheet>` entry of the workbook part, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: Option<String>,
    pub r_id: Option<String>,
}

/// Fail unless the archive looks like an OOXML package.
pub fn check_content_types<R: Read + Seek>(archive: &mut ZipArchive<R>) -> XlsxResult<()> {
    if archive.by_name(CONTENT_TYPES_PART).is_err() {
        return Err(XlsxError::InvalidFormat(format!(
            "missing {CONTENT_TYPES_PART}"
        )));
    }
    Ok(())
}

/// Read the sheet list from `xl/workbook.xml`.
pub fn read_workbook_xml<R: Read + Seek>(archive: &mut ZipArchive<R>) -> XlsxResult<Vec<SheetEntry>> {
    let file = archive
        .by_name(WORKBOOK_PART)
        .map_err(|_| XlsxError::MissingPart(WORKBOOK_PART.into()))?;
    parse_workbook_xml(BufReader::new(file))
}

pub(crate) fn parse_workbook_xml<B: BufRead>(input: B) -> XlsxResult<Vec<SheetEntry>> {
    let mut xml_reader = Reader::from_reader(input);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut entry = SheetEntry {
                    name: None,
                    r_id: None,
                };
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => entry.name = Some(attr.unescape_value()?.into_owned()),
                        // The relationship id is namespaced; the prefix is usually `r`
                        key if key.ends_with(b":id") => {
                            entry.r_id = Some(attr.unescape_value()?.into_owned());
                        }
                        _ => {}
                    }
                }
                sheets.push(entry);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Map worksheet relationship ids to archive paths.
pub fn read_workbook_rels<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> XlsxResult<HashMap<String, String>> {
    let file = archive
        .by_name(WORKBOOK_RELS_PART)
        .map_err(|_| XlsxError::MissingPart(WORKBOOK_RELS_PART.into()))?;
    parse_workbook_rels(BufReader::new(file))
}

pub(crate) fn parse_workbook_rels<B: BufRead>(input: B) -> XlsxResult<HashMap<String, String>> {
    let mut xml_reader = Reader::from_reader(input);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let Some((id, path)) = worksheet_relationship(&e)? {
                    rels.insert(id, path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// `(Id, archive path)` of a worksheet relationship; other types are `None`.
fn worksheet_relationship(e: &BytesStart<'_>) -> XlsxResult<Option<(String, String)>> {
    let mut id = None;
    let mut target = None;
    let mut rel_type = None;

    for attr in e.attributes().flatten() {
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"Id" => id = Some(value),
            b"Target" => target = Some(value),
            b"Type" => rel_type = Some(value),
            _ => {}
        }
    }

    match (id, target, rel_type) {
        (Some(id), Some(target), Some(rel_type)) if rel_type.ends_with("/worksheet") => {
            Ok(Some((id, resolve_target(&target))))
        }
        _ => Ok(None),
    }
}

/// Targets are relative to `xl/` unless they start with `/`.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let relative = target.strip_prefix("./").unwrap_or(target);
            format!("xl/{relative}")
        }
    }
}
