use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use spreadsheet_to::prelude::*;
use spreadsheet_to::{export_workbook, ExportOptions, Format};
use spreadsheet_to_fixtures::{
    letters_and_numbers, write_fixture, xls_bytes, xlsx_bytes, FixtureSheet, XlsFixtureOptions,
    XlsxFixtureOptions,
};

fn sheets() -> Vec<FixtureSheet> {
    vec![letters_and_numbers("Sheet1"), FixtureSheet::empty("Sheet2")]
}

fn xls_file(dir: &Path) -> PathBuf {
    let bytes = xls_bytes(&sheets(), &XlsFixtureOptions::default()).unwrap();
    write_fixture(dir, "book.xls", &bytes).unwrap()
}

fn xlsx_file(dir: &Path) -> PathBuf {
    let bytes = xlsx_bytes(&sheets(), &XlsxFixtureOptions::default()).unwrap();
    write_fixture(dir, "book.xlsx", &bytes).unwrap()
}

fn all_values(book: &dyn Workbook) -> Vec<Vec<Vec<CellValue>>> {
    book.worksheets()
        .map(|sheet| {
            sheet
                .rows()
                .map(|row| row.unwrap().values().to_vec())
                .collect()
        })
        .collect()
}

#[test]
fn test_dispatch_by_extension() {
    let dir = tempfile::tempdir().unwrap();

    let xls = open_spreadsheet(xls_file(dir.path())).unwrap();
    assert_eq!(xls.format(), Format::Xls);

    let xlsx = open_spreadsheet(xlsx_file(dir.path())).unwrap();
    assert_eq!(xlsx.format(), Format::Xlsx);

    // Both readers present the same content
    assert_eq!(all_values(&*xls), all_values(&*xlsx));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "notes.txt", b"a,1\n").unwrap();

    let err = open_spreadsheet(&path).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedFormat { content_type: Some(ref ct) } if ct == "text/plain"
    ));
}

#[test]
fn test_missing_file_with_known_extension() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_spreadsheet(dir.path().join("absent.xls")).unwrap_err();
    assert!(matches!(err, Error::Open { .. }));
}

#[test]
fn test_extension_decides_even_when_content_disagrees() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = xlsx_bytes(&sheets(), &XlsxFixtureOptions::default()).unwrap();
    let path = write_fixture(dir.path(), "mislabeled.xls", &bytes).unwrap();

    let err = open_spreadsheet(&path).unwrap_err();
    assert!(matches!(err, Error::Open { .. }));
}

#[test]
fn test_lookup_and_iteration() {
    let dir = tempfile::tempdir().unwrap();
    for path in [xls_file(dir.path()), xlsx_file(dir.path())] {
        let book = open_spreadsheet(&path).unwrap();

        assert_eq!(book.sheet_count(), 2);
        assert_eq!(book.get(SheetKey::Index(0)).unwrap().name(), Some("Sheet1"));
        assert_eq!(book.get(SheetKey::Name("Sheet2")).unwrap().row_count(), 0);
        assert!(book.get(SheetKey::Name("Sheet3")).unwrap_err().is_not_found());

        let names = |b: &dyn Workbook| -> Vec<String> {
            b.worksheets().filter_map(|s| s.name().map(str::to_owned)).collect()
        };
        assert_eq!(names(&*book), names(&*book));

        let sheet = book.get(SheetKey::Name("Sheet1")).unwrap();
        assert!(sheet.row(0).unwrap_err().is_invalid_index());
        assert_eq!(
            sheet.row(1).unwrap().values(),
            &[CellValue::string("a"), CellValue::Number(1.0)]
        );
        assert_eq!(sheet.rows().count(), 2);
        assert_eq!(sheet.rows().count(), 2);
        assert_eq!(book.get(SheetKey::Name("Sheet2")).unwrap().rows().count(), 0);
    }
}

#[test]
fn test_eager_open() {
    let dir = tempfile::tempdir().unwrap();
    for path in [xls_file(dir.path()), xlsx_file(dir.path())] {
        let book = open_spreadsheet_with(&path, &OpenOptions::eager()).unwrap();
        assert!(book.worksheets().all(|s| s.is_loaded()));
    }
}

#[test]
fn test_convert_both_formats() {
    let dir = tempfile::tempdir().unwrap();
    for path in [xls_file(dir.path()), xlsx_file(dir.path())] {
        let book = open_spreadsheet(&path).unwrap();
        let written = export_workbook(&*book, &path, &ExportOptions::default()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("book-Sheet1.csv"));
        assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), "a,1\r\nb,2\r\n");
    }
}

#[test]
fn test_lookup_by_declared_name() {
    let dir = tempfile::tempdir().unwrap();
    let layout = FixtureSheet::new(
        "File Layout",
        vec![vec![CellValue::string("field"), CellValue::string("width")]],
    );
    let bytes = xlsx_bytes(
        &[letters_and_numbers("Sheet1"), layout],
        &XlsxFixtureOptions::default(),
    )
    .unwrap();
    let path = write_fixture(dir.path(), "report.xlsx", &bytes).unwrap();

    let book = open_spreadsheet(&path).unwrap();
    let sheet = book.get("File Layout".into()).unwrap();
    assert_eq!(sheet.name(), Some("File Layout"));
    assert_eq!(sheet.row(1).unwrap().cell(2), Some(&CellValue::string("width")));
    assert!(book.get("nonexistent".into()).unwrap_err().is_not_found());
}
