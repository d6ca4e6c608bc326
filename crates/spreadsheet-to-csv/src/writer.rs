//! CSV writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use spreadsheet_to_core::{Worksheet, WorksheetExt};

use crate::error::CsvResult;
use crate::options::CsvWriteOptions;

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write a worksheet to a CSV file, returning the number of rows written
    pub fn write_file<S, P>(worksheet: &S, path: P, options: &CsvWriteOptions) -> CsvResult<usize>
    where
        S: Worksheet + ?Sized,
        P: AsRef<Path>,
    {
        let file = File::create(path)?;
        Self::write_worksheet(worksheet, BufWriter::new(file), options)
    }

    /// Write every row of a worksheet, in order, to a writer
    pub fn write_worksheet<S, W>(worksheet: &S, writer: W, options: &CsvWriteOptions) -> CsvResult<usize>
    where
        S: Worksheet + ?Sized,
        W: Write,
    {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(options.line_terminator.to_csv())
            .flexible(true)
            .from_writer(writer);

        let mut written = 0;
        for row in worksheet.rows() {
            let record = row?.iter().map(|value| value.to_string());
            csv_writer.write_record(record)?;
            written += 1;
        }

        csv_writer.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LineTerminator;
    use spreadsheet_to_core::{CellError, CellValue, Result, Row, Worksheet};

    struct Grid(Vec<Row>);

    impl Worksheet for Grid {
        fn name(&self) -> Option<&str> {
            Some("grid")
        }

        fn row_count(&self) -> usize {
            self.0.len()
        }

        fn column_count(&self) -> usize {
            self.0.first().map_or(0, Row::len)
        }

        fn row(&self, index: usize) -> Result<&Row> {
            let pos = spreadsheet_to_core::row_position(index, self.0.len())?;
            Ok(&self.0[pos])
        }

        fn is_loaded(&self) -> bool {
            true
        }
    }

    fn render(grid: &Grid, options: &CsvWriteOptions) -> String {
        let mut out = Vec::new();
        CsvWriter::write_worksheet(grid, &mut out, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_values_and_quoting() {
        let grid = Grid(vec![
            Row::new(vec![
                CellValue::string("plain"),
                CellValue::string("with,comma"),
                CellValue::string("say \"hi\""),
            ]),
            Row::new(vec![
                CellValue::Number(1.0),
                CellValue::Number(0.25),
                CellValue::Boolean(true),
            ]),
            Row::new(vec![
                CellValue::Empty,
                CellValue::Error(CellError::Na),
                CellValue::string("line\nbreak"),
            ]),
        ]);

        assert_eq!(
            render(&grid, &CsvWriteOptions::default()),
            "plain,\"with,comma\",\"say \"\"hi\"\"\"\r\n1,0.25,TRUE\r\n,#N/A,\"line\nbreak\"\r\n"
        );
    }

    #[test]
    fn test_delimiter_and_terminator() {
        let grid = Grid(vec![Row::new(vec![CellValue::string("a"), CellValue::Number(2.0)])]);
        let options = CsvWriteOptions {
            delimiter: b';',
            line_terminator: LineTerminator::LF,
            ..Default::default()
        };
        assert_eq!(render(&grid, &options), "a;2\n");
    }

    #[test]
    fn test_empty_sheet_writes_nothing() {
        let grid = Grid(Vec::new());
        let mut out = Vec::new();
        let written = CsvWriter::write_worksheet(&grid, &mut out, &CsvWriteOptions::default()).unwrap();
        assert_eq!(written, 0);
        assert!(out.is_empty());
    }
}
