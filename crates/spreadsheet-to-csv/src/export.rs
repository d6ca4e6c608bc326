//! Whole-workbook conversion: one CSV file per worksheet.

use std::path::{Path, PathBuf};

use spreadsheet_to_core::{Workbook, WorkbookExt};

use crate::error::CsvResult;
use crate::options::ExportOptions;
use crate::writer::CsvWriter;

/// Write every worksheet of `workbook` to `<base>-<sheet name>.csv`.
///
/// `source` is the path the workbook was read from; its file name without
/// the last extension is the `<base>`. Returns the written paths in sheet
/// order.
pub fn export_workbook<B>(workbook: &B, source: &Path, options: &ExportOptions) -> CsvResult<Vec<PathBuf>>
where
    B: Workbook + ?Sized,
{
    let dir = output_dir(source, options.destination.as_deref());
    let base = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut written = Vec::with_capacity(workbook.sheet_count());
    for (position, sheet) in workbook.worksheets().enumerate() {
        let path = dir.join(sheet_file_name(&base, sheet.name(), position));
        let rows = CsvWriter::write_file(sheet, &path, &options.csv)?;
        log::debug!("wrote {rows} rows to {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// The directory output goes to: `destination` if given, otherwise the
/// source's directory, or `.` when the source has none.
pub fn output_dir(source: &Path, destination: Option<&Path>) -> PathBuf {
    if let Some(dir) = destination {
        return dir.to_path_buf();
    }
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `<base>-<name>.csv`; unnamed sheets use `sheet<N>` with a 1-based `N`.
///
/// Path separators in sheet names are replaced so every file lands
/// directly in the output directory.
pub fn sheet_file_name(base: &str, name: Option<&str>, position: usize) -> String {
    let name = match name {
        Some(name) => name.replace(['/', '\\'], "_"),
        None => format!("sheet{}", position + 1),
    };
    format!("{base}-{name}.csv")
}
