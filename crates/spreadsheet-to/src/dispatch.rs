//! Choosing a reader for a file.
//!
//! The content type is guessed from the file extension and matched against
//! the readers compiled into this build, in registration order.

use std::fmt;
use std::path::Path;

use spreadsheet_to_core::{Error, Format, OpenOptions, Result, Workbook};

/// Opens a file with one particular reader
pub type Opener = fn(&Path, &OpenOptions) -> Result<Box<dyn Workbook>>;

/// A reader and the content type it handles
#[derive(Clone, Copy)]
pub struct Registration {
    pub format: Format,
    pub content_type: &'static str,
    pub open: Opener,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("format", &self.format)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

static REGISTRY: &[Registration] = &[
    #[cfg(feature = "xls")]
    Registration {
        format: Format::Xls,
        content_type: spreadsheet_to_core::XLS_CONTENT_TYPE,
        open: open_xls,
    },
    #[cfg(feature = "xlsx")]
    Registration {
        format: Format::Xlsx,
        content_type: spreadsheet_to_core::XLSX_CONTENT_TYPE,
        open: open_xlsx,
    },
];

#[cfg(feature = "xls")]
fn open_xls(path: &Path, options: &OpenOptions) -> Result<Box<dyn Workbook>> {
    Ok(Box::new(spreadsheet_to_xls::XlsWorkbook::open(path, options)?))
}

#[cfg(feature = "xlsx")]
fn open_xlsx(path: &Path, options: &OpenOptions) -> Result<Box<dyn Workbook>> {
    Ok(Box::new(spreadsheet_to_xlsx::XlsxWorkbook::open(path, options)?))
}

/// Readers available in this build, in the order they are tried
pub fn registry() -> &'static [Registration] {
    REGISTRY
}

/// Guess a content type from the file extension alone.
pub fn content_type_for<P: AsRef<Path>>(path: P) -> Option<String> {
    mime_guess::from_path(path.as_ref())
        .first_raw()
        .map(str::to_owned)
}

/// Find the reader for `path`, or fail with [`Error::UnsupportedFormat`].
///
/// Only the name is inspected; the file does not need to exist.
pub fn resolve<P: AsRef<Path>>(path: P) -> Result<&'static Registration> {
    let path = path.as_ref();
    let content_type = content_type_for(path);
    log::debug!(
        "{}: content type {}",
        path.display(),
        content_type.as_deref().unwrap_or("unknown")
    );

    content_type
        .as_deref()
        .and_then(|ct| REGISTRY.iter().find(|r| r.content_type == ct))
        .ok_or(Error::UnsupportedFormat { content_type })
}

/// Open a spreadsheet with default options.
pub fn open_spreadsheet<P: AsRef<Path>>(path: P) -> Result<Box<dyn Workbook>> {
    open_spreadsheet_with(path, &OpenOptions::default())
}

/// Open a spreadsheet, picking the reader from the file extension.
pub fn open_spreadsheet_with<P: AsRef<Path>>(
    path: P,
    options: &OpenOptions,
) -> Result<Box<dyn Workbook>> {
    let path = path.as_ref();
    let registration = resolve(path)?;
    log::debug!("{}: opening as {}", path.display(), registration.format);
    (registration.open)(path, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(
            content_type_for("book.xls").as_deref(),
            Some("application/vnd.ms-excel")
        );
        assert_eq!(
            content_type_for("dir/book.XLSX").as_deref(),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        );
        assert_eq!(content_type_for("notes.txt").as_deref(), Some("text/plain"));
        assert_eq!(content_type_for("no_extension"), None);
    }

    #[test]
    fn test_registry_order() {
        let formats: Vec<Format> = registry().iter().map(|r| r.format).collect();
        let mut expected = Vec::new();
        if cfg!(feature = "xls") {
            expected.push(Format::Xls);
        }
        if cfg!(feature = "xlsx") {
            expected.push(Format::Xlsx);
        }
        assert_eq!(formats, expected);
    }

    #[test]
    fn test_resolve_unsupported() {
        let err = resolve("notes.txt").unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedFormat { content_type: Some(ref ct) } if ct == "text/plain"
        ));

        let err = resolve("README").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { content_type: None }));
        assert_eq!(err.to_string(), "no spreadsheet reader available for unknown files");
    }
}
