//! Error types for spreadsheet-to-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by a format backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by workbooks, worksheets and the format dispatcher.
#[derive(Debug, Error)]
pub enum Error {
    /// No reader is registered for the inferred content type.
    #[error("no spreadsheet reader available for {} files", content_type.as_deref().unwrap_or("unknown"))]
    UnsupportedFormat {
        /// Content type guessed from the file extension, if any.
        content_type: Option<String>,
    },

    /// The backing reader could not open or parse the file.
    #[error("failed to read '{name}': {source}")]
    Open {
        /// File path, or a placeholder for in-memory sources.
        name: String,
        source: BackendError,
    },

    /// Row index 0, or an index past the last row.
    #[error("row index {index} is out of range (rows are numbered 1 to {row_count})")]
    InvalidIndex { index: usize, row_count: usize },

    /// Unknown worksheet name or out-of-range worksheet position.
    #[error("worksheet not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Wrap a backend failure for the named source.
    pub fn open<S, E>(name: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<BackendError>,
    {
        Error::Open {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Whether this is an [`Error::InvalidIndex`].
    pub fn is_invalid_index(&self) -> bool {
        matches!(self, Error::InvalidIndex { .. })
    }

    /// Whether this is an [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message() {
        let err = Error::UnsupportedFormat {
            content_type: Some("text/plain".into()),
        };
        assert_eq!(
            err.to_string(),
            "no spreadsheet reader available for text/plain files"
        );

        let err = Error::UnsupportedFormat { content_type: None };
        assert_eq!(
            err.to_string(),
            "no spreadsheet reader available for unknown files"
        );
    }

    #[test]
    fn test_open_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::open("book.xls", io);
        assert_eq!(err.to_string(), "failed to read 'book.xls': missing");
        assert!(std::error::Error::source(&err).is_some());
    }
}
