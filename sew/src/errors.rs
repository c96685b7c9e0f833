//! Error types for the SExtractor wrapper.

use std::path::PathBuf;
use thiserror::Error;

use crate::fits_io::FitsError;

/// Errors raised while discovering, invoking or parsing the output of SExtractor.
#[derive(Error, Debug)]
pub enum SewError {
    /// The executable is missing or does not behave like SExtractor.
    #[error("SExtractor configuration error: {0}")]
    Configuration(String),

    /// The image input cannot be turned into a file on disk.
    #[error("invalid path or pixels: {0}")]
    InvalidInput(String),

    #[error("{0} is an invalid CATALOG_TYPE (only ASCII_HEAD is supported)")]
    UnsupportedCatalogFormat(String),

    /// The external run did not leave a catalog behind.
    #[error("catalog file {} was not produced", .0.display())]
    MissingCatalog(PathBuf),

    #[error("failed to parse catalog {} at line {line}: {reason}", .path.display())]
    CatalogParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("catalog has no column named {0}")]
    MissingColumn(String),

    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SewError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SewError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SewError::UnsupportedCatalogFormat("FITS_LDAC".to_string());
        assert!(error.to_string().contains("FITS_LDAC is an invalid CATALOG_TYPE"));

        let error = SewError::CatalogParse {
            path: PathBuf::from("/tmp/se.cat"),
            line: 12,
            reason: "bad float".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "failed to parse catalog /tmp/se.cat at line 12: bad float"
        );

        let error = SewError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(error.to_string().starts_with("I/O error on /tmp/x"));
    }
}
