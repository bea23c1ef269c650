use std::path::PathBuf;

use thiserror::Error;

use crate::exif::Ifd;

/// Boxed cause for variants that wrap more than one underlying error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by every imagefox operation.
///
/// Variants that concern a file carry its path, and wrapping variants keep the
/// underlying failure reachable through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum Error {
    /// The input is missing, unreadable, not an image, or has corrupt pixel data.
    #[error("failed to decode {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The EXIF block is present but malformed.
    #[error("failed to read EXIF metadata from {}", path.display())]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },

    /// The container format has no place for an EXIF block.
    #[error("{} is a {format} file, which cannot carry EXIF metadata", path.display())]
    ExifUnsupported { path: PathBuf, format: String },

    /// A direct edit named a field outside the editable-field table.
    #[error("unsupported field `{field}` (editable fields: {allowed})")]
    UnsupportedField { field: String, allowed: String },

    /// Encoding or writing the destination failed.
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The requested output format is not one the codec can produce.
    #[error("unsupported output format `{0}`")]
    UnsupportedFormat(String),

    /// The structured metadata file could not be read or parsed.
    #[error("failed to load metadata JSON from {}", path.display())]
    JsonLoad {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Bulk metadata application failed; the cause is the inner error.
    #[error("failed to apply metadata to {}", path.display())]
    Apply {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// A JSON value does not fit the declared type of its tag.
    #[error("{section} tag {tag} cannot hold {value}")]
    TagValue {
        section: Ifd,
        tag: String,
        value: String,
    },

    #[error("{axis} {value} is out of range (must be within ±{limit})")]
    GpsRange {
        axis: &'static str,
        value: f64,
        limit: f64,
    },

    #[error("invalid resize `{0}`, expected WIDTHxHEIGHT with both sides > 0")]
    InvalidResize(String),

    #[error("quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn decode(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Write {
            path: path.into(),
            source: source.into(),
        }
    }
}
