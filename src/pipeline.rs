use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use img_parts::Bytes;
use img_parts::jpeg::Jpeg;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Image container kinds the tool reads and writes.
///
/// Only [`ImageKind::Jpeg`] carries EXIF; every kind can be the target of
/// compress and convert.
///
/// # Example
///
/// ```rust
/// use imagefox::pipeline::ImageKind;
/// use std::path::Path;
///
/// assert_eq!(ImageKind::from_path(Path::new("photo.JPG")), Some(ImageKind::Jpeg));
/// assert_eq!(ImageKind::from_name("tif"), Some(ImageKind::Tiff));
/// assert!(!ImageKind::Png.carries_exif());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
    Tiff,
    Bmp,
    Gif,
}

impl ImageKind {
    /// Determine the image kind from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_name(path.extension()?.to_str()?)
    }

    /// Parse a format name or extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Tiff => Some(Self::Tiff),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::WebP => ImageFormat::WebP,
            Self::Tiff => ImageFormat::Tiff,
            Self::Bmp => ImageFormat::Bmp,
            Self::Gif => ImageFormat::Gif,
        }
    }

    /// Whether this container can hold an EXIF block for editing.
    pub fn carries_exif(self) -> bool {
        matches!(self, Self::Jpeg)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::WebP => "WebP",
            Self::Tiff => "TIFF",
            Self::Bmp => "BMP",
            Self::Gif => "GIF",
        }
    }
}

/// Output kind named by the path's extension.
pub fn output_kind(path: &Path) -> Result<ImageKind> {
    ImageKind::from_path(path).ok_or_else(|| {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Error::UnsupportedFormat(ext)
    })
}

pub(crate) fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::decode(path, e))
}

/// Parse a JPEG container, rejecting other image formats by name.
pub(crate) fn parse_jpeg(path: &Path, bytes: Vec<u8>) -> Result<Jpeg> {
    match image::guess_format(&bytes) {
        Ok(ImageFormat::Jpeg) => {
            Jpeg::from_bytes(Bytes::from(bytes)).map_err(|e| Error::decode(path, e))
        }
        Ok(other) => Err(Error::ExifUnsupported {
            path: path.to_path_buf(),
            format: ImageKind::from_format(other)
                .map(|k| k.name().to_string())
                .unwrap_or_else(|| format!("{other:?}")),
        }),
        Err(e) => Err(Error::decode(path, e)),
    }
}

/// Reject output paths whose extension names a container without EXIF.
pub(crate) fn require_exif_output(path: &Path) -> Result<()> {
    match ImageKind::from_path(path) {
        Some(kind) if !kind.carries_exif() => Err(Error::ExifUnsupported {
            path: path.to_path_buf(),
            format: kind.name().to_string(),
        }),
        _ => Ok(()),
    }
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
///
/// The destination is untouched unless the whole write succeeds. An existing
/// destination keeps its permissions.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::write(path, e))?;
    tmp.write_all(bytes).map_err(|e| Error::write(path, e))?;
    tmp.as_file().sync_all().map_err(|e| Error::write(path, e))?;

    if let Ok(meta) = fs::metadata(path) {
        if let Err(e) = tmp.as_file().set_permissions(meta.permissions()) {
            log::debug!("Could not copy permissions onto {}: {e}", path.display());
        }
    }

    tmp.persist(path).map_err(|e| Error::write(path, e.error))?;
    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Copy the original to `<name>.<ext>.bak` unless a backup already exists.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        fs::copy(path, &backup_path).map_err(|e| Error::write(&backup_path, e))?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}
