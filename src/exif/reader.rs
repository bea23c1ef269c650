use std::path::Path;

use exif::{In, Tag};
use img_parts::ImageEXIF;

use crate::error::{Error, Result};
use crate::pipeline;

use super::dict::{ExifDict, MetadataView};
use super::tags::{self, Ifd};
use super::value::TagValue;

/// Read the EXIF block of a JPEG into a dictionary.
///
/// A JPEG without an EXIF segment yields an empty dictionary. Non-JPEG
/// containers fail with [`Error::ExifUnsupported`].
pub fn read_exif(path: &Path) -> Result<ExifDict> {
    let bytes = pipeline::read_input(path)?;
    let jpeg = pipeline::parse_jpeg(path, bytes)?;

    match jpeg.exif() {
        Some(tiff) => decode_tiff(path, tiff.to_vec()),
        None => {
            log::debug!("No EXIF segment in {}", path.display());
            Ok(ExifDict::new())
        }
    }
}

/// Read the EXIF block and resolve tag IDs to names.
pub fn read_metadata(path: &Path) -> Result<MetadataView> {
    Ok(read_exif(path)?.view())
}

/// Decode TIFF-structured EXIF data (the APP1 payload after `Exif\0\0`).
pub(crate) fn decode_tiff(path: &Path, tiff: Vec<u8>) -> Result<ExifDict> {
    let exif = exif::Reader::new()
        .read_raw(tiff)
        .map_err(|source| Error::MetadataRead {
            path: path.to_path_buf(),
            source,
        })?;

    let mut dict = ExifDict::new();
    let mut skipped = 0usize;

    for field in exif.fields() {
        let Some(ifd) = Ifd::of_field(field) else {
            skipped += 1;
            continue;
        };
        let id = field.tag.number();
        if tags::is_structural(ifd, id) {
            continue;
        }
        match TagValue::from_exif(&field.value) {
            Some(value) => {
                dict.set(ifd, id, value);
            }
            None => skipped += 1,
        }
    }

    dict.set_thumbnail(thumbnail(&exif));

    log::debug!(
        "Read {} EXIF tags from {} (skipped {skipped}, thumbnail: {})",
        dict.len(),
        path.display(),
        dict.thumbnail().map_or(0, <[u8]>::len)
    );
    Ok(dict)
}

/// JPEG thumbnail referenced by the 1st IFD, if it lies inside the block.
fn thumbnail(exif: &exif::Exif) -> Option<Vec<u8>> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let len = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    exif.buf()
        .get(offset..offset.checked_add(len)?)
        .map(<[u8]>::to_vec)
}
