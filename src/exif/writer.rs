use std::io::Cursor;
use std::path::Path;

use exif::{Field, In, Tag};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};

use crate::error::{Error, Result};
use crate::pipeline;

use super::dict::ExifDict;
use super::tags::{self, Ifd};
use super::value::TagValue;

const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// Largest payload a JPEG segment length field can describe.
const MAX_SEGMENT_CONTENTS: usize = u16::MAX as usize - 2;

// Little-endian TIFF header, primary IFD at offset 8 with no entries and no
// next IFD.
const EMPTY_TIFF: [u8; 14] = [
    b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Serialize a dictionary to TIFF-structured EXIF data.
///
/// IFD pointers and the thumbnail offset/length are regenerated. A dictionary
/// without tags becomes a header with an empty primary IFD. The 1st IFD is
/// chained from the primary one, so it is dropped when `0th` has no tags.
pub fn encode_tiff(dict: &ExifDict) -> std::result::Result<Vec<u8>, exif::Error> {
    let anchored = writable(dict, Ifd::Primary).next().is_some();
    if !anchored && (!dict.section(Ifd::Thumbnail).is_empty() || dict.thumbnail().is_some()) {
        log::debug!("Dropping 1st IFD and thumbnail: no 0th tags to chain them from");
    }

    let fields: Vec<Field> = Ifd::ALL
        .into_iter()
        .filter(|&ifd| anchored || ifd != Ifd::Thumbnail)
        .flat_map(|ifd| {
            writable(dict, ifd).map(move |(id, value)| Field {
                tag: Tag(ifd.context(), id),
                ifd_num: ifd.ifd_num(),
                value: value.to_exif(),
            })
        })
        .collect();

    if fields.is_empty() {
        return Ok(EMPTY_TIFF.to_vec());
    }

    let mut writer = exif::experimental::Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    if let Some(thumb) = dict.thumbnail().filter(|_| anchored) {
        writer.set_jpeg(thumb, In::THUMBNAIL);
    }

    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false)?;
    Ok(buf.into_inner())
}

/// Entries of `ifd` that are stored as given, skipping regenerated ones.
fn writable(dict: &ExifDict, ifd: Ifd) -> impl Iterator<Item = (u16, &TagValue)> {
    dict.section(ifd)
        .iter()
        .filter(move |&(&id, _)| !tags::is_structural(ifd, id))
        .map(|(&id, value)| (id, value))
}

/// Embed `dict` into a copy of the JPEG at `input`, written to `output`.
///
/// Only the EXIF APP1 segment changes; every other segment and the scan data
/// are copied verbatim. `output` may equal `input`.
pub fn write_exif(input: &Path, output: &Path, dict: &ExifDict) -> Result<()> {
    pipeline::require_exif_output(output)?;

    let bytes = pipeline::read_input(input)?;
    let mut jpeg = pipeline::parse_jpeg(input, bytes)?;

    let tiff = encode_tiff(dict).map_err(|e| Error::write(output, e))?;
    if tiff.len() + EXIF_PREFIX.len() > MAX_SEGMENT_CONTENTS {
        return Err(Error::write(
            output,
            format!("EXIF block of {} bytes does not fit in one APP1 segment", tiff.len()),
        ));
    }

    replace_exif_segment(&mut jpeg, tiff);

    let encoded = jpeg.encoder().bytes();
    pipeline::write_atomic(output, &encoded)?;

    log::info!("Wrote {} EXIF tags to {}", dict.len(), output.display());
    Ok(())
}

/// Swap in new EXIF data, keeping the segment where the old one was.
fn replace_exif_segment(jpeg: &mut Jpeg, tiff: Vec<u8>) {
    let orig_pos = find_exif_segment_pos(jpeg);
    jpeg.set_exif(Some(Bytes::from(tiff)));

    // set_exif() appends at a fixed index; EXIF readers expect it near the
    // start, ahead of any XMP APP1.
    if let Some(new_pos) = find_exif_segment_pos(jpeg) {
        let target_pos = orig_pos.unwrap_or_else(|| default_exif_pos(jpeg));
        if target_pos < new_pos {
            let segments = jpeg.segments_mut();
            let seg = segments.remove(new_pos);
            segments.insert(target_pos, seg);
        }
    }
}

/// Right after a leading APP0 (JFIF), or first.
fn default_exif_pos(jpeg: &Jpeg) -> usize {
    match jpeg.segments().first() {
        Some(seg) if seg.marker() == MARKER_APP0 => 1,
        _ => 0,
    }
}

/// EXIF segments have marker APP1 and contents starting with `Exif\0\0`.
fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == MARKER_APP1 && s.contents().starts_with(EXIF_PREFIX))
}
