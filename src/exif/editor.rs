use std::fs;
use std::io::Cursor;
use std::path::Path;

use img_parts::Bytes;
use img_parts::jpeg::Jpeg;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::pipeline::{self, ImageKind};

use super::dict::ExifDict;
use super::gps;
use super::reader::read_exif;
use super::tags::{self, Ifd, TagDef, TagType};
use super::value::{Rational, SRational, TagValue};
use super::writer::write_exif;

/// A field `metadata-edit` may set, and where it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditableField {
    pub name: &'static str,
    pub section: Ifd,
    pub tag: u16,
}

pub const EDITABLE_FIELDS: &[EditableField] = &[
    EditableField { name: "Model", section: Ifd::Primary, tag: 0x0110 },
    EditableField { name: "DateTime", section: Ifd::Primary, tag: 0x0132 },
    EditableField { name: "Make", section: Ifd::Primary, tag: 0x010F },
    EditableField { name: "Artist", section: Ifd::Primary, tag: 0x013B },
    EditableField { name: "Copyright", section: Ifd::Primary, tag: 0x8298 },
    EditableField { name: "Software", section: Ifd::Primary, tag: 0x0131 },
    EditableField { name: "ImageDescription", section: Ifd::Primary, tag: 0x010E },
];

pub fn editable_field(name: &str) -> Option<&'static EditableField> {
    EDITABLE_FIELDS.iter().find(|f| f.name == name)
}

fn editable_names() -> String {
    EDITABLE_FIELDS
        .iter()
        .map(|f| f.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Set one allow-listed field to `value` and write the result to `output`.
///
/// Other tags are carried over from `input`. An unknown field name fails
/// before any file is read or written.
pub fn edit_field(input: &Path, output: &Path, field: &str, value: &str) -> Result<()> {
    let entry = editable_field(field).ok_or_else(|| Error::UnsupportedField {
        field: field.to_string(),
        allowed: editable_names(),
    })?;

    let mut dict = read_exif(input)?;
    let previous = dict.set(entry.section, entry.tag, TagValue::ascii(value));
    log::debug!(
        "{}: {} -> {value}",
        entry.name,
        previous.as_ref().map_or_else(|| "<unset>".to_string(), ToString::to_string)
    );

    write_exif(input, output, &dict)
}

/// Structured metadata as accepted by `metadata-write`.
///
/// ```json
/// {"0th": {"Make": "Canon"}, "Exif": {"ExposureTime": [1, 250]},
///  "GPS": {"Latitude": 40.6892, "Longitude": -74.0445}}
/// ```
///
/// Every section is optional and unknown top-level keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataInput {
    #[serde(rename = "0th", default)]
    pub primary: Option<Map<String, Value>>,
    #[serde(rename = "Exif", default)]
    pub exif: Option<Map<String, Value>>,
    #[serde(rename = "GPS", default)]
    pub gps: Option<GpsInput>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GpsInput {
    #[serde(rename = "Latitude", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude", default)]
    pub longitude: Option<f64>,
}

impl MetadataInput {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::JsonLoad {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        serde_json::from_str(&content).map_err(|e| Error::JsonLoad {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Build a fresh dictionary from this input.
    ///
    /// Names are resolved per section; names the section does not define are
    /// dropped with a warning.
    pub fn to_exif_dict(&self) -> Result<ExifDict> {
        let registry = tags::registry();
        let mut dict = ExifDict::new();

        for (ifd, entries) in [(Ifd::Primary, &self.primary), (Ifd::Exif, &self.exif)] {
            let Some(entries) = entries else { continue };
            for (name, json) in entries {
                let Some(def) = registry.lookup(ifd, name) else {
                    log::warn!("Dropping unknown {ifd} tag `{name}`");
                    continue;
                };
                if tags::is_structural(ifd, def.id) {
                    log::warn!("Dropping {ifd} tag `{name}`: it is generated on write");
                    continue;
                }
                dict.set(ifd, def.id, value_from_json(ifd, def, json)?);
            }
        }

        if let Some(position) = self.gps {
            match (position.latitude, position.longitude) {
                (Some(lat), Some(lon)) => gps::write_position(&mut dict, lat, lon)?,
                (None, None) => {}
                _ => log::warn!("GPS needs both Latitude and Longitude, skipping position"),
            }
        }

        Ok(dict)
    }
}

/// Coerce a JSON value to the declared type of its tag.
fn value_from_json(ifd: Ifd, def: &TagDef, json: &Value) -> Result<TagValue> {
    if let Value::String(s) = json {
        return Ok(match def.ty {
            TagType::Undefined => TagValue::Undefined(s.as_bytes().to_vec()),
            _ => TagValue::ascii(s),
        });
    }

    let converted = match def.ty {
        TagType::Ascii => None,
        TagType::Byte => ints(json).map(TagValue::Byte),
        TagType::Undefined => ints(json).map(TagValue::Undefined),
        TagType::Short => ints(json).map(TagValue::Short),
        TagType::Long => ints(json).map(TagValue::Long),
        TagType::Rational => pairs::<u32>(json).map(|v| {
            TagValue::Rational(v.into_iter().map(|(n, d)| Rational::new(n, d)).collect())
        }),
        TagType::SRational => pairs::<i32>(json).map(|v| {
            TagValue::SRational(
                v.into_iter()
                    .map(|(num, denom)| SRational { num, denom })
                    .collect(),
            )
        }),
    };

    converted.ok_or_else(|| Error::TagValue {
        section: ifd,
        tag: def.name.to_string(),
        value: json.to_string(),
    })
}

fn int<T: TryFrom<i64>>(json: &Value) -> Option<T> {
    T::try_from(json.as_i64()?).ok()
}

/// A scalar or a non-empty array of integers.
fn ints<T: TryFrom<i64>>(json: &Value) -> Option<Vec<T>> {
    match json {
        Value::Array(items) if !items.is_empty() => items.iter().map(int).collect(),
        Value::Array(_) => None,
        scalar => Some(vec![int(scalar)?]),
    }
}

/// `[n, d]`, `[[n, d], ...]`, or a whole number `n` meaning `n/1`.
fn pairs<T: TryFrom<i64>>(json: &Value) -> Option<Vec<(T, T)>> {
    match json {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_array) => {
            items.iter().map(pair).collect()
        }
        Value::Array(_) => Some(vec![pair(json)?]),
        scalar => Some(vec![(int(scalar)?, T::try_from(1).ok()?)]),
    }
}

fn pair<T: TryFrom<i64>>(json: &Value) -> Option<(T, T)> {
    match json.as_array()?.as_slice() {
        [num, denom] => {
            let denom = denom.as_i64().filter(|&d| d != 0)?;
            Some((int(num)?, T::try_from(denom).ok()?))
        }
        _ => None,
    }
}

/// Load structured metadata from `json_path` and write it into `path`.
pub fn apply_json(path: &Path, json_path: &Path) -> Result<()> {
    let input = MetadataInput::from_path(json_path).map_err(|e| apply_error(path, e))?;
    apply_metadata(path, &input)
}

/// Replace the EXIF block of `path` with one built from `input`.
///
/// Existing tags are not merged. Failures come back as [`Error::Apply`].
pub fn apply_metadata(path: &Path, input: &MetadataInput) -> Result<()> {
    input
        .to_exif_dict()
        .and_then(|dict| write_exif(path, path, &dict))
        .map_err(|e| apply_error(path, e))
}

fn apply_error(path: &Path, source: Error) -> Error {
    Error::Apply {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}

const MARKER_APP0: u8 = 0xE0;
const MARKER_APP14: u8 = 0xEE;
const MARKER_APP15: u8 = 0xEF;
const MARKER_COM: u8 = 0xFE;

/// JFIF and the Adobe colour-transform segment affect decoding; the rest of
/// the APPn range and comments are metadata.
fn keeps_segment(marker: u8) -> bool {
    match marker {
        MARKER_APP0 | MARKER_APP14 => true,
        MARKER_APP0..=MARKER_APP15 | MARKER_COM => false,
        _ => true,
    }
}

/// Write a copy of `input` with all metadata stripped to `output`.
///
/// JPEG scan data is copied as is. Other formats are decoded and re-encoded
/// in their own format, which carries no metadata over.
pub fn remove_metadata(input: &Path, output: &Path) -> Result<()> {
    let bytes = pipeline::read_input(input)?;
    let format = image::guess_format(&bytes).map_err(|e| Error::decode(input, e))?;
    let kind = ImageKind::from_format(format)
        .ok_or_else(|| Error::UnsupportedFormat(format!("{format:?}").to_lowercase()))?;

    if let Some(requested) = ImageKind::from_path(output) {
        if requested != kind {
            log::warn!(
                "{} keeps its {} encoding; extension of {} is not used",
                input.display(),
                kind.name(),
                output.display()
            );
        }
    }

    let stripped = match kind {
        ImageKind::Jpeg => {
            let mut jpeg = Jpeg::from_bytes(Bytes::from(bytes)).map_err(|e| Error::decode(input, e))?;
            let before = jpeg.segments().len();
            jpeg.segments_mut().retain(|seg| keeps_segment(seg.marker()));
            log::debug!("Dropped {} JPEG segments", before - jpeg.segments().len());
            jpeg.encoder().bytes().to_vec()
        }
        _ => {
            let img = image::load_from_memory_with_format(&bytes, format)
                .map_err(|e| Error::decode(input, e))?;
            let mut buf = Cursor::new(Vec::new());
            img.write_to(&mut buf, format).map_err(|e| Error::write(output, e))?;
            buf.into_inner()
        }
    };

    pipeline::write_atomic(output, &stripped)?;
    log::info!("Removed metadata: {} -> {}", input.display(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::read_metadata;
    use image::{ImageFormat, RgbImage, RgbaImage};
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_jpeg(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        RgbImage::from_fn(24, 12, |x, y| image::Rgb([x as u8 * 10, y as u8 * 20, 128]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();
        path
    }

    fn input(value: Value) -> MetadataInput {
        serde_json::from_value(value).unwrap()
    }

    // ── editable fields ──────────────────────────────────────────────

    #[test]
    fn editable_fields_match_registry() {
        let registry = tags::registry();
        for field in EDITABLE_FIELDS {
            let def = registry.lookup(field.section, field.name).unwrap();
            assert_eq!(def.id, field.tag, "{}", field.name);
            assert_eq!(def.ty, TagType::Ascii, "{}", field.name);
        }
    }

    #[test]
    fn edit_field_round_trips() {
        let dir = TempDir::new().unwrap();
        let src = sample_jpeg(&dir, "in.jpg");
        let out = dir.path().join("out.jpg");

        edit_field(&src, &out, "Model", "Nikon Z 6").unwrap();
        let view = read_metadata(&out).unwrap();
        assert_eq!(view.get(Ifd::Primary, "Model"), Some(&TagValue::ascii("Nikon Z 6")));
    }

    #[test]
    fn edit_field_keeps_other_tags() {
        let dir = TempDir::new().unwrap();
        let src = sample_jpeg(&dir, "in.jpg");

        edit_field(&src, &src, "Make", "Canon").unwrap();
        edit_field(&src, &src, "DateTime", "2024:06:01 12:00:00").unwrap();

        let view = read_metadata(&src).unwrap();
        assert_eq!(view.get(Ifd::Primary, "Make"), Some(&TagValue::ascii("Canon")));
        assert_eq!(
            view.get(Ifd::Primary, "DateTime"),
            Some(&TagValue::ascii("2024:06:01 12:00:00"))
        );
    }

    #[test]
    fn in_place_edit_keeps_pixels() {
        let dir = TempDir::new().unwrap();
        let src = sample_jpeg(&dir, "in.jpg");
        let before = image::open(&src).unwrap().to_rgb8();

        edit_field(&src, &src, "ImageDescription", "harbour at dusk").unwrap();
        edit_field(&src, &src, "Model", "Q3").unwrap();

        assert_eq!(image::open(&src).unwrap().to_rgb8(), before);
        let view = read_metadata(&src).unwrap();
        assert_eq!(view.get(Ifd::Primary, "Model"), Some(&TagValue::ascii("Q3")));
    }

    #[test]
    fn unsupported_field_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.jpg");
        let err = edit_field(Path::new("/nonexistent.jpg"), &out, "ISO", "100").unwrap_err();
        match err {
            Error::UnsupportedField { field, allowed } => {
                assert_eq!(field, "ISO");
                assert!(allowed.contains("Model"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!out.exists());
    }

    // ── structured input ─────────────────────────────────────────────

    #[test]
    fn json_values_follow_declared_types() {
        let dict = input(json!({
            "0th": {"Make": "Fujifilm", "Orientation": 6, "XResolution": [300, 1]},
            "Exif": {
                "ExposureTime": [1, 250],
                "ExifVersion": "0232",
                "ISOSpeedRatings": [200],
                "ExposureBiasValue": [-1, 3],
                "FocalLength": 35
            }
        }))
        .to_exif_dict()
        .unwrap();

        assert_eq!(dict.get(Ifd::Primary, 0x010F), Some(&TagValue::ascii("Fujifilm")));
        assert_eq!(dict.get(Ifd::Primary, 0x0112), Some(&TagValue::Short(vec![6])));
        assert_eq!(
            dict.get(Ifd::Primary, 0x011A),
            Some(&TagValue::Rational(vec![Rational::new(300, 1)]))
        );
        assert_eq!(
            dict.get(Ifd::Exif, 0x829A),
            Some(&TagValue::Rational(vec![Rational::new(1, 250)]))
        );
        assert_eq!(dict.get(Ifd::Exif, 0x9000), Some(&TagValue::Undefined(b"0232".to_vec())));
        assert_eq!(dict.get(Ifd::Exif, 0x8827), Some(&TagValue::Short(vec![200])));
        assert_eq!(
            dict.get(Ifd::Exif, 0x9204),
            Some(&TagValue::SRational(vec![SRational { num: -1, denom: 3 }]))
        );
        assert_eq!(
            dict.get(Ifd::Exif, 0x920A),
            Some(&TagValue::Rational(vec![Rational::new(35, 1)]))
        );
    }

    #[test]
    fn unknown_names_are_dropped() {
        let dict = input(json!({
            "0th": {"Model": "A7", "NotATag": 1},
            "Exif": {"Model": "wrong section"},
            "Extra": {"ignored": true}
        }))
        .to_exif_dict()
        .unwrap();
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn shape_mismatch_is_a_tag_value_error() {
        for bad in [
            json!({"0th": {"Orientation": [1.5]}}),
            json!({"0th": {"Orientation": 70000}}),
            json!({"Exif": {"ExposureTime": [1, 0]}}),
            json!({"0th": {"Model": 12}}),
            json!({"Exif": {"FNumber": {"num": 1}}}),
        ] {
            let err = input(bad.clone()).to_exif_dict().unwrap_err();
            assert!(matches!(err, Error::TagValue { .. }), "{bad}: {err:?}");
        }
    }

    #[test]
    fn gps_needs_both_axes() {
        let dict = input(json!({"GPS": {"Latitude": 10.0}})).to_exif_dict().unwrap();
        assert!(dict.section(Ifd::Gps).is_empty());

        let dict = input(json!({"GPS": {"Latitude": 40.6892, "Longitude": -74.0445}}))
            .to_exif_dict()
            .unwrap();
        assert_eq!(dict.get(Ifd::Gps, 0x0001), Some(&TagValue::ascii("N")));
        assert_eq!(dict.get(Ifd::Gps, 0x0003), Some(&TagValue::ascii("W")));
    }

    // ── apply ────────────────────────────────────────────────────────

    #[test]
    fn apply_overwrites_existing_metadata() {
        let dir = TempDir::new().unwrap();
        let src = sample_jpeg(&dir, "photo.jpg");
        edit_field(&src, &src, "Artist", "someone").unwrap();

        apply_metadata(&src, &input(json!({"0th": {"Software": "imagefox"}}))).unwrap();

        let view = read_metadata(&src).unwrap();
        assert!(view.get(Ifd::Primary, "Artist").is_none());
        assert_eq!(view.get(Ifd::Primary, "Software"), Some(&TagValue::ascii("imagefox")));
    }

    #[test]
    fn empty_input_yields_empty_block() {
        let dir = TempDir::new().unwrap();
        let src = sample_jpeg(&dir, "photo.jpg");
        edit_field(&src, &src, "Model", "X").unwrap();

        apply_metadata(&src, &MetadataInput::default()).unwrap();
        assert!(read_exif(&src).unwrap().is_empty());
    }

    #[test]
    fn apply_wraps_failures() {
        let dir = TempDir::new().unwrap();
        let src = sample_jpeg(&dir, "photo.jpg");

        let err = apply_metadata(&src, &input(json!({"GPS": {"Latitude": 95.0, "Longitude": 0.0}})))
            .unwrap_err();
        match err {
            Error::Apply { path, source } => {
                assert_eq!(path, src);
                assert!(matches!(*source, Error::GpsRange { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn apply_json_reports_bad_file() {
        let dir = TempDir::new().unwrap();
        let src = sample_jpeg(&dir, "photo.jpg");
        let json_path = dir.path().join("meta.json");
        fs::write(&json_path, "{ not json").unwrap();

        match apply_json(&src, &json_path).unwrap_err() {
            Error::Apply { source, .. } => assert!(matches!(*source, Error::JsonLoad { .. })),
            other => panic!("unexpected {other:?}"),
        }
    }

    // ── remove ───────────────────────────────────────────────────────

    #[test]
    fn segment_filter() {
        assert!(keeps_segment(0xE0));
        assert!(keeps_segment(0xEE));
        assert!(keeps_segment(0xDB));
        assert!(!keeps_segment(0xE1));
        assert!(!keeps_segment(0xE2));
        assert!(!keeps_segment(0xEF));
        assert!(!keeps_segment(0xFE));
    }

    #[test]
    fn remove_jpeg_metadata_keeps_pixels() {
        let dir = TempDir::new().unwrap();
        let src = sample_jpeg(&dir, "photo.jpg");
        edit_field(&src, &src, "Copyright", "(c) nobody").unwrap();
        let out = dir.path().join("clean.jpg");

        remove_metadata(&src, &out).unwrap();

        assert!(read_metadata(&out).unwrap().is_empty());
        assert_eq!(
            image::open(&src).unwrap().to_rgb8(),
            image::open(&out).unwrap().to_rgb8()
        );
    }

    #[test]
    fn remove_png_reencodes_same_format() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("icon.png");
        let img = RgbaImage::from_fn(5, 7, |x, y| image::Rgba([x as u8, y as u8, 3, 200]));
        img.save_with_format(&src, ImageFormat::Png).unwrap();
        let out = dir.path().join("icon-clean.png");

        remove_metadata(&src, &out).unwrap();

        let bytes = fs::read(&out).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        assert_eq!(image::open(&out).unwrap().to_rgba8(), img);
    }
}
