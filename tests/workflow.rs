use std::fs;
use std::path::PathBuf;

use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
use imagefox::exif::{self, Ifd, MetadataInput, Rational, TagValue};
use imagefox::transform::{self, CompressOptions, Resize};
use imagefox::{Error, pipeline};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use serde_json::json;
use tempfile::TempDir;

fn photo(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
    .save_with_format(&path, ImageFormat::Jpeg)
    .unwrap();
    path
}

fn dms(view: &exif::MetadataView, name: &str) -> Vec<Rational> {
    match view.get(Ifd::Gps, name) {
        Some(TagValue::Rational(parts)) => parts.clone(),
        other => panic!("{name}: {other:?}"),
    }
}

// ── compress ─────────────────────────────────────────────────────────

#[test]
fn compress_without_resize_keeps_dimensions() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "big.jpg", 120, 80);
    let output = dir.path().join("small.jpg");

    transform::compress(&input, &output, &CompressOptions { quality: 40, ..Default::default() })
        .unwrap();

    assert_eq!(image::open(&output).unwrap().dimensions(), (120, 80));
}

#[test]
fn compress_with_resize_is_exact() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "big.jpg", 120, 80);
    let output = dir.path().join("thumb.png");

    let opts = CompressOptions {
        resize: Some("33x77".parse::<Resize>().unwrap()),
        ..Default::default()
    };
    transform::compress(&input, &output, &opts).unwrap();

    assert_eq!(image::open(&output).unwrap().dimensions(), (33, 77));
}

// ── metadata-edit ────────────────────────────────────────────────────

#[test]
fn edited_field_reads_back_verbatim() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 32, 32);
    let output = dir.path().join("out.jpg");

    exif::edit_field(&input, &output, "DateTime", "2023:12:24 18:30:00").unwrap();

    let view = exif::read_metadata(&output).unwrap();
    let value = view.get(Ifd::Primary, "DateTime").unwrap();
    assert_eq!(value.as_text().as_deref(), Some("2023:12:24 18:30:00"));
}

#[test]
fn non_ascii_values_round_trip_as_utf8() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 32, 32);

    exif::edit_field(&input, &input, "Artist", "Zoë Müller").unwrap();

    let view = exif::read_metadata(&input).unwrap();
    let artist = view.get(Ifd::Primary, "Artist").unwrap();
    assert_eq!(artist.as_text().as_deref(), Some("Zoë Müller"));
}

#[test]
fn unsupported_field_creates_no_output() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 32, 32);
    let before = fs::read(&input).unwrap();
    let output = dir.path().join("out.jpg");

    let err = exif::edit_field(&input, &output, "LensModel", "50mm").unwrap_err();

    assert!(matches!(err, Error::UnsupportedField { .. }));
    assert!(!output.exists());
    assert_eq!(fs::read(&input).unwrap(), before);
}

#[test]
fn png_cannot_carry_exif() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    RgbImage::new(4, 4).save_with_format(&input, ImageFormat::Png).unwrap();

    match exif::read_metadata(&input) {
        Err(Error::ExifUnsupported { format, .. }) => assert_eq!(format, "PNG"),
        other => panic!("unexpected {other:?}"),
    }
}

// ── metadata-write ───────────────────────────────────────────────────

#[test]
fn statue_of_liberty_position() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "liberty.jpg", 16, 16);
    let json_path = dir.path().join("meta.json");
    fs::write(
        &json_path,
        json!({"GPS": {"Latitude": 40.6892, "Longitude": -74.0445}}).to_string(),
    )
    .unwrap();

    exif::apply_json(&input, &json_path).unwrap();

    let view = exif::read_metadata(&input).unwrap();
    let lat = dms(&view, "GPSLatitude");
    assert_eq!(lat[0], Rational::new(40, 1));
    assert_eq!(lat[1], Rational::new(41, 1));
    assert!((lat[2].to_f64() - 21.12).abs() < 1e-4);
    assert_eq!(view.get(Ifd::Gps, "GPSLatitudeRef"), Some(&TagValue::ascii("N")));
    assert_eq!(view.get(Ifd::Gps, "GPSLongitudeRef"), Some(&TagValue::ascii("W")));
}

#[test]
fn sydney_position() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "sydney.jpg", 16, 16);
    let meta: MetadataInput =
        serde_json::from_value(json!({"GPS": {"Latitude": -33.8688, "Longitude": 151.2093}}))
            .unwrap();

    exif::apply_metadata(&input, &meta).unwrap();

    let view = exif::read_metadata(&input).unwrap();
    assert_eq!(view.get(Ifd::Gps, "GPSLatitudeRef"), Some(&TagValue::ascii("S")));
    assert_eq!(view.get(Ifd::Gps, "GPSLongitudeRef"), Some(&TagValue::ascii("E")));

    let lat = dms(&view, "GPSLatitude");
    assert_eq!((lat[0], lat[1]), (Rational::new(33, 1), Rational::new(52, 1)));
    assert!((lat[2].to_f64() - 7.68).abs() < 1e-4);

    let lon = dms(&view, "GPSLongitude");
    assert_eq!((lon[0], lon[1]), (Rational::new(151, 1), Rational::new(12, 1)));
    assert!((lon[2].to_f64() - 33.48).abs() < 1e-4);
}

#[test]
fn empty_structured_input_is_valid() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 16, 16);
    exif::edit_field(&input, &input, "Model", "before").unwrap();
    let json_path = dir.path().join("empty.json");
    fs::write(&json_path, "{}").unwrap();

    exif::apply_json(&input, &json_path).unwrap();

    assert!(exif::read_metadata(&input).unwrap().is_empty());
    let jpeg = Jpeg::from_bytes(Bytes::from(fs::read(&input).unwrap())).unwrap();
    let block = jpeg.exif().expect("EXIF segment kept");
    assert!(!block.is_empty());
}

#[test]
fn structured_input_sets_typed_tags() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 16, 16);
    let json_path = dir.path().join("meta.json");
    fs::write(
        &json_path,
        json!({
            "0th": {"Make": "Leica", "Orientation": 1, "Bogus": "dropped"},
            "Exif": {"FNumber": [28, 10], "ISOSpeedRatings": 400}
        })
        .to_string(),
    )
    .unwrap();

    exif::apply_json(&input, &json_path).unwrap();

    let view = exif::read_metadata(&input).unwrap();
    assert_eq!(view.get(Ifd::Primary, "Make"), Some(&TagValue::ascii("Leica")));
    assert_eq!(view.get(Ifd::Primary, "Orientation"), Some(&TagValue::Short(vec![1])));
    assert_eq!(
        view.get(Ifd::Exif, "FNumber"),
        Some(&TagValue::Rational(vec![Rational::new(28, 10)]))
    );
    assert_eq!(view.get(Ifd::Exif, "ISOSpeedRatings"), Some(&TagValue::Short(vec![400])));
    assert!(view.get(Ifd::Primary, "Bogus").is_none());
}

#[test]
fn failed_apply_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 16, 16);
    let before = fs::read(&input).unwrap();
    let json_path = dir.path().join("meta.json");
    fs::write(
        &json_path,
        json!({"0th": {"Make": "Pentax"}, "GPS": {"Latitude": 123.0, "Longitude": 0.0}}).to_string(),
    )
    .unwrap();

    let err = exif::apply_json(&input, &json_path).unwrap_err();

    assert!(matches!(err, Error::Apply { .. }));
    assert_eq!(fs::read(&input).unwrap(), before);
}

// ── metadata-remove ──────────────────────────────────────────────────

#[test]
fn remove_then_view_is_empty_and_pixels_match() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 40, 30);
    exif::edit_field(&input, &input, "Copyright", "2024 someone").unwrap();
    exif::edit_field(&input, &input, "Software", "imagefox").unwrap();
    let output = dir.path().join("clean.jpg");

    exif::remove_metadata(&input, &output).unwrap();

    assert!(exif::read_metadata(&output).unwrap().is_empty());
    assert_eq!(
        image::open(&input).unwrap().to_rgb8(),
        image::open(&output).unwrap().to_rgb8()
    );
}

#[test]
fn remove_in_place() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 8, 8);
    exif::edit_field(&input, &input, "Make", "Olympus").unwrap();

    exif::remove_metadata(&input, &input).unwrap();
    assert!(exif::read_exif(&input).unwrap().is_empty());
}

// ── convert ──────────────────────────────────────────────────────────

#[test]
fn convert_drops_exif_for_png_target() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 24, 24);
    exif::edit_field(&input, &input, "Model", "GR III").unwrap();
    let output = dir.path().join("out.png");

    transform::convert(&input, &output, "png").unwrap();

    assert_eq!(pipeline::ImageKind::from_path(&output), Some(pipeline::ImageKind::Png));
    assert_eq!(image::open(&output).unwrap().dimensions(), (24, 24));
    assert!(matches!(
        exif::read_exif(&output),
        Err(Error::ExifUnsupported { .. })
    ));
}

#[test]
fn backup_keeps_original_bytes() {
    let dir = TempDir::new().unwrap();
    let input = photo(&dir, "in.jpg", 8, 8);
    let before = fs::read(&input).unwrap();

    let backup = pipeline::backup_file(&input).unwrap();
    exif::edit_field(&input, &input, "Model", "changed").unwrap();

    assert_eq!(backup, dir.path().join("in.jpg.bak"));
    assert_eq!(fs::read(&backup).unwrap(), before);
    assert_ne!(fs::read(&input).unwrap(), before);
}
