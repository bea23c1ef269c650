//! Decimal degrees to the EXIF GPS representation.
//!
//! EXIF stores a coordinate as a reference letter (`N`/`S`, `E`/`W`) and the
//! unsigned magnitude as three rationals: degrees, minutes, seconds.

use crate::error::{Error, Result};

use super::dict::ExifDict;
use super::tags::Ifd;
use super::value::{Rational, TagValue};

const TAG_GPS_VERSION_ID: u16 = 0x0000;
const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
const TAG_GPS_LATITUDE: u16 = 0x0002;
const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
const TAG_GPS_LONGITUDE: u16 = 0x0004;

const GPS_VERSION: [u8; 4] = [2, 2, 0, 0];

/// Seconds keep four decimal places.
const SECONDS_SCALE: u32 = 10_000;

/// One encoded axis of a GPS position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsCoordinate {
    pub reference: char,
    pub dms: [Rational; 3],
}

impl GpsCoordinate {
    /// Signed decimal degrees this coordinate encodes.
    pub fn to_decimal(&self) -> f64 {
        let [d, m, s] = self.dms;
        let magnitude = d.to_f64() + m.to_f64() / 60.0 + s.to_f64() / 3600.0;
        if matches!(self.reference, 'S' | 'W') {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// Split a non-negative magnitude into degrees, minutes and seconds.
///
/// Degrees and minutes are whole numbers over 1. Seconds are rounded to four
/// decimal places (ties to even) and reduced, so the denominator never
/// exceeds 10000.
pub fn encode_dms(magnitude: f64) -> [Rational; 3] {
    let degrees = magnitude.trunc();
    let minutes_full = (magnitude - degrees) * 60.0;
    let minutes = minutes_full.trunc();
    let seconds = (minutes_full - minutes) * 60.0;
    let scaled = (seconds * SECONDS_SCALE as f64).round_ties_even();

    [
        Rational::new(degrees as u32, 1),
        Rational::new(minutes as u32, 1),
        Rational::new(scaled as u32, SECONDS_SCALE).reduced(),
    ]
}

pub fn latitude(degrees: f64) -> Result<GpsCoordinate> {
    encode_axis("latitude", degrees, 90.0, ['N', 'S'])
}

pub fn longitude(degrees: f64) -> Result<GpsCoordinate> {
    encode_axis("longitude", degrees, 180.0, ['E', 'W'])
}

fn encode_axis(axis: &'static str, value: f64, limit: f64, refs: [char; 2]) -> Result<GpsCoordinate> {
    if !value.is_finite() || value.abs() > limit {
        return Err(Error::GpsRange { axis, value, limit });
    }
    let reference = if value >= 0.0 { refs[0] } else { refs[1] };
    Ok(GpsCoordinate {
        reference,
        dms: encode_dms(value.abs()),
    })
}

/// Store a position in the GPS section, replacing any previous one.
pub fn write_position(dict: &mut ExifDict, lat: f64, lon: f64) -> Result<()> {
    let lat = latitude(lat)?;
    let lon = longitude(lon)?;

    dict.set(Ifd::Gps, TAG_GPS_VERSION_ID, TagValue::Byte(GPS_VERSION.to_vec()));
    dict.set(Ifd::Gps, TAG_GPS_LATITUDE_REF, reference_value(lat.reference));
    dict.set(Ifd::Gps, TAG_GPS_LATITUDE, TagValue::Rational(lat.dms.to_vec()));
    dict.set(Ifd::Gps, TAG_GPS_LONGITUDE_REF, reference_value(lon.reference));
    dict.set(Ifd::Gps, TAG_GPS_LONGITUDE, TagValue::Rational(lon.dms.to_vec()));

    log::debug!(
        "GPS: {}{} {}{}",
        lat.reference,
        lat.to_decimal().abs(),
        lon.reference,
        lon.to_decimal().abs()
    );
    Ok(())
}

fn reference_value(reference: char) -> TagValue {
    TagValue::Ascii(vec![reference as u8])
}
