use std::borrow::Cow;
use std::fmt;

use serde::{Serialize, Serializer};

/// Unsigned EXIF rational (`num / denom`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: u32,
    pub denom: u32,
}

impl Rational {
    pub const fn new(num: u32, denom: u32) -> Self {
        Self { num, denom }
    }

    /// Same value in lowest terms; zero becomes `0/1`.
    pub fn reduced(self) -> Self {
        let g = gcd(self.num, self.denom);
        if g == 0 {
            return self;
        }
        Self::new(self.num / g, self.denom / g)
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.denom as f64
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.denom)
    }
}

impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.num, self.denom).serialize(serializer)
    }
}

impl From<Rational> for exif::Rational {
    fn from(r: Rational) -> Self {
        exif::Rational {
            num: r.num,
            denom: r.denom,
        }
    }
}

impl From<&exif::Rational> for Rational {
    fn from(r: &exif::Rational) -> Self {
        Self::new(r.num, r.denom)
    }
}

/// Signed EXIF rational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SRational {
    pub num: i32,
    pub denom: i32,
}

impl fmt::Display for SRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.denom)
    }
}

impl Serialize for SRational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.num, self.denom).serialize(serializer)
    }
}

/// A tag value, one variant per TIFF field type.
///
/// `Ascii` holds the string bytes without the NUL terminator.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Byte(Vec<u8>),
    Ascii(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<Rational>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<SRational>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl TagValue {
    /// UTF-8 bytes of `s` as an ASCII-typed value.
    pub fn ascii(s: &str) -> Self {
        Self::Ascii(s.as_bytes().to_vec())
    }

    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Ascii(bytes) => Some(String::from_utf8_lossy(bytes)),
            _ => None,
        }
    }

    /// `None` for values of a type the TIFF spec does not define.
    pub(crate) fn from_exif(value: &exif::Value) -> Option<Self> {
        use exif::Value;
        #[allow(unreachable_patterns)]
        let converted = match value {
            Value::Byte(v) => Self::Byte(v.clone()),
            Value::Ascii(parts) => Self::Ascii(parts.join(&0u8)),
            Value::Short(v) => Self::Short(v.clone()),
            Value::Long(v) => Self::Long(v.clone()),
            Value::Rational(v) => Self::Rational(v.iter().map(Rational::from).collect()),
            Value::SByte(v) => Self::SByte(v.clone()),
            Value::Undefined(v, _) => Self::Undefined(v.clone()),
            Value::SShort(v) => Self::SShort(v.clone()),
            Value::SLong(v) => Self::SLong(v.clone()),
            Value::SRational(v) => Self::SRational(
                v.iter()
                    .map(|r| SRational {
                        num: r.num,
                        denom: r.denom,
                    })
                    .collect(),
            ),
            Value::Float(v) => Self::Float(v.clone()),
            Value::Double(v) => Self::Double(v.clone()),
            _ => return None,
        };
        Some(converted)
    }

    pub(crate) fn to_exif(&self) -> exif::Value {
        use exif::Value;
        match self {
            Self::Byte(v) => Value::Byte(v.clone()),
            Self::Ascii(bytes) => {
                Value::Ascii(bytes.split(|&b| b == 0).map(<[u8]>::to_vec).collect())
            }
            Self::Short(v) => Value::Short(v.clone()),
            Self::Long(v) => Value::Long(v.clone()),
            Self::Rational(v) => Value::Rational(v.iter().copied().map(Into::into).collect()),
            Self::SByte(v) => Value::SByte(v.clone()),
            Self::Undefined(v) => Value::Undefined(v.clone(), 0),
            Self::SShort(v) => Value::SShort(v.clone()),
            Self::SLong(v) => Value::SLong(v.clone()),
            Self::SRational(v) => Value::SRational(
                v.iter()
                    .map(|r| exif::SRational {
                        num: r.num,
                        denom: r.denom,
                    })
                    .collect(),
            ),
            Self::Float(v) => Value::Float(v.clone()),
            Self::Double(v) => Value::Double(v.clone()),
        }
    }
}

/// Longest byte run rendered in full before it is summarised.
const MAX_BYTES_SHOWN: usize = 16;

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascii(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Self::Byte(bytes) | Self::Undefined(bytes) => fmt_bytes(bytes, f),
            Self::Short(v) => join(v, f),
            Self::Long(v) => join(v, f),
            Self::Rational(v) => join(v, f),
            Self::SByte(v) => join(v, f),
            Self::SShort(v) => join(v, f),
            Self::SLong(v) => join(v, f),
            Self::SRational(v) => join(v, f),
            Self::Float(v) => join(v, f),
            Self::Double(v) => join(v, f),
        }
    }
}

fn join<T: fmt::Display>(items: &[T], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn fmt_bytes(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = bytes.strip_suffix(&[0]).unwrap_or(bytes);
    if let Ok(s) = std::str::from_utf8(text) {
        if !s.is_empty() && s.chars().all(|c| !c.is_control()) {
            return f.write_str(s);
        }
    }
    for (i, b) in bytes.iter().take(MAX_BYTES_SHOWN).enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{b:02x}")?;
    }
    if bytes.len() > MAX_BYTES_SHOWN {
        write!(f, " … ({} bytes)", bytes.len())?;
    }
    Ok(())
}

impl Serialize for TagValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ascii(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
            Self::Byte(v) | Self::Undefined(v) => v.serialize(serializer),
            Self::Short(v) => one_or_many(v, serializer),
            Self::Long(v) => one_or_many(v, serializer),
            Self::Rational(v) => one_or_many(v, serializer),
            Self::SByte(v) => one_or_many(v, serializer),
            Self::SShort(v) => one_or_many(v, serializer),
            Self::SLong(v) => one_or_many(v, serializer),
            Self::SRational(v) => one_or_many(v, serializer),
            Self::Float(v) => one_or_many(v, serializer),
            Self::Double(v) => one_or_many(v, serializer),
        }
    }
}

// Single-component values serialize as scalars, which is also the shape
// structured metadata input accepts.
fn one_or_many<T: Serialize, S: Serializer>(items: &[T], serializer: S) -> Result<S::Ok, S::Error> {
    match items {
        [one] => one.serialize(serializer),
        _ => items.serialize(serializer),
    }
}
