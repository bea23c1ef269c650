use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use exif::{Context, Field, In};
use serde::Serialize;

/// An IFD section of an EXIF block.
///
/// The set is fixed; entries are never filed under a section outside it.
/// `Primary` and `Thumbnail` share the TIFF image tag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Ifd {
    #[serde(rename = "0th")]
    Primary,
    #[serde(rename = "Exif")]
    Exif,
    #[serde(rename = "GPS")]
    Gps,
    #[serde(rename = "Interop")]
    Interop,
    #[serde(rename = "1st")]
    Thumbnail,
}

impl Ifd {
    pub const ALL: [Ifd; 5] = [
        Ifd::Primary,
        Ifd::Exif,
        Ifd::Gps,
        Ifd::Interop,
        Ifd::Thumbnail,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Ifd::Primary => "0th",
            Ifd::Exif => "Exif",
            Ifd::Gps => "GPS",
            Ifd::Interop => "Interop",
            Ifd::Thumbnail => "1st",
        }
    }

    pub(crate) fn context(self) -> Context {
        match self {
            Ifd::Primary | Ifd::Thumbnail => Context::Tiff,
            Ifd::Exif => Context::Exif,
            Ifd::Gps => Context::Gps,
            Ifd::Interop => Context::Interop,
        }
    }

    pub(crate) fn ifd_num(self) -> In {
        match self {
            Ifd::Thumbnail => In::THUMBNAIL,
            _ => In::PRIMARY,
        }
    }

    /// Section a decoded field belongs to, or `None` for IFDs past the thumbnail.
    #[allow(unreachable_patterns)]
    pub(crate) fn of_field(field: &Field) -> Option<Self> {
        match field.tag.context() {
            Context::Tiff if field.ifd_num == In::PRIMARY => Some(Ifd::Primary),
            Context::Tiff if field.ifd_num == In::THUMBNAIL => Some(Ifd::Thumbnail),
            Context::Tiff => None,
            Context::Exif => Some(Ifd::Exif),
            Context::Gps => Some(Ifd::Gps),
            Context::Interop => Some(Ifd::Interop),
            _ => None,
        }
    }
}

impl fmt::Display for Ifd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared TIFF field type of a known tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    Undefined,
    SRational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDef {
    pub id: u16,
    pub name: &'static str,
    pub ty: TagType,
}

const fn tag(id: u16, name: &'static str, ty: TagType) -> TagDef {
    TagDef { id, name, ty }
}

use TagType::{Ascii, Byte, Long, Rational, SRational, Short, Undefined};

// IFD pointers and thumbnail location; the serializer regenerates these.
const TAG_STRIP_OFFSETS: u16 = 0x0111;
const TAG_STRIP_BYTE_COUNTS: u16 = 0x0117;
const TAG_JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;
const TAG_JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_GPS_IFD_POINTER: u16 = 0x8825;
const TAG_INTEROP_IFD_POINTER: u16 = 0xA005;

static IMAGE_TAGS: &[TagDef] = &[
    tag(0x000B, "ProcessingSoftware", Ascii),
    tag(0x00FE, "NewSubfileType", Long),
    tag(0x00FF, "SubfileType", Short),
    tag(0x0100, "ImageWidth", Long),
    tag(0x0101, "ImageLength", Long),
    tag(0x0102, "BitsPerSample", Short),
    tag(0x0103, "Compression", Short),
    tag(0x0106, "PhotometricInterpretation", Short),
    tag(0x0107, "Threshholding", Short),
    tag(0x010A, "FillOrder", Short),
    tag(0x010D, "DocumentName", Ascii),
    tag(0x010E, "ImageDescription", Ascii),
    tag(0x010F, "Make", Ascii),
    tag(0x0110, "Model", Ascii),
    tag(TAG_STRIP_OFFSETS, "StripOffsets", Long),
    tag(0x0112, "Orientation", Short),
    tag(0x0115, "SamplesPerPixel", Short),
    tag(0x0116, "RowsPerStrip", Long),
    tag(TAG_STRIP_BYTE_COUNTS, "StripByteCounts", Long),
    tag(0x011A, "XResolution", Rational),
    tag(0x011B, "YResolution", Rational),
    tag(0x011C, "PlanarConfiguration", Short),
    tag(0x0128, "ResolutionUnit", Short),
    tag(0x012D, "TransferFunction", Short),
    tag(0x0131, "Software", Ascii),
    tag(0x0132, "DateTime", Ascii),
    tag(0x013B, "Artist", Ascii),
    tag(0x013C, "HostComputer", Ascii),
    tag(0x013E, "WhitePoint", Rational),
    tag(0x013F, "PrimaryChromaticities", Rational),
    tag(TAG_JPEG_INTERCHANGE_FORMAT, "JPEGInterchangeFormat", Long),
    tag(TAG_JPEG_INTERCHANGE_FORMAT_LENGTH, "JPEGInterchangeFormatLength", Long),
    tag(0x0211, "YCbCrCoefficients", Rational),
    tag(0x0212, "YCbCrSubSampling", Short),
    tag(0x0213, "YCbCrPositioning", Short),
    tag(0x0214, "ReferenceBlackWhite", Rational),
    tag(0x02BC, "XMLPacket", Byte),
    tag(0x4746, "Rating", Short),
    tag(0x4749, "RatingPercent", Short),
    tag(0x8298, "Copyright", Ascii),
    tag(TAG_EXIF_IFD_POINTER, "ExifTag", Long),
    tag(TAG_GPS_IFD_POINTER, "GPSTag", Long),
    tag(0x9C9B, "XPTitle", Byte),
    tag(0x9C9C, "XPComment", Byte),
    tag(0x9C9D, "XPAuthor", Byte),
    tag(0x9C9E, "XPKeywords", Byte),
    tag(0x9C9F, "XPSubject", Byte),
    tag(0xC4A5, "PrintImageMatching", Undefined),
];

static EXIF_TAGS: &[TagDef] = &[
    tag(0x829A, "ExposureTime", Rational),
    tag(0x829D, "FNumber", Rational),
    tag(0x8822, "ExposureProgram", Short),
    tag(0x8824, "SpectralSensitivity", Ascii),
    tag(0x8827, "ISOSpeedRatings", Short),
    tag(0x8828, "OECF", Undefined),
    tag(0x8830, "SensitivityType", Short),
    tag(0x8831, "StandardOutputSensitivity", Long),
    tag(0x8832, "RecommendedExposureIndex", Long),
    tag(0x9000, "ExifVersion", Undefined),
    tag(0x9003, "DateTimeOriginal", Ascii),
    tag(0x9004, "DateTimeDigitized", Ascii),
    tag(0x9010, "OffsetTime", Ascii),
    tag(0x9011, "OffsetTimeOriginal", Ascii),
    tag(0x9012, "OffsetTimeDigitized", Ascii),
    tag(0x9101, "ComponentsConfiguration", Undefined),
    tag(0x9102, "CompressedBitsPerPixel", Rational),
    tag(0x9201, "ShutterSpeedValue", SRational),
    tag(0x9202, "ApertureValue", Rational),
    tag(0x9203, "BrightnessValue", SRational),
    tag(0x9204, "ExposureBiasValue", SRational),
    tag(0x9205, "MaxApertureValue", Rational),
    tag(0x9206, "SubjectDistance", Rational),
    tag(0x9207, "MeteringMode", Short),
    tag(0x9208, "LightSource", Short),
    tag(0x9209, "Flash", Short),
    tag(0x920A, "FocalLength", Rational),
    tag(0x9214, "SubjectArea", Short),
    tag(0x927C, "MakerNote", Undefined),
    tag(0x9286, "UserComment", Undefined),
    tag(0x9290, "SubSecTime", Ascii),
    tag(0x9291, "SubSecTimeOriginal", Ascii),
    tag(0x9292, "SubSecTimeDigitized", Ascii),
    tag(0xA000, "FlashpixVersion", Undefined),
    tag(0xA001, "ColorSpace", Short),
    tag(0xA002, "PixelXDimension", Long),
    tag(0xA003, "PixelYDimension", Long),
    tag(0xA004, "RelatedSoundFile", Ascii),
    tag(TAG_INTEROP_IFD_POINTER, "InteroperabilityTag", Long),
    tag(0xA20B, "FlashEnergy", Rational),
    tag(0xA20E, "FocalPlaneXResolution", Rational),
    tag(0xA20F, "FocalPlaneYResolution", Rational),
    tag(0xA210, "FocalPlaneResolutionUnit", Short),
    tag(0xA214, "SubjectLocation", Short),
    tag(0xA215, "ExposureIndex", Rational),
    tag(0xA217, "SensingMethod", Short),
    tag(0xA300, "FileSource", Undefined),
    tag(0xA301, "SceneType", Undefined),
    tag(0xA302, "CFAPattern", Undefined),
    tag(0xA401, "CustomRendered", Short),
    tag(0xA402, "ExposureMode", Short),
    tag(0xA403, "WhiteBalance", Short),
    tag(0xA404, "DigitalZoomRatio", Rational),
    tag(0xA405, "FocalLengthIn35mmFilm", Short),
    tag(0xA406, "SceneCaptureType", Short),
    tag(0xA407, "GainControl", Short),
    tag(0xA408, "Contrast", Short),
    tag(0xA409, "Saturation", Short),
    tag(0xA40A, "Sharpness", Short),
    tag(0xA40B, "DeviceSettingDescription", Undefined),
    tag(0xA40C, "SubjectDistanceRange", Short),
    tag(0xA420, "ImageUniqueID", Ascii),
    tag(0xA430, "CameraOwnerName", Ascii),
    tag(0xA431, "BodySerialNumber", Ascii),
    tag(0xA432, "LensSpecification", Rational),
    tag(0xA433, "LensMake", Ascii),
    tag(0xA434, "LensModel", Ascii),
    tag(0xA435, "LensSerialNumber", Ascii),
    tag(0xA500, "Gamma", Rational),
];

static GPS_TAGS: &[TagDef] = &[
    tag(0x0000, "GPSVersionID", Byte),
    tag(0x0001, "GPSLatitudeRef", Ascii),
    tag(0x0002, "GPSLatitude", Rational),
    tag(0x0003, "GPSLongitudeRef", Ascii),
    tag(0x0004, "GPSLongitude", Rational),
    tag(0x0005, "GPSAltitudeRef", Byte),
    tag(0x0006, "GPSAltitude", Rational),
    tag(0x0007, "GPSTimeStamp", Rational),
    tag(0x0008, "GPSSatellites", Ascii),
    tag(0x0009, "GPSStatus", Ascii),
    tag(0x000A, "GPSMeasureMode", Ascii),
    tag(0x000B, "GPSDOP", Rational),
    tag(0x000C, "GPSSpeedRef", Ascii),
    tag(0x000D, "GPSSpeed", Rational),
    tag(0x000E, "GPSTrackRef", Ascii),
    tag(0x000F, "GPSTrack", Rational),
    tag(0x0010, "GPSImgDirectionRef", Ascii),
    tag(0x0011, "GPSImgDirection", Rational),
    tag(0x0012, "GPSMapDatum", Ascii),
    tag(0x0013, "GPSDestLatitudeRef", Ascii),
    tag(0x0014, "GPSDestLatitude", Rational),
    tag(0x0015, "GPSDestLongitudeRef", Ascii),
    tag(0x0016, "GPSDestLongitude", Rational),
    tag(0x0017, "GPSDestBearingRef", Ascii),
    tag(0x0018, "GPSDestBearing", Rational),
    tag(0x0019, "GPSDestDistanceRef", Ascii),
    tag(0x001A, "GPSDestDistance", Rational),
    tag(0x001B, "GPSProcessingMethod", Undefined),
    tag(0x001C, "GPSAreaInformation", Undefined),
    tag(0x001D, "GPSDateStamp", Ascii),
    tag(0x001E, "GPSDifferential", Short),
    tag(0x001F, "GPSHPositioningError", Rational),
];

static INTEROP_TAGS: &[TagDef] = &[
    tag(0x0001, "InteroperabilityIndex", Ascii),
    tag(0x0002, "InteroperabilityVersion", Undefined),
    tag(0x1000, "RelatedImageFileFormat", Ascii),
    tag(0x1001, "RelatedImageWidth", Long),
    tag(0x1002, "RelatedImageLength", Long),
];

/// Static tag definitions for one section.
pub fn table(ifd: Ifd) -> &'static [TagDef] {
    match ifd {
        Ifd::Primary | Ifd::Thumbnail => IMAGE_TAGS,
        Ifd::Exif => EXIF_TAGS,
        Ifd::Gps => GPS_TAGS,
        Ifd::Interop => INTEROP_TAGS,
    }
}

/// Whether the tag describes EXIF layout rather than content.
pub fn is_structural(ifd: Ifd, id: u16) -> bool {
    match ifd {
        Ifd::Primary | Ifd::Thumbnail => matches!(
            id,
            TAG_STRIP_OFFSETS
                | TAG_STRIP_BYTE_COUNTS
                | TAG_JPEG_INTERCHANGE_FORMAT
                | TAG_JPEG_INTERCHANGE_FORMAT_LENGTH
                | TAG_EXIF_IFD_POINTER
                | TAG_GPS_IFD_POINTER
        ),
        Ifd::Exif => id == TAG_INTEROP_IFD_POINTER,
        Ifd::Gps | Ifd::Interop => false,
    }
}

/// Name ↔ ID index over the static tables, scoped by section.
pub struct TagRegistry {
    by_id: HashMap<(Ifd, u16), &'static TagDef>,
    by_name: HashMap<Ifd, HashMap<&'static str, &'static TagDef>>,
}

static REGISTRY: LazyLock<TagRegistry> = LazyLock::new(TagRegistry::build);

/// The process-wide registry, built on first use.
pub fn registry() -> &'static TagRegistry {
    &REGISTRY
}

impl TagRegistry {
    fn build() -> Self {
        let mut by_id = HashMap::new();
        let mut by_name: HashMap<Ifd, HashMap<&'static str, &'static TagDef>> = HashMap::new();
        for ifd in Ifd::ALL {
            let names = by_name.entry(ifd).or_default();
            for def in table(ifd) {
                by_id.entry((ifd, def.id)).or_insert(def);
                // First definition wins if a table ever repeats a name.
                names.entry(def.name).or_insert(def);
            }
        }
        log::debug!("Tag registry built with {} entries", by_id.len());
        Self { by_id, by_name }
    }

    pub fn get(&self, ifd: Ifd, id: u16) -> Option<&'static TagDef> {
        self.by_id.get(&(ifd, id)).copied()
    }

    pub fn lookup(&self, ifd: Ifd, name: &str) -> Option<&'static TagDef> {
        self.by_name.get(&ifd)?.get(name).copied()
    }

    /// Human-readable name, `Tag-<id>` when the section has no definition.
    pub fn display_name(&self, ifd: Ifd, id: u16) -> Cow<'static, str> {
        match self.get(ifd, id) {
            Some(def) => Cow::Borrowed(def.name),
            None => Cow::Owned(format!("Tag-{id}")),
        }
    }
}
