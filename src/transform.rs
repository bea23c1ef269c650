//! Recompression, resizing and format conversion through the `image` crate.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::error::{Error, Result};
use crate::pipeline::{self, ImageKind};

pub const DEFAULT_QUALITY: u8 = 85;

/// Exact output dimensions, parsed from `WxH`.
///
/// ```rust
/// use imagefox::transform::Resize;
///
/// let size: Resize = "800x600".parse().unwrap();
/// assert_eq!((size.width, size.height), (800, 600));
/// assert!("800x0".parse::<Resize>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Resize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidResize(s.to_string());
        let (w, h) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for Resize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

pub fn parse_resize(s: &str) -> Result<Resize> {
    s.parse()
}

pub fn validate_quality(quality: u8) -> Result<u8> {
    if (1..=100).contains(&quality) {
        Ok(quality)
    } else {
        Err(Error::InvalidQuality(quality))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompressOptions {
    /// JPEG quality, 1–100. Other encoders have no quality setting.
    pub quality: u8,
    pub resize: Option<Resize>,
    pub filter: FilterType,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            resize: None,
            filter: FilterType::Lanczos3,
        }
    }
}

/// Re-encode `input` into the format named by `output`'s extension,
/// optionally resizing to exact dimensions first.
pub fn compress(input: &Path, output: &Path, opts: &CompressOptions) -> Result<()> {
    let quality = validate_quality(opts.quality)?;
    let kind = pipeline::output_kind(output)?;

    let mut img = decode(input)?;
    if let Some(size) = opts.resize {
        log::debug!("Resizing {}x{} -> {size}", img.width(), img.height());
        img = img.resize_exact(size.width, size.height, opts.filter);
    }

    let encoded = match kind {
        ImageKind::Jpeg => encode(prepare(img, kind), kind, Some(quality), output)?,
        _ => {
            log::debug!("Quality {quality} has no effect on {} output", kind.name());
            encode(prepare(img, kind), kind, None, output)?
        }
    };

    pipeline::write_atomic(output, &encoded)?;
    log::info!(
        "Compressed {} -> {} ({} bytes)",
        input.display(),
        output.display(),
        encoded.len()
    );
    Ok(())
}

/// Decode `input` and encode it as `to` (`jpeg`, `png`, `webp`, …).
pub fn convert(input: &Path, output: &Path, to: &str) -> Result<()> {
    let kind = ImageKind::from_name(to).ok_or_else(|| Error::UnsupportedFormat(to.to_string()))?;

    if ImageKind::from_path(output).is_some_and(|ext| ext != kind) {
        log::warn!(
            "{} will contain {} data despite its extension",
            output.display(),
            kind.name()
        );
    }

    let img = decode(input)?;
    let encoded = encode(prepare(img, kind), kind, None, output)?;

    pipeline::write_atomic(output, &encoded)?;
    log::info!("Converted {} -> {} ({})", input.display(), output.display(), kind.name());
    Ok(())
}

fn decode(path: &Path) -> Result<DynamicImage> {
    let bytes = pipeline::read_input(path)?;
    let img = image::load_from_memory(&bytes).map_err(|e| Error::decode(path, e))?;
    log::debug!(
        "Decoded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img)
}

/// Convert to a colour type the target encoder accepts.
fn prepare(img: DynamicImage, kind: ImageKind) -> DynamicImage {
    use DynamicImage::{ImageLuma8, ImageLumaA8, ImageLumaA16, ImageRgb8, ImageRgba8, ImageRgba16};

    let eight_bit = matches!(img, ImageLuma8(_) | ImageLumaA8(_) | ImageRgb8(_) | ImageRgba8(_));
    match kind {
        ImageKind::Jpeg if matches!(img, ImageLuma8(_) | ImageRgb8(_)) => img,
        ImageKind::Jpeg => ImageRgb8(img.to_rgb8()),
        ImageKind::Png => img,
        // The TIFF encoder has no grey+alpha layouts.
        ImageKind::Tiff if matches!(img, ImageLumaA8(_)) => ImageRgba8(img.to_rgba8()),
        ImageKind::Tiff if matches!(img, ImageLumaA16(_)) => ImageRgba16(img.to_rgba16()),
        ImageKind::Tiff => img,
        ImageKind::Gif if matches!(img, ImageRgba8(_)) => img,
        ImageKind::Gif => ImageRgba8(img.to_rgba8()),
        _ if eight_bit => img,
        _ if img.color().has_alpha() => ImageRgba8(img.to_rgba8()),
        _ => ImageRgb8(img.to_rgb8()),
    }
}

fn encode(
    img: DynamicImage,
    kind: ImageKind,
    jpeg_quality: Option<u8>,
    output: &Path,
) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let written = match (kind, jpeg_quality) {
        (ImageKind::Jpeg, Some(quality)) => {
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        }
        _ => img.write_to(&mut buf, kind.image_format()),
    };
    written.map_err(|e| Error::write(output, e))?;
    Ok(buf.into_inner())
}
