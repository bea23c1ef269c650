//! # imagefox
//!
//! Image compression, format conversion, and EXIF metadata editing: view, edit,
//! strip, or replace the EXIF block of a JPEG, including GPS positions given in
//! decimal degrees.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imagefox::exif::{self, Ifd};
//! use std::path::Path;
//!
//! fn main() -> imagefox::Result<()> {
//!     let photo = Path::new("photo.jpg");
//!
//!     // Set the camera model, writing a copy
//!     exif::edit_field(photo, Path::new("tagged.jpg"), "Model", "X100V")?;
//!
//!     // Read it back with tag names resolved
//!     let view = exif::read_metadata(Path::new("tagged.jpg"))?;
//!     println!("Model: {:?}", view.get(Ifd::Primary, "Model"));
//!
//!     // Strip all metadata
//!     exif::remove_metadata(photo, Path::new("clean.jpg"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Structured Metadata
//!
//! [`exif::apply_json`] replaces the EXIF block from a JSON file:
//!
//! ```json
//! {
//!   "0th":  {"Make": "Fujifilm", "Orientation": 1},
//!   "Exif": {"ExposureTime": [1, 250], "ISOSpeedRatings": 200},
//!   "GPS":  {"Latitude": 40.6892, "Longitude": -74.0445}
//! }
//! ```
//!
//! Values are coerced to each tag's declared type; names a section does not
//! define are logged and dropped.
//!
//! ## Transforms
//!
//! ```rust,no_run
//! use imagefox::transform::{compress, convert, CompressOptions, Resize};
//! use std::path::Path;
//!
//! fn main() -> imagefox::Result<()> {
//!     let opts = CompressOptions {
//!         quality: 70,
//!         resize: Some(Resize { width: 1280, height: 720 }),
//!         ..Default::default()
//!     };
//!     compress(Path::new("in.png"), Path::new("out.jpg"), &opts)?;
//!     convert(Path::new("in.png"), Path::new("out.webp"), "webp")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Compress / Convert | EXIF |
//! |--------|--------------------|------|
//! | JPEG (`.jpg`, `.jpeg`) | yes | read, write, remove |
//! | PNG (`.png`) | yes | remove |
//! | WebP (`.webp`) | yes | remove |
//! | TIFF (`.tif`, `.tiff`) | yes | remove |
//! | BMP (`.bmp`) | yes | remove |
//! | GIF (`.gif`) | yes | remove |
//!
//! ## Modules
//!
//! - [`config`] — Configuration types and loading/saving
//! - [`error`] — The [`Error`] type shared by every operation
//! - [`exif`] — EXIF reading, editing, and writing
//! - [`pipeline`] — Format detection, atomic writes, backups
//! - [`transform`] — Compression, resizing, and conversion

pub mod config;
pub mod error;
pub mod exif;
pub mod pipeline;
pub mod transform;

pub use error::{Error, Result};
