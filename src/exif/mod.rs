//! EXIF metadata reading, editing and writing for JPEG files.
//!
//! - [`read_exif`] / [`read_metadata`] — decode the APP1 EXIF block into an
//!   [`ExifDict`], or a [`MetadataView`] with tag names resolved
//! - [`write_exif`] — embed a dictionary, copying the scan data verbatim
//! - [`edit_field`] — set one allow-listed field ([`EDITABLE_FIELDS`])
//! - [`apply_json`] / [`apply_metadata`] — replace the block from structured input
//! - [`remove_metadata`] — strip every metadata segment
//!
//! Tag names come from a static table indexed once into a [`TagRegistry`].

mod dict;
mod editor;
pub mod gps;
mod reader;
mod tags;
mod value;
mod writer;

pub use dict::{ExifDict, MetadataView};
pub use editor::{
    EDITABLE_FIELDS, EditableField, GpsInput, MetadataInput, apply_json, apply_metadata,
    edit_field, editable_field, remove_metadata,
};
pub use gps::GpsCoordinate;
pub use reader::{read_exif, read_metadata};
pub use tags::{Ifd, TagDef, TagRegistry, TagType, registry};
pub use value::{Rational, SRational, TagValue};
pub use writer::{encode_tiff, write_exif};
