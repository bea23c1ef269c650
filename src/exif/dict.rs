use std::collections::BTreeMap;

use serde::Serialize;

use super::tags::{self, Ifd};
use super::value::TagValue;

/// In-memory EXIF block: section → tag ID → value, plus the thumbnail blob.
///
/// Every section in [`Ifd::ALL`] is always present, possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ExifDict {
    sections: BTreeMap<Ifd, BTreeMap<u16, TagValue>>,
    thumbnail: Option<Vec<u8>>,
}

impl Default for ExifDict {
    fn default() -> Self {
        Self::new()
    }
}

impl ExifDict {
    pub fn new() -> Self {
        Self {
            sections: Ifd::ALL.into_iter().map(|ifd| (ifd, BTreeMap::new())).collect(),
            thumbnail: None,
        }
    }

    pub fn section(&self, ifd: Ifd) -> &BTreeMap<u16, TagValue> {
        &self.sections[&ifd]
    }

    pub fn sections(&self) -> impl Iterator<Item = (Ifd, &BTreeMap<u16, TagValue>)> {
        self.sections.iter().map(|(ifd, tags)| (*ifd, tags))
    }

    pub fn get(&self, ifd: Ifd, tag: u16) -> Option<&TagValue> {
        self.section(ifd).get(&tag)
    }

    pub fn set(&mut self, ifd: Ifd, tag: u16, value: TagValue) -> Option<TagValue> {
        self.sections.entry(ifd).or_default().insert(tag, value)
    }

    pub fn remove(&mut self, ifd: Ifd, tag: u16) -> Option<TagValue> {
        self.sections.get_mut(&ifd)?.remove(&tag)
    }

    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    pub fn set_thumbnail(&mut self, thumbnail: Option<Vec<u8>>) {
        self.thumbnail = thumbnail;
    }

    /// Number of tag entries across all sections.
    pub fn len(&self) -> usize {
        self.sections.values().map(BTreeMap::len).sum()
    }

    /// No tags and no thumbnail.
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.thumbnail.is_none()
    }

    /// Resolve tag IDs to names for display.
    ///
    /// Empty sections and the thumbnail blob are left out.
    pub fn view(&self) -> MetadataView {
        let registry = tags::registry();
        let sections = self
            .sections()
            .filter(|(_, tags)| !tags.is_empty())
            .map(|(ifd, tags)| {
                let named = tags
                    .iter()
                    .map(|(&id, value)| (registry.display_name(ifd, id).into_owned(), value.clone()))
                    .collect();
                (ifd, named)
            })
            .collect();
        MetadataView { sections }
    }
}

/// Human-readable projection of an [`ExifDict`]: section → tag name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataView {
    sections: BTreeMap<Ifd, BTreeMap<String, TagValue>>,
}

impl MetadataView {
    pub fn sections(&self) -> impl Iterator<Item = (Ifd, &BTreeMap<String, TagValue>)> {
        self.sections.iter().map(|(ifd, tags)| (*ifd, tags))
    }

    pub fn get(&self, ifd: Ifd, name: &str) -> Option<&TagValue> {
        self.sections.get(&ifd)?.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
