use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::time::Instant;

use crate::events::{DecodedImage, Variant};

use super::canvas::RgbaView;

/// Decoded pixels kept by the viewer.
#[derive(Debug)]
pub struct Picture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// When the picture arrived, for fade-in.
    pub arrived: Instant,
}

impl Picture {
    pub fn view(&self) -> RgbaView<'_> {
        RgbaView {
            width: self.width,
            height: self.height,
            pixels: &self.pixels,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Thumbnail,
    Full,
}

impl From<Variant> for Slot {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Thumbnail(_) => Self::Thumbnail,
            Variant::Full(_) => Self::Full,
        }
    }
}

/// Thumbnails and full-size images by catalog ordinal.
///
/// Thumbnails are kept for the life of the window. Full images are evicted
/// once they leave the active neighbourhood.
#[derive(Debug, Default)]
pub struct ImageStore {
    pictures: HashMap<(usize, Slot), Picture>,
    requested: HashSet<(usize, Slot)>,
    failed: HashSet<(usize, Slot)>,
}

impl ImageStore {
    /// Whether `variant` of `ordinal` still has to be requested. Marks it
    /// requested when it does.
    pub fn claim(&mut self, ordinal: usize, variant: Variant) -> bool {
        let key = (ordinal, Slot::from(variant));
        if self.pictures.contains_key(&key) || self.failed.contains(&key) {
            return false;
        }
        self.requested.insert(key)
    }

    /// Undo a [`claim`](Self::claim) whose request could not be sent.
    pub fn unclaim(&mut self, ordinal: usize, variant: Variant) {
        self.requested.remove(&(ordinal, Slot::from(variant)));
    }

    pub fn insert(&mut self, image: DecodedImage, now: Instant) {
        let key = (image.ordinal, Slot::from(image.variant));
        self.requested.remove(&key);
        self.pictures.insert(
            key,
            Picture {
                width: image.width,
                height: image.height,
                pixels: image.pixels,
                arrived: now,
            },
        );
    }

    pub fn mark_failed(&mut self, ordinal: usize, variant: Variant) {
        let key = (ordinal, Slot::from(variant));
        self.requested.remove(&key);
        self.failed.insert(key);
    }

    pub fn thumbnail(&self, ordinal: usize) -> Option<&Picture> {
        self.pictures.get(&(ordinal, Slot::Thumbnail))
    }

    pub fn full(&self, ordinal: usize) -> Option<&Picture> {
        self.pictures.get(&(ordinal, Slot::Full))
    }

    /// Best picture to show in the lightbox for `ordinal`.
    pub fn best(&self, ordinal: usize) -> Option<&Picture> {
        self.full(ordinal).or_else(|| self.thumbnail(ordinal))
    }

    pub fn has_failed(&self, ordinal: usize) -> bool {
        self.failed.contains(&(ordinal, Slot::Thumbnail))
    }

    /// Drop full images outside `keep`.
    pub fn retain_full(&mut self, keep: RangeInclusive<usize>) {
        self.pictures
            .retain(|(ordinal, slot), _| *slot == Slot::Thumbnail || keep.contains(ordinal));
        self.requested
            .retain(|(ordinal, slot)| *slot == Slot::Thumbnail || keep.contains(ordinal));
    }
}
