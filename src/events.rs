use std::path::PathBuf;
use std::time::Duration;

use crate::lightbox::Status;

/// Keys the lightbox reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
}

/// Part of the open lightbox under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Image,
    Backdrop,
    CloseButton,
    PreviousArrow,
    NextArrow,
}

/// Input forwarded from the window to the lightbox task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightboxInput {
    /// A thumbnail was activated.
    Open(usize),
    PointerDown { x: f32 },
    PointerMove { x: f32 },
    /// Pointer released over `target`.
    PointerUp { target: HitTarget },
    PointerCancel,
    /// Click that did not go through the pointer tracker.
    Click(HitTarget),
    Key(Key),
    /// Platform back navigation (mouse back button, Alt+Left, Backspace).
    Back,
    /// Platform forward navigation.
    Forward,
    Resize { width: f32 },
}

/// How the renderer should reach `Frame::offset_px`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Jump straight to the offset.
    Immediate,
    /// Ease from whatever is on screen to the offset.
    Ease(Duration),
    /// Snap to `from_px`, then ease to the offset.
    EnterFrom { from_px: f32, duration: Duration },
}

/// Everything the renderer needs to draw the lightbox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub status: Status,
    pub active_index: Option<usize>,
    pub offset_px: f32,
    pub motion: Motion,
    pub dragging: bool,
    /// A drag has claimed the pointer; page scrolling must stay put.
    pub gesture_claimed: bool,
    pub catalog_len: usize,
}

impl Frame {
    pub fn closed(catalog_len: usize) -> Self {
        Self {
            status: Status::Closed,
            active_index: None,
            offset_px: 0.0,
            motion: Motion::Immediate,
            dragging: false,
            gesture_claimed: false,
            catalog_len,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.status != Status::Closed
    }
}

/// Resolution requested from the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Square-ish grid preview, longest side at most this many pixels.
    Thumbnail(u32),
    /// Lightbox image, longest side at most this many pixels.
    Full(u32),
}

#[derive(Debug, Clone)]
pub struct DecodeRequest {
    pub ordinal: usize,
    pub path: PathBuf,
    pub variant: Variant,
}

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub ordinal: usize,
    pub variant: Variant,
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major.
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum LoaderEvent {
    Decoded(DecodedImage),
    Failed { ordinal: usize, variant: Variant },
}
