//! Pixel geometry for the gallery grid and the lightbox overlay.

use std::ops::Range;

use crate::events::HitTarget;

pub const HEADER_HEIGHT: f32 = 64.0;

const BUTTON_SIZE: f32 = 48.0;
const BUTTON_MARGIN: f32 = 16.0;
const ARROW_WIDTH: f32 = 56.0;
const ARROW_HEIGHT: f32 = 96.0;
const IMAGE_MARGIN_X: f32 = 88.0;
const IMAGE_MARGIN_Y: f32 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn translate_x(self, dx: f32) -> Self {
        Self {
            x: self.x + dx,
            ..self
        }
    }

    /// Largest rect with aspect `w:h` centered inside `self`.
    pub fn fit(&self, w: u32, h: u32) -> Rect {
        if w == 0 || h == 0 {
            return *self;
        }
        let scale = (self.w / w as f32).min(self.h / h as f32);
        let fw = w as f32 * scale;
        let fh = h as f32 * scale;
        Rect::new(
            self.x + (self.w - fw) / 2.0,
            self.y + (self.h - fh) / 2.0,
            fw,
            fh,
        )
    }
}

/// Thumbnail grid below the page header.
#[derive(Debug, Clone, Copy)]
pub struct GridLayout {
    width: f32,
    height: f32,
    cell: f32,
    gap: f32,
    count: usize,
    columns: usize,
}

impl GridLayout {
    pub fn new(width: f32, height: f32, cell: f32, gap: f32, count: usize) -> Self {
        let usable = (width - gap).max(0.0);
        let columns = ((usable / (cell + gap)).floor() as usize).max(1);
        Self {
            width,
            height,
            cell,
            gap,
            count,
            columns,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    fn rows(&self) -> usize {
        self.count.div_ceil(self.columns)
    }

    fn left(&self) -> f32 {
        let used = self.columns as f32 * self.cell + (self.columns as f32 - 1.0) * self.gap;
        ((self.width - used) / 2.0).max(self.gap)
    }

    pub fn content_height(&self) -> f32 {
        let rows = self.rows() as f32;
        HEADER_HEIGHT + rows * self.cell + (rows + 1.0) * self.gap
    }

    pub fn max_scroll(&self) -> f32 {
        (self.content_height() - self.height).max(0.0)
    }

    pub fn clamp_scroll(&self, scroll: f32) -> f32 {
        scroll.clamp(0.0, self.max_scroll())
    }

    /// Cell of image `ordinal` in window coordinates.
    pub fn cell_rect(&self, ordinal: usize, scroll: f32) -> Rect {
        let col = ordinal % self.columns;
        let row = ordinal / self.columns;
        Rect::new(
            self.left() + col as f32 * (self.cell + self.gap),
            HEADER_HEIGHT + self.gap + row as f32 * (self.cell + self.gap) - scroll,
            self.cell,
            self.cell,
        )
    }

    /// Ordinals of the cells that intersect the viewport.
    pub fn visible_range(&self, scroll: f32) -> Range<usize> {
        let stride = self.cell + self.gap;
        let top = (scroll - self.gap).max(0.0);
        let first_row = (top / stride).floor() as usize;
        let last_row = ((scroll + self.height - HEADER_HEIGHT) / stride).ceil() as usize;
        let start = (first_row * self.columns).min(self.count);
        let end = ((last_row + 1) * self.columns).min(self.count);
        start..end
    }

    pub fn hit_test(&self, x: f32, y: f32, scroll: f32) -> Option<usize> {
        if y < HEADER_HEIGHT {
            return None;
        }
        self.visible_range(scroll)
            .find(|&ordinal| self.cell_rect(ordinal, scroll).contains(x, y))
    }
}

/// Controls and image area of the open lightbox.
#[derive(Debug, Clone, Copy)]
pub struct LightboxLayout {
    width: f32,
    height: f32,
}

impl LightboxLayout {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn close_button(&self) -> Rect {
        Rect::new(
            self.width - BUTTON_MARGIN - BUTTON_SIZE,
            BUTTON_MARGIN,
            BUTTON_SIZE,
            BUTTON_SIZE,
        )
    }

    pub fn previous_arrow(&self) -> Rect {
        Rect::new(
            BUTTON_MARGIN,
            (self.height - ARROW_HEIGHT) / 2.0,
            ARROW_WIDTH,
            ARROW_HEIGHT,
        )
    }

    pub fn next_arrow(&self) -> Rect {
        Rect::new(
            self.width - BUTTON_MARGIN - ARROW_WIDTH,
            (self.height - ARROW_HEIGHT) / 2.0,
            ARROW_WIDTH,
            ARROW_HEIGHT,
        )
    }

    /// Baseline of the "n / total" counter.
    pub fn counter_baseline(&self) -> f32 {
        self.height - IMAGE_MARGIN_Y / 2.0 + 8.0
    }

    pub fn stage(&self) -> Rect {
        Rect::new(
            IMAGE_MARGIN_X,
            IMAGE_MARGIN_Y,
            (self.width - 2.0 * IMAGE_MARGIN_X).max(1.0),
            (self.height - 2.0 * IMAGE_MARGIN_Y).max(1.0),
        )
    }

    /// Where an image of `w`×`h` pixels is drawn when at rest.
    pub fn image_rect(&self, w: u32, h: u32) -> Rect {
        self.stage().fit(w, h)
    }

    /// What the pointer at `(x, y)` is over. Arrows only exist where there is
    /// a neighbour to go to.
    pub fn hit_test(
        &self,
        x: f32,
        y: f32,
        image: Option<Rect>,
        has_previous: bool,
        has_next: bool,
    ) -> HitTarget {
        if self.close_button().contains(x, y) {
            HitTarget::CloseButton
        } else if has_previous && self.previous_arrow().contains(x, y) {
            HitTarget::PreviousArrow
        } else if has_next && self.next_arrow().contains(x, y) {
            HitTarget::NextArrow
        } else if image.unwrap_or_else(|| self.stage()).contains(x, y) {
            HitTarget::Image
        } else {
            HitTarget::Backdrop
        }
    }
}
