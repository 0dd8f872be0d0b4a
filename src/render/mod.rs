//! Software rendering of the gallery page and the lightbox overlay.

pub mod canvas;
pub mod font;
pub mod layout;
pub mod motion;
pub mod store;

use std::time::{Duration, Instant};

use ab_glyph::{FontArc, PxScale};

use canvas::{Canvas, Color};
use layout::{GridLayout, HEADER_HEIGHT, LightboxLayout, Rect};
use store::ImageStore;

const PAGE_BG: u32 = 0x111318;
const HEADER_BG: u32 = 0x1B1E25;
const TEXT: u32 = 0xECEFF4;
const MUTED_TEXT: u32 = 0x8F96A3;
const PLACEHOLDER: u32 = 0x262A33;
const FAILED: u32 = 0x3A2A2E;
const BACKDROP: u32 = 0x000000;
const BACKDROP_ALPHA: f32 = 0.92;
const CONTROL_BG: u32 = 0xFFFFFF;
const CONTROL_ALPHA: f32 = 0.12;
const EMPTY_BAR_WIDTH: f32 = 240.0;
const EMPTY_BAR_HEIGHT: f32 = 8.0;

/// The lightbox as it should appear in this frame.
#[derive(Debug, Clone, Copy)]
pub struct LightboxView {
    pub index: usize,
    pub len: usize,
    /// Horizontal displacement of the image, already interpolated.
    pub offset_px: f32,
    /// 1.0 while open, falling to 0.0 while closing.
    pub opacity: f32,
}

impl LightboxView {
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.len
    }
}

pub struct SceneView<'a> {
    pub grid: GridLayout,
    pub scroll: f32,
    pub catalog_len: usize,
    /// Shown instead of the grid when the catalog is empty.
    pub empty_message: Option<&'a str>,
    pub store: &'a ImageStore,
    pub fade_in: Duration,
    pub now: Instant,
    pub lightbox: Option<LightboxView>,
}

/// Rect the lightbox image occupies at rest, or the whole stage while the
/// picture is still loading.
pub fn lightbox_image_rect(layout: &LightboxLayout, store: &ImageStore, index: usize) -> Rect {
    store
        .best(index)
        .map_or_else(|| layout.stage(), |p| layout.image_rect(p.width, p.height))
}

pub struct Renderer {
    font: Option<FontArc>,
    title: String,
}

impl Renderer {
    pub fn new(font: Option<FontArc>, title: String) -> Self {
        Self { font, title }
    }

    pub fn draw(&self, canvas: &mut Canvas, view: &SceneView<'_>) {
        canvas.clear(Color::from_rgb(PAGE_BG));
        self.draw_grid(canvas, view);
        self.draw_header(canvas, view);
        if let Some(lightbox) = view.lightbox {
            self.draw_lightbox(canvas, view.store, lightbox);
        }
    }

    fn draw_header(&self, canvas: &mut Canvas, view: &SceneView<'_>) {
        let width = canvas.width() as f32;
        canvas.fill_rect(
            Rect::new(0.0, 0.0, width, HEADER_HEIGHT),
            Color::from_rgb(HEADER_BG),
        );
        let Some(font) = self.font.as_ref() else {
            return;
        };
        canvas.draw_text(
            font,
            &self.title,
            Color::from_rgb(TEXT),
            24.0,
            HEADER_HEIGHT / 2.0 + 10.0,
            PxScale::from(28.0),
        );
        if view.catalog_len > 0 {
            let count = format!("{} images", view.catalog_len);
            let scale = PxScale::from(18.0);
            let w = canvas::measure_text(&count, font, scale);
            canvas.draw_text(
                font,
                &count,
                Color::from_rgb(MUTED_TEXT),
                width - 24.0 - w,
                HEADER_HEIGHT / 2.0 + 7.0,
                scale,
            );
        }
    }

    fn draw_grid(&self, canvas: &mut Canvas, view: &SceneView<'_>) {
        if view.catalog_len == 0 {
            if let Some(message) = view.empty_message {
                self.draw_empty_state(canvas, message);
            }
            return;
        }
        for ordinal in view.grid.visible_range(view.scroll) {
            let cell = view.grid.cell_rect(ordinal, view.scroll);
            let placeholder = if view.store.has_failed(ordinal) {
                FAILED
            } else {
                PLACEHOLDER
            };
            canvas.fill_rect(cell, Color::from_rgb(placeholder));
            if let Some(thumb) = view.store.thumbnail(ordinal) {
                let alpha = motion::progress(thumb.arrived, view.fade_in, view.now);
                let dst = cell.fit(thumb.width, thumb.height);
                canvas.draw_image(thumb.view(), dst, alpha);
            }
        }
    }

    /// Centered message, or a muted bar in its place when no font loaded.
    fn draw_empty_state(&self, canvas: &mut Canvas, message: &str) {
        let width = canvas.width() as f32;
        let height = canvas.height() as f32;
        match self.font.as_ref() {
            Some(font) => canvas.draw_text_centered(
                font,
                message,
                Color::from_rgb(MUTED_TEXT),
                width / 2.0,
                height / 2.0,
                PxScale::from(22.0),
            ),
            None => {
                let bar_w = (width / 2.0).min(EMPTY_BAR_WIDTH);
                canvas.fill_rect(
                    Rect::new(
                        (width - bar_w) / 2.0,
                        (height - EMPTY_BAR_HEIGHT) / 2.0,
                        bar_w,
                        EMPTY_BAR_HEIGHT,
                    ),
                    Color::from_rgb(MUTED_TEXT),
                );
            }
        }
    }

    fn draw_lightbox(&self, canvas: &mut Canvas, store: &ImageStore, view: LightboxView) {
        let width = canvas.width() as f32;
        let height = canvas.height() as f32;
        let layout = LightboxLayout::new(width, height);
        let opacity = view.opacity.clamp(0.0, 1.0);

        canvas.fill_rect(
            Rect::new(0.0, 0.0, width, height),
            Color::from_rgba(BACKDROP, BACKDROP_ALPHA * opacity),
        );

        let rect = lightbox_image_rect(&layout, store, view.index).translate_x(view.offset_px);
        match store.best(view.index) {
            Some(picture) => canvas.draw_image(picture.view(), rect, opacity),
            None => canvas.fill_rect(rect, Color::from_rgba(PLACEHOLDER, opacity)),
        }

        let control = Color::from_rgba(CONTROL_BG, CONTROL_ALPHA * opacity);
        let close = layout.close_button();
        canvas.fill_rect(close, control);
        if view.has_previous() {
            canvas.fill_rect(layout.previous_arrow(), control);
        }
        if view.has_next() {
            canvas.fill_rect(layout.next_arrow(), control);
        }

        let Some(font) = self.font.as_ref() else {
            return;
        };
        let text = Color::from_rgba(TEXT, opacity);
        let glyph_scale = PxScale::from(36.0);
        canvas.draw_text_centered(
            font,
            "×",
            text,
            close.center_x(),
            close.center_y() + 12.0,
            glyph_scale,
        );
        if view.has_previous() {
            let arrow = layout.previous_arrow();
            canvas.draw_text_centered(
                font,
                "‹",
                text,
                arrow.center_x(),
                arrow.center_y() + 12.0,
                glyph_scale,
            );
        }
        if view.has_next() {
            let arrow = layout.next_arrow();
            canvas.draw_text_centered(
                font,
                "›",
                text,
                arrow.center_x(),
                arrow.center_y() + 12.0,
                glyph_scale,
            );
        }
        let counter = format!("{} / {}", view.index + 1, view.len);
        canvas.draw_text_centered(
            font,
            &counter,
            Color::from_rgba(MUTED_TEXT, opacity),
            width / 2.0,
            layout.counter_baseline(),
            PxScale::from(18.0),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: u32 = 400;
    const HEIGHT: u32 = 300;

    fn packed(hex: u32) -> u32 {
        0xFF00_0000 | hex
    }

    fn scene<'a>(store: &'a ImageStore, len: usize) -> SceneView<'a> {
        SceneView {
            grid: GridLayout::new(WIDTH as f32, HEIGHT as f32, 220.0, 12.0, len),
            scroll: 0.0,
            catalog_len: len,
            empty_message: Some("No images in /srv/gallery"),
            store,
            fade_in: Duration::from_millis(300),
            now: Instant::now(),
            lightbox: None,
        }
    }

    fn pixel(canvas: &Canvas, x: u32, y: u32) -> u32 {
        canvas.pixels()[(y * canvas.width() + x) as usize]
    }

    #[test]
    fn empty_catalog_paints_no_cells() {
        let store = ImageStore::default();
        let renderer = Renderer::new(None, "Gallery".into());
        let mut canvas = Canvas::new(WIDTH, HEIGHT);
        renderer.draw(&mut canvas, &scene(&store, 0));

        assert!(!canvas.pixels().contains(&packed(PLACEHOLDER)));
        assert!(!canvas.pixels().contains(&packed(FAILED)));
        // where the first cell would sit, outside the message bar
        assert_eq!(pixel(&canvas, 95, 80), packed(PAGE_BG));
        assert_eq!(pixel(&canvas, 0, 0), packed(HEADER_BG));
    }

    #[test]
    fn empty_catalog_without_font_shows_a_marker() {
        let store = ImageStore::default();
        let renderer = Renderer::new(None, "Gallery".into());
        let mut canvas = Canvas::new(WIDTH, HEIGHT);
        renderer.draw(&mut canvas, &scene(&store, 0));
        assert_eq!(pixel(&canvas, WIDTH / 2, HEIGHT / 2), packed(MUTED_TEXT));

        let mut silent = scene(&store, 0);
        silent.empty_message = None;
        let mut canvas = Canvas::new(WIDTH, HEIGHT);
        renderer.draw(&mut canvas, &silent);
        assert_eq!(pixel(&canvas, WIDTH / 2, HEIGHT / 2), packed(PAGE_BG));
    }

    #[test]
    fn populated_grid_paints_placeholders_until_thumbnails_arrive() {
        let store = ImageStore::default();
        let renderer = Renderer::new(None, "Gallery".into());
        let mut canvas = Canvas::new(WIDTH, HEIGHT);
        let view = scene(&store, 2);
        renderer.draw(&mut canvas, &view);

        let first = view.grid.cell_rect(0, 0.0);
        assert_eq!(
            pixel(&canvas, first.center_x() as u32, first.center_y() as u32),
            packed(PLACEHOLDER)
        );
        assert_ne!(pixel(&canvas, WIDTH / 2, HEIGHT / 2), packed(MUTED_TEXT));
    }
}
