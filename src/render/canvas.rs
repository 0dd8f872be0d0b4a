#![allow(clippy::too_many_arguments)]

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};

use super::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub fn from_rgb(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_rgba(hex: u32, alpha: f32) -> Self {
        let mut value = Self::from_rgb(hex);
        value.a = alpha.clamp(0.0, 1.0);
        value
    }

    fn rgb(self) -> (f32, f32, f32) {
        (self.r, self.g, self.b)
    }
}

/// Borrowed RGBA8 pixels.
#[derive(Debug, Clone, Copy)]
pub struct RgbaView<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

/// CPU framebuffer in softbuffer's `0RGB` layout.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn clear(&mut self, color: Color) {
        let packed = pack_color(color.rgb());
        self.pixels.fill(packed);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let x0 = rect.x.max(0.0).floor() as i32;
        let y0 = rect.y.max(0.0).floor() as i32;
        let x1 = rect.right().min(self.width as f32).ceil() as i32;
        let y1 = rect.bottom().min(self.height as f32).ceil() as i32;
        for y in y0.max(0)..y1.min(self.height as i32) {
            for x in x0.max(0)..x1.min(self.width as i32) {
                self.blend_pixel(x, y, color, color.a);
            }
        }
    }

    /// Scale `image` into `dst` (nearest neighbour), clipped to the canvas.
    pub fn draw_image(&mut self, image: RgbaView<'_>, dst: Rect, alpha: f32) {
        if image.width == 0 || image.height == 0 || dst.w <= 0.0 || dst.h <= 0.0 || alpha <= 0.0
        {
            return;
        }
        let x0 = dst.x.max(0.0).floor() as i32;
        let y0 = dst.y.max(0.0).floor() as i32;
        let x1 = dst.right().min(self.width as f32).ceil() as i32;
        let y1 = dst.bottom().min(self.height as f32).ceil() as i32;
        let sx = image.width as f32 / dst.w;
        let sy = image.height as f32 / dst.h;
        for y in y0.max(0)..y1.min(self.height as i32) {
            let src_y = (((y as f32 + 0.5 - dst.y) * sy) as i64).clamp(0, image.height as i64 - 1);
            for x in x0.max(0)..x1.min(self.width as i32) {
                let src_x =
                    (((x as f32 + 0.5 - dst.x) * sx) as i64).clamp(0, image.width as i64 - 1);
                let idx = ((src_y as usize) * image.width as usize + src_x as usize) * 4;
                let Some(px) = image.pixels.get(idx..idx + 4) else {
                    continue;
                };
                let color = Color {
                    r: px[0] as f32 / 255.0,
                    g: px[1] as f32 / 255.0,
                    b: px[2] as f32 / 255.0,
                    a: 1.0,
                };
                let coverage = alpha * (px[3] as f32 / 255.0);
                self.blend_pixel(x, y, color, coverage);
            }
        }
    }

    pub fn draw_text(
        &mut self,
        font: &FontArc,
        text: &str,
        color: Color,
        left: f32,
        baseline: f32,
        scale: PxScale,
    ) {
        let scaled = font.as_scaled(scale);
        let mut cursor_x = left;
        let mut previous = None;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let glyph = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                cursor_x += scaled.kern(prev, glyph);
            }
            let advance = scaled.h_advance(glyph);
            let mut positioned = scaled.scaled_glyph(ch);
            positioned.position = point(cursor_x, baseline);
            if let Some(outline) = font.outline_glyph(positioned) {
                let bounds = outline.px_bounds();
                outline.draw(|x, y, coverage| {
                    let px = (bounds.min.x + x as f32).floor() as i32;
                    let py = (bounds.min.y + y as f32).floor() as i32;
                    self.blend_pixel(px, py, color, coverage * color.a);
                });
            }
            cursor_x += advance;
            previous = Some(glyph);
        }
    }

    /// Draw `text` horizontally centered on `center_x`.
    pub fn draw_text_centered(
        &mut self,
        font: &FontArc,
        text: &str,
        color: Color,
        center_x: f32,
        baseline: f32,
        scale: PxScale,
    ) {
        let width = measure_text(text, font, scale);
        self.draw_text(font, text, color, center_x - width / 2.0, baseline, scale);
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if coverage <= 0.0 || x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32
        {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        let src_a = coverage.clamp(0.0, 1.0);
        let dst = unpack_color(self.pixels[idx]);
        self.pixels[idx] = pack_color(blend(color.rgb(), dst, src_a));
    }
}

pub fn measure_text(text: &str, font: &FontArc, scale: PxScale) -> f32 {
    let scaled_font = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        if ch == '\n' {
            continue;
        }
        let glyph_id = scaled_font.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled_font.kern(prev, glyph_id);
        }
        width += scaled_font.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
    width.max(0.0)
}

fn blend(src: (f32, f32, f32), dst: (f32, f32, f32), alpha: f32) -> (f32, f32, f32) {
    (
        src.0 * alpha + dst.0 * (1.0 - alpha),
        src.1 * alpha + dst.1 * (1.0 - alpha),
        src.2 * alpha + dst.2 * (1.0 - alpha),
    )
}

fn unpack_color(value: u32) -> (f32, f32, f32) {
    let r = ((value >> 16) & 0xFF) as f32 / 255.0;
    let g = ((value >> 8) & 0xFF) as f32 / 255.0;
    let b = (value & 0xFF) as f32 / 255.0;
    (r, g, b)
}

fn pack_color(color: (f32, f32, f32)) -> u32 {
    let r = (color.0.clamp(0.0, 1.0) * 255.0).round() as u32;
    let g = (color.1.clamp(0.0, 1.0) * 255.0).round() as u32;
    let b = (color.2.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_is_clipped() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(Rect::new(-2.0, -2.0, 4.0, 4.0), Color::from_rgb(0xFF0000));
        assert_eq!(canvas.pixels()[0], 0xFFFF_0000);
        assert_eq!(canvas.pixels()[1], 0xFFFF_0000);
        assert_eq!(canvas.pixels()[2], 0);
        assert_eq!(canvas.pixels()[4 * 2], 0);
    }

    #[test]
    fn draw_image_scales_nearest() {
        let mut canvas = Canvas::new(4, 2);
        // 2x1 image: red, blue
        let pixels = [255, 0, 0, 255, 0, 0, 255, 255];
        let view = RgbaView {
            width: 2,
            height: 1,
            pixels: &pixels,
        };
        canvas.draw_image(view, Rect::new(0.0, 0.0, 4.0, 2.0), 1.0);
        assert_eq!(canvas.pixels()[0], 0xFFFF_0000);
        assert_eq!(canvas.pixels()[3], 0xFF00_00FF);
        assert_eq!(canvas.pixels()[4], 0xFFFF_0000);
    }
}
