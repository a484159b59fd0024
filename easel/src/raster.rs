//! Software rasterizer over an RGBA pixel buffer.
//!
//! This module is the only place that touches pixels. It receives geometry in
//! canvas coordinates and produces deterministic output: pixel centers are
//! sampled at `(x + 0.5, y + 0.5)` and all blending is plain src-over with
//! f64 math rounded once per pixel, so the same input always yields the same
//! buffer.
//!
//! Strokes with partial opacity are rasterized through a coverage mask and
//! composited once, so overlapping segments of one stroke do not darken at
//! the joints.

#[cfg(test)]
#[path = "raster_test.rs"]
mod tests;

use image::{Rgba, RgbaImage};

use crate::action::Point;
use crate::font;

/// Line cap style for stroked paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cap {
    /// Stroke ends exactly at the endpoint.
    Butt,
    /// Half-disc past the endpoint.
    Round,
    /// Half-width square past the endpoint.
    Square,
}

/// An RGBA8 drawing surface.
pub struct Surface {
    img: RgbaImage,
}

impl Surface {
    /// Create a surface filled with `background`.
    #[must_use]
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self { img: RgbaImage::from_pixel(width.max(1), height.max(1), background) }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.img.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.img.height()
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.img.get_pixel(x, y)
    }

    #[must_use]
    pub fn as_image(&self) -> &RgbaImage {
        &self.img
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.img
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.img.pixels_mut() {
            *px = color;
        }
    }

    /// Encode the surface as a PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut out = Vec::new();
        self.img.write_to(
            &mut std::io::Cursor::new(&mut out),
            image::ImageFormat::Png,
        )?;
        Ok(out)
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>, alpha: f64) {
        if x < 0 || y < 0 || x >= i64::from(self.img.width()) || y >= i64::from(self.img.height()) {
            return;
        }
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let (x, y) = (x as u32, y as u32);
        let ea = alpha.clamp(0.0, 1.0) * (f64::from(color.0[3]) / 255.0);
        if ea <= 0.0 {
            return;
        }
        let dst = self.img.get_pixel_mut(x, y);
        for ch in 0..3 {
            let s = f64::from(color.0[ch]);
            let d = f64::from(dst.0[ch]);
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            {
                dst.0[ch] = (s * ea + d * (1.0 - ea)).round().clamp(0.0, 255.0) as u8;
            }
        }
        dst.0[3] = 255;
    }

    fn blend_span(&mut self, y: i64, x0: f64, x1: f64, color: Rgba<u8>, alpha: f64) {
        for x in span_pixels(x0, x1) {
            self.blend(x, y, color, alpha);
        }
    }

    /// Fill a polygon (even-odd rule).
    pub fn fill_polygon(&mut self, pts: &[Point], color: Rgba<u8>, alpha: f64) {
        let (w, h) = (self.width(), self.height());
        polygon_spans(pts, w, h, |y, x0, x1| self.blend_span(y, x0, x1, color, alpha));
    }

    /// Fill a circle.
    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba<u8>, alpha: f64) {
        let (w, h) = (self.width(), self.height());
        circle_spans(center, radius, w, h, |y, x0, x1| self.blend_span(y, x0, x1, color, alpha));
    }

    /// Fill an axis-aligned rectangle given its top-left corner and size.
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba<u8>, alpha: f64) {
        let pts = [
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ];
        self.fill_polygon(&pts, color, alpha);
    }

    /// Stroke an axis-aligned rectangle outline.
    pub fn stroke_rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        stroke_width: f64,
        color: Rgba<u8>,
        alpha: f64,
    ) {
        let corners = [
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
            Point::new(x, y),
        ];
        self.stroke_path(&corners, stroke_width, Cap::Round, color, alpha);
    }

    /// Stroke a circle outline, approximated by a closed polyline.
    pub fn stroke_circle(
        &mut self,
        center: Point,
        radius: f64,
        stroke_width: f64,
        color: Rgba<u8>,
        alpha: f64,
    ) {
        if radius <= 0.0 {
            return;
        }
        // Segment count grows with circumference so big circles stay smooth.
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let segments = ((radius * std::f64::consts::TAU / 3.0).ceil() as usize).clamp(16, 720);
        let mut pts = Vec::with_capacity(segments + 1);
        for i in 0..=segments {
            #[allow(clippy::cast_precision_loss)]
            let angle = std::f64::consts::TAU * (i as f64) / (segments as f64);
            pts.push(Point::new(
                radius.mul_add(angle.cos(), center.x),
                radius.mul_add(angle.sin(), center.y),
            ));
        }
        self.stroke_path(&pts, stroke_width, Cap::Round, color, alpha);
    }

    /// Stroke a polyline with the given width and cap style. Interior joints
    /// are rounded. The whole path is composited once, so a translucent
    /// stroke has uniform opacity over self-overlaps.
    pub fn stroke_path(
        &mut self,
        pts: &[Point],
        width: f64,
        cap: Cap,
        color: Rgba<u8>,
        alpha: f64,
    ) {
        if pts.is_empty() || width <= 0.0 {
            return;
        }
        let half = width / 2.0;
        let mut mask = Mask::new(self.width(), self.height());

        let first = pts[0];
        let last = pts[pts.len() - 1];

        if pts.len() == 1 || (pts.len() == 2 && first == last) {
            match cap {
                Cap::Round => mask.add_circle(first, half),
                Cap::Square => mask.add_polygon(&[
                    Point::new(first.x - half, first.y - half),
                    Point::new(first.x + half, first.y - half),
                    Point::new(first.x + half, first.y + half),
                    Point::new(first.x - half, first.y + half),
                ]),
                Cap::Butt => {}
            }
            mask.composite(self, color, alpha);
            return;
        }

        for (i, seg) in pts.windows(2).enumerate() {
            let (mut a, mut b) = (seg[0], seg[1]);
            let len = a.distance(b);
            if len == 0.0 {
                continue;
            }
            let dx = (b.x - a.x) / len;
            let dy = (b.y - a.y) / len;
            if cap == Cap::Square {
                if i == 0 {
                    a = Point::new(dx.mul_add(-half, a.x), dy.mul_add(-half, a.y));
                }
                if i == pts.len() - 2 {
                    b = Point::new(dx.mul_add(half, b.x), dy.mul_add(half, b.y));
                }
            }
            let (nx, ny) = (-dy * half, dx * half);
            mask.add_polygon(&[
                Point::new(a.x + nx, a.y + ny),
                Point::new(b.x + nx, b.y + ny),
                Point::new(b.x - nx, b.y - ny),
                Point::new(a.x - nx, a.y - ny),
            ]);
        }

        // Round interior joints.
        for joint in &pts[1..pts.len() - 1] {
            mask.add_circle(*joint, half);
        }
        if cap == Cap::Round {
            mask.add_circle(first, half);
            mask.add_circle(last, half);
        }

        mask.composite(self, color, alpha);
    }

    /// Stroke a single segment.
    pub fn line(&mut self, a: Point, b: Point, width: f64, cap: Cap, color: Rgba<u8>, alpha: f64) {
        self.stroke_path(&[a, b], width, cap, color, alpha);
    }

    /// Render one line of text with the built-in bitmap font. `origin` is the
    /// left end of the baseline; `size` is the glyph height in pixels.
    pub fn text(&mut self, text: &str, origin: Point, size: f64, color: Rgba<u8>, alpha: f64) {
        if size <= 0.0 {
            return;
        }
        let scale = size / f64::from(font::GLYPH_HEIGHT);
        let top = origin.y - size;
        let mut pen_x = origin.x;
        for c in text.chars() {
            let glyph = font::glyph(c);
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..font::GLYPH_WIDTH {
                    if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) != 0 {
                        #[allow(clippy::cast_precision_loss)]
                        let px = scale.mul_add(f64::from(col), pen_x);
                        #[allow(clippy::cast_precision_loss)]
                        let py = scale.mul_add(row as f64, top);
                        self.fill_rect(px, py, scale, scale, color, alpha);
                    }
                }
            }
            pen_x += scale * f64::from(font::GLYPH_ADVANCE);
        }
    }
}

/// One-bit coverage mask, same dimensions as the surface it composites onto.
struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, bits: vec![false; (width as usize) * (height as usize)] }
    }

    fn set(&mut self, x: i64, y: i64) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        #[allow(clippy::cast_sign_loss)]
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.bits[idx] = true;
    }

    fn set_span(&mut self, y: i64, x0: f64, x1: f64) {
        for x in span_pixels(x0, x1) {
            self.set(x, y);
        }
    }

    fn add_polygon(&mut self, pts: &[Point]) {
        let (w, h) = (self.width, self.height);
        polygon_spans(pts, w, h, |y, x0, x1| self.set_span(y, x0, x1));
    }

    fn add_circle(&mut self, center: Point, radius: f64) {
        let (w, h) = (self.width, self.height);
        circle_spans(center, radius, w, h, |y, x0, x1| self.set_span(y, x0, x1));
    }

    fn composite(&self, surface: &mut Surface, color: Rgba<u8>, alpha: f64) {
        for y in 0..i64::from(self.height) {
            for x in 0..i64::from(self.width) {
                #[allow(clippy::cast_sign_loss)]
                let idx = (y as usize) * (self.width as usize) + (x as usize);
                if self.bits[idx] {
                    surface.blend(x, y, color, alpha);
                }
            }
        }
    }
}

/// Pixel x-range whose centers fall in `[x0, x1)`.
fn span_pixels(x0: f64, x1: f64) -> std::ops::Range<i64> {
    #[allow(clippy::cast_possible_truncation)]
    let start = (x0 - 0.5).ceil() as i64;
    #[allow(clippy::cast_possible_truncation)]
    let end = (x1 - 0.5).ceil() as i64;
    start..end
}

/// Scanline decomposition of a polygon (even-odd rule), clipped to a
/// `width`×`height` pixel grid so off-surface geometry costs nothing.
/// Emits horizontal spans as `(pixel_row, x_enter, x_exit)` sampled at row
/// centers.
fn polygon_spans(pts: &[Point], width: u32, height: u32, mut emit: impl FnMut(i64, f64, f64)) {
    if pts.len() < 3 {
        return;
    }
    let min_y = pts.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = pts.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }

    // `as` saturates, so arbitrarily large coordinates clamp cleanly.
    #[allow(clippy::cast_possible_truncation)]
    let row_start = ((min_y - 0.5).floor() as i64).max(0);
    #[allow(clippy::cast_possible_truncation)]
    let row_end = ((max_y - 0.5).ceil() as i64).min(i64::from(height) - 1);

    let mut xs: Vec<f64> = Vec::new();
    for row in row_start..=row_end {
        #[allow(clippy::cast_precision_loss)]
        let sample = row as f64 + 0.5;
        xs.clear();
        for i in 0..pts.len() {
            let p = pts[i];
            let q = pts[(i + 1) % pts.len()];
            if (p.y <= sample && q.y > sample) || (q.y <= sample && p.y > sample) {
                let t = (sample - p.y) / (q.y - p.y);
                xs.push(t.mul_add(q.x - p.x, p.x));
            }
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            let x0 = pair[0].max(0.0);
            let x1 = pair[1].min(f64::from(width));
            if x0 < x1 {
                emit(row, x0, x1);
            }
        }
    }
}

/// Scanline decomposition of a filled circle, clipped the same way as
/// [`polygon_spans`].
fn circle_spans(
    center: Point,
    radius: f64,
    width: u32,
    height: u32,
    mut emit: impl FnMut(i64, f64, f64),
) {
    if radius <= 0.0 || !radius.is_finite() || !center.x.is_finite() || !center.y.is_finite() {
        return;
    }
    #[allow(clippy::cast_possible_truncation)]
    let row_start = ((center.y - radius - 0.5).floor() as i64).max(0);
    #[allow(clippy::cast_possible_truncation)]
    let row_end = ((center.y + radius - 0.5).ceil() as i64).min(i64::from(height) - 1);
    for row in row_start..=row_end {
        #[allow(clippy::cast_precision_loss)]
        let dy = (row as f64 + 0.5) - center.y;
        let under = radius.mul_add(radius, -(dy * dy));
        if under <= 0.0 {
            continue;
        }
        let dx = under.sqrt();
        let x0 = (center.x - dx).max(0.0);
        let x1 = (center.x + dx).min(f64::from(width));
        if x0 < x1 {
            emit(row, x0, x1);
        }
    }
}
