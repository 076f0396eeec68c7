//! Raster [`Canvas`] backed by a tiny-skia pixmap.
//!
//! Geometry is transformed to device pixels in `f64` before it reaches
//! tiny-skia. Map pixel coordinates at high zoom exceed what `f32` can hold
//! to sub-pixel precision, so the backend only ever sees small numbers.

use crate::{
    core::{geo::Point, matrix::Matrix},
    rendering::{
        canvas::Canvas,
        style::{Color, DrawState, LineCap, LineJoin, Style, TextAlign, TextDecoration, TextStyle},
    },
    MapError, Result,
};
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache};
use image::{imageops, RgbaImage};
use std::path::Path;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

pub struct PixmapCanvas {
    pixmap: Pixmap,
    transform: Matrix,
    state: DrawState,
    stack: Vec<(Matrix, DrawState)>,
    /// Loaded on the first text draw; font discovery is slow
    fonts: Option<(FontSystem, SwashCache)>,
}

impl PixmapCanvas {
    /// A transparent canvas
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            MapError::Render(format!("cannot allocate a {width}x{height} canvas"))
        })?;
        Ok(Self {
            pixmap,
            transform: Matrix::identity(),
            state: DrawState::default(),
            stack: Vec::new(),
            fonts: None,
        })
    }

    /// A canvas filled with `background`
    pub fn with_background(width: u32, height: u32, background: Color) -> Result<Self> {
        let mut canvas = Self::new(width, height)?;
        canvas.pixmap.fill(skia_color(background));
        Ok(canvas)
    }

    /// Color of a device pixel, `None` outside the canvas
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.pixmap.width() || y >= self.pixmap.height() {
            return None;
        }
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
        }
        image
    }

    /// PNG encoded image
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.to_rgba_image().write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )?;
        Ok(bytes)
    }

    /// Writes the image; the format follows the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_rgba_image().save(path)?;
        Ok(())
    }

    fn fill_paint(&self) -> Option<Paint<'static>> {
        paint_for(self.state.fill_color)
    }

    fn stroke(&self) -> Option<(Paint<'static>, Stroke)> {
        let width = self.state.stroke_width * self.transform.uniform_scale();
        if width <= 0.0 {
            return None;
        }
        let paint = paint_for(self.state.stroke_color)?;
        let stroke = Stroke {
            width: width as f32,
            miter_limit: self.state.miter_limit as f32,
            line_cap: match self.state.line_cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match self.state.line_join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            dash: None,
        };
        Some((paint, stroke))
    }

    fn device(&self, p: Point) -> (f32, f32) {
        let d = self.transform.transform(p);
        (d.x as f32, d.y as f32)
    }

    fn fill_and_stroke(&mut self, path: &tiny_skia::Path, rule: FillRule) {
        if let Some(paint) = self.fill_paint() {
            self.pixmap
                .fill_path(path, &paint, rule, Transform::identity(), None);
        }
        if let Some((paint, stroke)) = self.stroke() {
            self.pixmap
                .stroke_path(path, &paint, &stroke, Transform::identity(), None);
        }
    }

    /// Rasterizes `text` into its own pixmap, unrotated, with the first
    /// baseline at `baseline` pixels from the top.
    fn rasterize_text(&mut self, text: &str, style: &TextStyle) -> Option<(Pixmap, f32)> {
        let (font_system, swash_cache) = self
            .fonts
            .get_or_insert_with(|| (FontSystem::new(), SwashCache::new()));

        let size = style.size.max(1.0) as f32;
        let line_height = style.line_height().max(1.0) as f32;
        let mut buffer = Buffer::new(font_system, Metrics::new(size, line_height));
        let family = style
            .font
            .as_deref()
            .map(Family::Name)
            .unwrap_or(Family::SansSerif);
        buffer.set_text(font_system, text, &Attrs::new().family(family), Shaping::Advanced, None);
        buffer.shape_until_scroll(font_system, false);

        let kerning = style.kerning as f32;
        let word_spacing = style.word_spacing as f32;

        // Glyph placements with letter and word spacing folded in
        let mut glyphs = Vec::new();
        let mut lines = Vec::new();
        for run in buffer.layout_runs() {
            let mut extra = 0.0_f32;
            let mut line_w = 0.0_f32;
            for (i, glyph) in run.glyphs.iter().enumerate() {
                if i > 0 {
                    extra += kerning;
                }
                glyphs.push((glyph.physical((extra, run.line_y), 1.0), glyph.color_opt));
                line_w = line_w.max(glyph.x + glyph.w + extra);
                if run.text.get(glyph.start..glyph.end) == Some(" ") {
                    extra += word_spacing;
                }
            }
            lines.push((run.line_top, run.line_y, line_w));
        }

        let first_baseline = lines.first().map(|l| l.1).unwrap_or(size);
        let width = lines.iter().map(|l| l.2).fold(0.0_f32, f32::max).ceil() as u32 + 2;
        let height = (lines.len().max(1) as f32 * line_height).ceil() as u32 + 2;
        let mut target = Pixmap::new(width, height)?;

        if let Some(under) = style.under_color {
            target.fill(skia_color(under));
        }

        let base = cosmic_text::Color::rgba(style.color.r, style.color.g, style.color.b, style.color.a);
        let mut paint = Paint::default();
        for (physical, color) in glyphs {
            swash_cache.with_pixels(
                font_system,
                physical.cache_key,
                color.unwrap_or(base),
                |x, y, c| {
                    if c.a() == 0 {
                        return;
                    }
                    if let Some(rect) = Rect::from_xywh(
                        (physical.x + x) as f32,
                        (physical.y + y) as f32,
                        1.0,
                        1.0,
                    ) {
                        paint.set_color_rgba8(c.r(), c.g(), c.b(), c.a());
                        target.fill_rect(rect, &paint, Transform::identity(), None);
                    }
                },
            );
        }

        if style.decoration != TextDecoration::None {
            if let Some(paint) = paint_for(style.color) {
                let thickness = (size / 15.0).max(1.0);
                for (line_top, line_y, line_w) in &lines {
                    let y = match style.decoration {
                        TextDecoration::Underline => line_y + size * 0.1,
                        TextDecoration::Overline => *line_top,
                        _ => line_y - size * 0.3,
                    };
                    if let Some(rect) = Rect::from_xywh(0.0, y, line_w.max(1.0), thickness) {
                        target.fill_rect(rect, &paint, Transform::identity(), None);
                    }
                }
            }
        }

        Some((target, first_baseline))
    }
}

impl Canvas for PixmapCanvas {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn save(&mut self) {
        self.stack.push((self.transform, self.state));
    }

    fn restore(&mut self) {
        if let Some((transform, state)) = self.stack.pop() {
            self.transform = transform;
            self.state = state;
        }
    }

    fn concat_transform(&mut self, matrix: &Matrix) {
        self.transform = Matrix::mul(&self.transform, matrix);
    }

    fn apply_style(&mut self, style: &Style) {
        self.state.apply(style);
    }

    fn draw_circle(&mut self, center: Point, radius: f64) {
        let (x, y) = self.device(center);
        let r = (radius * self.transform.uniform_scale()) as f32;
        if let Some(path) = PathBuilder::from_circle(x, y, r) {
            self.fill_and_stroke(&path, FillRule::Winding);
        }
    }

    fn draw_polyline(&mut self, points: &[Point]) {
        let mut pb = PathBuilder::new();
        for (i, p) in points.iter().enumerate() {
            let (x, y) = self.device(*p);
            if i == 0 {
                pb.move_to(x, y);
            } else {
                pb.line_to(x, y);
            }
        }
        if let (Some(path), Some((paint, stroke))) = (pb.finish(), self.stroke()) {
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    fn draw_polygon(&mut self, rings: &[Vec<Point>]) {
        let mut pb = PathBuilder::new();
        for ring in rings.iter().filter(|r| r.len() >= 2) {
            for (i, p) in ring.iter().enumerate() {
                let (x, y) = self.device(*p);
                if i == 0 {
                    pb.move_to(x, y);
                } else {
                    pb.line_to(x, y);
                }
            }
            pb.close();
        }
        if let Some(path) = pb.finish() {
            self.fill_and_stroke(&path, FillRule::EvenOdd);
        }
    }

    fn draw_text(&mut self, position: Point, text: &str, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        let Some((rendered, baseline)) = self.rasterize_text(text, style) else {
            return;
        };
        let dx = match style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => -(rendered.width() as f64) / 2.0,
            TextAlign::Right => -(rendered.width() as f64),
        };
        // screen y grows downwards, so a counter-clockwise angle is a negative rotation
        let placement = Matrix::mul(
            &Matrix::mul(&self.transform, &Matrix::translation(position.x, position.y)),
            &Matrix::mul(
                &Matrix::rotate(-style.angle.to_radians()),
                &Matrix::translation(dx, -(baseline as f64)),
            ),
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, rendered.as_ref(), &paint, skia_transform(&placement), None);
    }

    fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        // only the part that lands on the canvas is converted and composited
        let (left, top) = (x.max(0), y.max(0));
        let (skip_x, skip_y) = (left - x, top - y);
        let width = (image.width() as i64 - skip_x).min(self.pixmap.width() as i64 - left);
        let height = (image.height() as i64 - skip_y).min(self.pixmap.height() as i64 - top);
        if width <= 0 || height <= 0 {
            return;
        }
        let visible = imageops::crop_imm(
            image,
            skip_x as u32,
            skip_y as u32,
            width as u32,
            height as u32,
        )
        .to_image();
        let Some(source) = to_pixmap(&visible) else {
            return;
        };
        self.pixmap.draw_pixmap(
            left as i32,
            top as i32,
            source.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn paint_for(color: Color) -> Option<Paint<'static>> {
    if color.is_transparent() {
        return None;
    }
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    Some(paint)
}

fn skia_transform(m: &Matrix) -> Transform {
    Transform::from_row(
        m.a as f32, m.d as f32, m.b as f32, m.e as f32, m.c as f32, m.f as f32,
    )
}

fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_fill() {
        let canvas = PixmapCanvas::with_background(4, 3, Color::parse("#7f7f7f").unwrap()).unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(Color::rgb(127, 127, 127)));
        assert_eq!(canvas.pixel(3, 2), Some(Color::rgb(127, 127, 127)));
        assert_eq!(canvas.pixel(4, 0), None);
        assert_eq!(canvas.pixel(0, 3), None);
    }

    #[test]
    fn test_zero_size_canvas_is_an_error() {
        assert!(PixmapCanvas::new(0, 10).is_err());
    }

    #[test]
    fn test_polygon_hole_uses_even_odd() {
        let mut canvas = PixmapCanvas::with_background(40, 40, Color::WHITE).unwrap();
        canvas.apply_style(
            &Style::new()
                .fill_color(Color::rgb(255, 0, 0))
                .stroke_width(0.0),
        );
        let square = |lo: f64, hi: f64| {
            vec![
                Point::new(lo, lo),
                Point::new(hi, lo),
                Point::new(hi, hi),
                Point::new(lo, hi),
            ]
        };
        canvas.draw_polygon(&[square(0.0, 40.0), square(10.0, 30.0)]);

        assert_eq!(canvas.pixel(5, 5), Some(Color::rgb(255, 0, 0)));
        assert_eq!(canvas.pixel(20, 20), Some(Color::WHITE));
    }

    #[test]
    fn test_transform_is_applied_in_double_precision() {
        let mut canvas = PixmapCanvas::with_background(20, 20, Color::WHITE).unwrap();
        canvas.apply_style(&Style::new().fill_color(Color::BLACK).stroke_width(0.0));
        canvas.concat_transform(&Matrix::translation(-67_108_864.0, -67_108_864.0));
        canvas.draw_circle(Point::new(67_108_874.0, 67_108_874.0), 4.0);

        assert_eq!(canvas.pixel(10, 10), Some(Color::BLACK));
        assert_eq!(canvas.pixel(1, 1), Some(Color::WHITE));
    }

    #[test]
    fn test_draw_image_composites_at_offset() {
        let mut canvas = PixmapCanvas::with_background(8, 8, Color::WHITE).unwrap();
        let tile = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
        canvas.draw_image(&tile, -2, 6);

        assert_eq!(canvas.pixel(0, 7), Some(Color::rgb(0, 0, 255)));
        assert_eq!(canvas.pixel(2, 7), Some(Color::WHITE));
        assert_eq!(canvas.pixel(0, 5), Some(Color::WHITE));
    }

    fn blue_pixels(canvas: &PixmapCanvas) -> usize {
        canvas
            .to_rgba_image()
            .pixels()
            .filter(|p| p.0 == [0, 0, 255, 255])
            .count()
    }

    #[test]
    fn test_draw_image_clips_at_negative_offsets() {
        let tile = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
        for ((x, y), expected) in [((-2, -2), 4), ((-1, 0), 12), ((0, 0), 16), ((2, 2), 16), ((6, 6), 4)] {
            let mut canvas = PixmapCanvas::with_background(8, 8, Color::WHITE).unwrap();
            canvas.draw_image(&tile, x, y);
            assert_eq!(blue_pixels(&canvas), expected, "offset ({x}, {y})");
        }

        let mut canvas = PixmapCanvas::with_background(8, 8, Color::WHITE).unwrap();
        canvas.draw_image(&tile, -2, -2);
        assert_eq!(canvas.pixel(1, 1), Some(Color::rgb(0, 0, 255)));
        assert_eq!(canvas.pixel(2, 2), Some(Color::WHITE));
    }

    #[test]
    fn test_draw_image_fully_outside_is_a_no_op() {
        let tile = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
        let mut canvas = PixmapCanvas::with_background(8, 8, Color::WHITE).unwrap();
        canvas.draw_image(&tile, -4, 0);
        canvas.draw_image(&tile, 8, 0);
        canvas.draw_image(&tile, i64::MIN / 2, i64::MAX / 2);
        assert_eq!(blue_pixels(&canvas), 0);
    }

    #[test]
    fn test_round_trip_through_rgba_image() {
        let mut canvas = PixmapCanvas::with_background(6, 6, Color::WHITE).unwrap();
        canvas.apply_style(&Style::new().stroke_color(Color::BLACK).stroke_width(2.0));
        canvas.draw_polyline(&[Point::new(0.0, 3.0), Point::new(6.0, 3.0)]);

        let image = canvas.to_rgba_image();
        assert_eq!(image.get_pixel(3, 2).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(3, 0).0, [255, 255, 255, 255]);
    }
}
