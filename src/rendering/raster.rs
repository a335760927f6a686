//! Execute a display list with tiny-skia and encode the result as PNG.

use super::computed::{BackgroundSize, ImageLayer, TextShadow};
use super::fonts::FontBook;
use super::layout::Rect;
use super::paint::{build_display_list, GlyphRun, PaintCommand};
use super::Screenshot;
use crate::preview::PreviewSurface;
use crate::style::{Color, LinearGradient};
use crate::upload::decode_data_url;
use crate::{Error, RasterOptions, Rasterizer, Result};
use std::sync::Arc;
use tiny_skia::{
    FillRule, FilterQuality, GradientStop, IntSize, Paint, PathBuilder, Pattern, Pixmap,
    PixmapPaint, Point, SpreadMode, Stroke, Transform,
};

/// Slant of synthesized italics (x shift per unit of height).
const SYNTHETIC_SKEW: f32 = 0.2;
/// Stroke width of synthesized bold, as a fraction of the font size.
const SYNTHETIC_BOLD: f32 = 1.0 / 24.0;

fn skia_color(c: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn solid(c: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;
    paint
}

fn skia_rect(r: &Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(r.x, r.y, r.width, r.height)
}

/// Raster backend over tiny-skia.
#[derive(Debug, Clone)]
pub struct SkiaRasterizer {
    fonts: Arc<FontBook>,
}

impl SkiaRasterizer {
    pub fn new(fonts: Arc<FontBook>) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }
}

impl Rasterizer for SkiaRasterizer {
    fn rasterize(&self, surface: &PreviewSurface, options: &RasterOptions) -> Result<Screenshot> {
        let scale = options.scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::RenderError(format!("invalid scale {}", scale)));
        }
        let width = (surface.width * scale).round() as u32;
        let height = (surface.height * scale).round() as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::RenderError(format!("cannot allocate a {}x{} canvas", width, height))
        })?;
        if !options.transparent_background {
            pixmap.fill(tiny_skia::Color::WHITE);
        }

        let root = Transform::from_scale(scale, scale);
        let list = build_display_list(surface, &self.fonts);
        for command in &list {
            if options.logging {
                log::debug!("paint {}: {:?}", command.name(), command);
            }
            execute(&mut pixmap, command, root, options)?;
        }

        let png_data = pixmap
            .encode_png()
            .map_err(|e| Error::RenderError(format!("PNG encoding failed: {}", e)))?;
        Ok(Screenshot { width, height, png_data })
    }
}

fn execute(
    pixmap: &mut Pixmap,
    command: &PaintCommand,
    root: Transform,
    options: &RasterOptions,
) -> Result<()> {
    match command {
        PaintCommand::SolidRect { rect, color } | PaintCommand::Decoration { rect, color } => {
            if let Some(r) = skia_rect(rect) {
                pixmap.fill_rect(r, &solid(*color), root, None);
            }
        }
        PaintCommand::LinearGradient { rect, gradient } => fill_gradient(pixmap, rect, gradient, root),
        PaintCommand::Image { rect, layer } => fill_image(pixmap, rect, layer, root, options)?,
        PaintCommand::TextShadow { runs, shadow } => draw_shadow(pixmap, runs, shadow, root, options.scale),
        PaintCommand::Glyphs { runs, color } => {
            let paint = solid(*color);
            for run in runs {
                draw_run(pixmap, run, &paint, root);
            }
        }
    }
    Ok(())
}

fn fill_gradient(pixmap: &mut Pixmap, rect: &Rect, gradient: &LinearGradient, root: Transform) {
    let Some(r) = skia_rect(rect) else { return };
    let ((x0, y0), (x1, y1)) = gradient.line(rect.width, rect.height);
    let resolved = gradient.resolved_stops();
    let fallback = resolved.last().map(|(_, c)| *c);
    let stops: Vec<GradientStop> = resolved
        .into_iter()
        .map(|(pos, c)| GradientStop::new(pos, skia_color(c)))
        .collect();
    let shader = tiny_skia::LinearGradient::new(
        Point::from_xy(rect.x + x0, rect.y + y0),
        Point::from_xy(rect.x + x1, rect.y + y1),
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    );
    let paint = match shader {
        Some(shader) => Paint {
            shader,
            anti_alias: true,
            ..Paint::default()
        },
        None => match fallback {
            Some(c) => solid(c),
            None => return,
        },
    };
    pixmap.fill_rect(r, &paint, root, None);
}

/// Load the bytes behind an image source.
fn image_bytes(source: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    if source.starts_with("data:") {
        return Ok(decode_data_url(source)?.1);
    }
    if !options.cross_origin_images {
        return Err(Error::CrossOrigin(format!(
            "refusing to load {} without cross-origin images enabled",
            source
        )));
    }
    let url = url::Url::parse(source)
        .map_err(|e| Error::ImageError(format!("invalid image URL {}: {}", source, e)))?;
    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| Error::ImageError(format!("invalid file URL {}", source)))?;
            Ok(std::fs::read(path)?)
        }
        scheme => Err(Error::ImageError(format!("unsupported image scheme {}", scheme))),
    }
}

/// Decode into a premultiplied pixmap.
fn decode_pixmap(bytes: &[u8]) -> Result<Pixmap> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| Error::ImageError(format!("cannot decode background image: {}", e)))?
        .to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
    let size = IntSize::from_wh(w, h)
        .ok_or_else(|| Error::ImageError(format!("empty background image {}x{}", w, h)))?;
    Pixmap::from_vec(data, size).ok_or_else(|| Error::ImageError("bad image buffer".into()))
}

fn fill_image(
    pixmap: &mut Pixmap,
    rect: &Rect,
    layer: &ImageLayer,
    root: Transform,
    options: &RasterOptions,
) -> Result<()> {
    let image = decode_pixmap(&image_bytes(&layer.source, options)?)?;
    let (iw, ih) = (image.width() as f32, image.height() as f32);
    let s = match layer.size {
        BackgroundSize::Cover => (rect.width / iw).max(rect.height / ih),
        BackgroundSize::Contain => (rect.width / iw).min(rect.height / ih),
        BackgroundSize::Auto => 1.0,
    };
    let (dw, dh) = (iw * s, ih * s);
    let (ox, oy) = match layer.size {
        BackgroundSize::Auto => (rect.x, rect.y),
        _ => (rect.x + (rect.width - dw) / 2.0, rect.y + (rect.height - dh) / 2.0),
    };

    let area = if layer.repeat {
        *rect
    } else {
        // clip the single tile to the box
        let x = ox.max(rect.x);
        let y = oy.max(rect.y);
        let right = (ox + dw).min(rect.x + rect.width);
        let bottom = (oy + dh).min(rect.y + rect.height);
        Rect::new(x, y, right - x, bottom - y)
    };
    let Some(r) = skia_rect(&area) else { return Ok(()) };

    let spread = if layer.repeat { SpreadMode::Repeat } else { SpreadMode::Pad };
    let paint = Paint {
        shader: Pattern::new(
            image.as_ref(),
            spread,
            FilterQuality::Bicubic,
            1.0,
            Transform::from_row(s, 0.0, 0.0, s, ox, oy),
        ),
        anti_alias: true,
        ..Paint::default()
    };
    pixmap.fill_rect(r, &paint, root, None);
    Ok(())
}

struct GlyphPath {
    builder: PathBuilder,
    scale: f32,
    x: f32,
    y: f32,
    skew: f32,
}

impl GlyphPath {
    fn map(&self, px: f32, py: f32) -> (f32, f32) {
        (self.x + (px + self.skew * py) * self.scale, self.y - py * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for GlyphPath {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn draw_run(pixmap: &mut Pixmap, run: &GlyphRun, paint: &Paint<'_>, transform: Transform) {
    let Some(face) = run.face.face() else {
        log::warn!("Skipping glyph run: font face could not be parsed");
        return;
    };
    let scale = run.size / f32::from(face.units_per_em());
    let skew = if run.face.synthetic_italic { SYNTHETIC_SKEW } else { 0.0 };
    let stroke = run.face.synthetic_bold.then(|| Stroke {
        width: run.size * SYNTHETIC_BOLD,
        ..Stroke::default()
    });

    for &(glyph_id, x, y) in &run.glyphs {
        let mut outline = GlyphPath {
            builder: PathBuilder::new(),
            scale,
            x,
            y,
            skew,
        };
        if face.outline_glyph(ttf_parser::GlyphId(glyph_id), &mut outline).is_none() {
            // spaces and bitmap-only glyphs
            continue;
        }
        let Some(path) = outline.builder.finish() else { continue };
        pixmap.fill_path(&path, paint, FillRule::Winding, transform, None);
        if let Some(stroke) = &stroke {
            pixmap.stroke_path(&path, paint, stroke, transform, None);
        }
    }
}

fn draw_shadow(pixmap: &mut Pixmap, runs: &[GlyphRun], shadow: &TextShadow, root: Transform, scale: f32) {
    let Some(mut layer) = Pixmap::new(pixmap.width(), pixmap.height()) else { return };
    let paint = solid(shadow.color);
    let transform = root.pre_translate(shadow.offset_x, shadow.offset_y);
    for run in runs {
        draw_run(&mut layer, run, &paint, transform);
    }
    // CSS blur radius is twice the gaussian sigma
    let sigma = shadow.blur / 2.0 * scale;
    let radius = sigma.round() as usize;
    if radius > 0 {
        let (w, h) = (layer.width() as usize, layer.height() as usize);
        for _ in 0..3 {
            box_blur(layer.data_mut(), w, h, radius);
        }
    }
    pixmap.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
}

/// One horizontal and one vertical box pass over premultiplied RGBA.
fn box_blur(data: &mut [u8], width: usize, height: usize, radius: usize) {
    let window = (2 * radius + 1) as u32;
    let mut line = Vec::with_capacity(width.max(height));

    let mut pass = |len: usize, count: usize, index: &dyn Fn(usize, usize) -> usize| {
        for n in 0..count {
            line.clear();
            line.extend((0..len).map(|i| {
                let o = index(n, i);
                [data[o], data[o + 1], data[o + 2], data[o + 3]]
            }));
            let mut sum = [0u32; 4];
            for px in line.iter().take(radius.min(len)) {
                for c in 0..4 {
                    sum[c] += u32::from(px[c]);
                }
            }
            for i in 0..len {
                if i + radius < len {
                    for c in 0..4 {
                        sum[c] += u32::from(line[i + radius][c]);
                    }
                }
                if i > radius {
                    for c in 0..4 {
                        sum[c] -= u32::from(line[i - radius - 1][c]);
                    }
                }
                let o = index(n, i);
                for c in 0..4 {
                    data[o + c] = (sum[c] / window) as u8;
                }
            }
        }
    };
    pass(width, height, &|row, x| (row * width + x) * 4);
    pass(height, width, &|col, y| (y * width + col) * 4);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::BackgroundMode;
    use crate::preview::{render_text, Controls, TextEffect};

    fn surface(mode: BackgroundMode) -> PreviewSurface {
        let rendered = render_text(&Controls::default(), TextEffect::Shadow);
        PreviewSurface {
            width: 40.0,
            height: 20.0,
            padding: 4.0,
            text: rendered.content,
            text_style: rendered.style,
            surface_style: mode.declarations(),
        }
    }

    fn pixel(shot: &Screenshot, x: u32, y: u32) -> [u8; 4] {
        let img = image::load_from_memory(&shot.png_data).unwrap().to_rgba8();
        img.get_pixel(x, y).0
    }

    fn rasterizer() -> SkiaRasterizer {
        SkiaRasterizer::new(Arc::new(FontBook::empty()))
    }

    #[test]
    fn exposes_its_font_book() {
        let r = rasterizer();
        assert!(r.fonts().is_empty());
        assert!(r.fonts().resolve(&["sans-serif".into()], false, false).is_none());
    }

    #[test]
    fn output_is_scaled_png() {
        let shot = rasterizer()
            .rasterize(&surface(BackgroundMode::default()), &RasterOptions::default())
            .unwrap();
        assert!(shot.is_png());
        assert_eq!((shot.width, shot.height), (80, 40));
    }

    #[test]
    fn color_fill_and_white_base() {
        let opts = RasterOptions { scale: 1.0, ..RasterOptions::default() };
        let shot = rasterizer()
            .rasterize(&surface(BackgroundMode::Color("#ff0000".into())), &opts)
            .unwrap();
        assert_eq!(pixel(&shot, 5, 5), [255, 0, 0, 255]);

        let blank = BackgroundMode::Color("transparent".into());
        let shot = rasterizer().rasterize(&surface(blank.clone()), &opts).unwrap();
        assert_eq!(pixel(&shot, 5, 5)[3], 0);

        let opts = RasterOptions { transparent_background: false, ..opts };
        let shot = rasterizer().rasterize(&surface(blank), &opts).unwrap();
        assert_eq!(pixel(&shot, 5, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn gradient_runs_between_its_stops() {
        let opts = RasterOptions { scale: 1.0, ..RasterOptions::default() };
        let mode = BackgroundMode::Gradient("linear-gradient(to right, #000000, #ffffff)".into());
        let shot = rasterizer().rasterize(&surface(mode), &opts).unwrap();
        let left = pixel(&shot, 1, 10)[0];
        let right = pixel(&shot, 38, 10)[0];
        assert!(left < 20 && right > 235, "left {} right {}", left, right);
    }

    #[test]
    fn data_url_image_covers_the_surface() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let url = crate::upload::encode_data_url(&png);
        let opts = RasterOptions { scale: 1.0, ..RasterOptions::default() };
        let shot = rasterizer().rasterize(&surface(BackgroundMode::Image(url)), &opts).unwrap();
        assert_eq!(pixel(&shot, 0, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&shot, 39, 19), [0, 0, 255, 255]);
    }

    #[test]
    fn undecodable_image_fails() {
        let url = crate::upload::encode_data_url(b"not an image");
        let err = rasterizer()
            .rasterize(&surface(BackgroundMode::Image(url)), &RasterOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::ImageError(_)));
    }

    #[test]
    fn file_sources_need_cross_origin() {
        let mode = BackgroundMode::Image("file:///tmp/nope.png".into());
        let opts = RasterOptions { cross_origin_images: false, ..RasterOptions::default() };
        let err = rasterizer().rasterize(&surface(mode), &opts).unwrap_err();
        assert!(matches!(err, Error::CrossOrigin(_)));
    }

    #[test]
    fn box_blur_spreads_a_dot() {
        let (w, h) = (5, 5);
        let mut data = vec![0u8; w * h * 4];
        let center = (2 * w + 2) * 4;
        data[center..center + 4].copy_from_slice(&[90, 90, 90, 90]);
        box_blur(&mut data, w, h, 1);
        // 90 / 3 / 3
        assert_eq!(data[center + 3], 10);
        assert_eq!(data[((w + 1) * 4) + 3], 10);
        assert_eq!(data[3], 0);
    }
}
