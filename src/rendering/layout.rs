//! Caption layout: box geometry, line breaking, and glyph placement.

use super::computed::ComputedText;
use super::fonts::{FontBook, FontFace};
use crate::preview::{PreviewSurface, TextAlign};
use std::collections::HashMap;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxModel {
    pub padding: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    /// The preview surface box.
    pub fn for_surface(surface: &PreviewSurface) -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, surface.width, surface.height),
            box_model: BoxModel { padding: surface.padding },
        }
    }

    pub fn content_rect(&self) -> Rect {
        let p = self.box_model.padding;
        Rect::new(
            self.rect.x + p,
            self.rect.y + p,
            (self.rect.width - 2.0 * p).max(0.0),
            (self.rect.height - 2.0 * p).max(0.0),
        )
    }
}

/// One glyph at its baseline origin, in CSS px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    /// Index into `TextLayout::faces`
    pub face: usize,
    pub glyph_id: u16,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
    pub glyphs: Vec<PositionedGlyph>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub faces: Vec<FontFace>,
    pub font_size: f32,
    pub line_height: f32,
    pub lines: Vec<LineLayout>,
    /// Distance of the underline below the baseline
    pub underline_offset: f32,
    pub underline_thickness: f32,
}

impl TextLayout {
    fn empty(font_size: f32) -> Self {
        Self {
            faces: Vec::new(),
            font_size,
            line_height: font_size * LINE_HEIGHT,
            lines: Vec::new(),
            underline_offset: 0.0,
            underline_thickness: 0.0,
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.lines.iter().map(|l| l.glyphs.len()).sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct Shaped {
    face: usize,
    glyph_id: u16,
    advance: f32,
}

/// Per-layout glyph lookup with font fallback.
struct Shaper<'a> {
    book: &'a FontBook,
    size: f32,
    bold: bool,
    italic: bool,
    faces: Vec<FontFace>,
    cache: HashMap<char, Shaped>,
}

impl<'a> Shaper<'a> {
    fn face_slot(&mut self, face: FontFace) -> usize {
        match self.faces.iter().position(|f| *f == face) {
            Some(i) => i,
            None => {
                self.faces.push(face);
                self.faces.len() - 1
            }
        }
    }

    fn lookup(&self, slot: usize, c: char) -> Option<Shaped> {
        let face = self.faces[slot].face()?;
        let gid = face.glyph_index(c)?;
        let scale = self.size / f32::from(face.units_per_em());
        let advance = f32::from(face.glyph_hor_advance(gid).unwrap_or(0)) * scale;
        Some(Shaped {
            face: slot,
            glyph_id: gid.0,
            advance,
        })
    }

    fn shape(&mut self, c: char) -> Shaped {
        if let Some(hit) = self.cache.get(&c) {
            return *hit;
        }
        let shaped = self
            .lookup(0, c)
            .or_else(|| {
                let face = self.book.fallback_for(c, self.bold, self.italic)?;
                let slot = self.face_slot(face);
                self.lookup(slot, c)
            })
            // .notdef from the primary face
            .unwrap_or(Shaped {
                face: 0,
                glyph_id: 0,
                advance: self.size * 0.5,
            });
        self.cache.insert(c, shaped);
        shaped
    }

    fn word(&mut self, word: &str) -> (Vec<Shaped>, f32) {
        let glyphs: Vec<Shaped> = word.chars().map(|c| self.shape(c)).collect();
        let width = glyphs.iter().map(|g| g.advance).sum();
        (glyphs, width)
    }
}

struct Line {
    words: Vec<(Vec<Shaped>, f32)>,
    /// Last line of its paragraph
    last: bool,
}

impl Line {
    fn width(&self, space: f32) -> f32 {
        let words: f32 = self.words.iter().map(|(_, w)| w).sum();
        words + space * self.words.len().saturating_sub(1) as f32
    }
}

/// Split a word that is wider than the line into line-sized pieces.
fn break_word(glyphs: Vec<Shaped>, max_width: f32) -> Vec<(Vec<Shaped>, f32)> {
    let mut out = Vec::new();
    let mut cur = Vec::new();
    let mut width = 0.0;
    for g in glyphs {
        if !cur.is_empty() && width + g.advance > max_width {
            out.push((std::mem::take(&mut cur), width));
            width = 0.0;
        }
        width += g.advance;
        cur.push(g);
    }
    if !cur.is_empty() {
        out.push((cur, width));
    }
    out
}

/// Greedy wrap of one paragraph. Whitespace runs collapse to one space.
fn wrap_paragraph(shaper: &mut Shaper<'_>, text: &str, max_width: f32, space: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut cur: Vec<(Vec<Shaped>, f32)> = Vec::new();
    let mut cur_width = 0.0;

    for word in text.split_whitespace() {
        let (glyphs, width) = shaper.word(word);
        let pieces = if width > max_width {
            break_word(glyphs, max_width)
        } else {
            vec![(glyphs, width)]
        };
        for (glyphs, width) in pieces {
            let needed = if cur.is_empty() { width } else { cur_width + space + width };
            if !cur.is_empty() && needed > max_width {
                lines.push(Line { words: std::mem::take(&mut cur), last: false });
                cur_width = width;
            } else {
                cur_width = needed;
            }
            cur.push((glyphs, width));
        }
    }
    lines.push(Line { words: cur, last: true });
    lines
}

/// Lay out `text` inside the surface content box.
///
/// Explicit newlines start a new paragraph. Returns an empty layout when no
/// font is available.
pub fn layout_text(
    text: &str,
    style: &ComputedText,
    book: &FontBook,
    surface: &PreviewSurface,
) -> TextLayout {
    let Some(primary) = book.resolve(&style.families, style.bold, style.italic) else {
        log::warn!("No font available, skipping text");
        return TextLayout::empty(style.size);
    };
    let Some(metrics) = primary.face().map(|f| {
        let scale = style.size / f32::from(f.units_per_em());
        let ascent = f32::from(f.ascender()) * scale;
        let descent = f32::from(f.descender()) * scale;
        let underline = f.underline_metrics().map(|m| {
            (-f32::from(m.position) * scale, f32::from(m.thickness) * scale)
        });
        (ascent, descent, underline)
    }) else {
        log::warn!("Font face could not be parsed, skipping text");
        return TextLayout::empty(style.size);
    };
    let (ascent, descent, underline) = metrics;

    let content = LayoutBox::for_surface(surface).content_rect();
    let mut shaper = Shaper {
        book,
        size: style.size,
        bold: style.bold,
        italic: style.italic,
        faces: vec![primary],
        cache: HashMap::new(),
    };
    let space = shaper.shape(' ').advance;

    let lines: Vec<Line> = text
        .split('\n')
        .flat_map(|p| wrap_paragraph(&mut shaper, p, content.width, space))
        .collect();

    let line_height = style.size * LINE_HEIGHT;
    let block_height = line_height * lines.len() as f32;
    let top = content.y + (content.height - block_height) / 2.0;
    let half_leading = (line_height - (ascent - descent)) / 2.0;

    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let natural = line.width(space);
        let gaps = line.words.len().saturating_sub(1);
        let justify = style.align == TextAlign::Justify && !line.last && gaps > 0;
        let (x, gap) = match style.align {
            _ if justify => (content.x, space + (content.width - natural) / gaps as f32),
            TextAlign::Center => (content.x + (content.width - natural) / 2.0, space),
            TextAlign::Right => (content.x + content.width - natural, space),
            TextAlign::Left | TextAlign::Justify => (content.x, space),
        };
        let baseline = top + line_height * i as f32 + half_leading + ascent;

        let mut glyphs = Vec::new();
        let mut pen = x;
        for (w, (word, _)) in line.words.iter().enumerate() {
            if w > 0 {
                pen += gap;
            }
            for g in word {
                glyphs.push(PositionedGlyph {
                    face: g.face,
                    glyph_id: g.glyph_id,
                    x: pen,
                    y: baseline,
                });
                pen += g.advance;
            }
        }
        out.push(LineLayout {
            x,
            baseline,
            width: pen - x,
            glyphs,
        });
    }

    let (underline_offset, underline_thickness) =
        underline.unwrap_or((style.size * 0.1, (style.size / 14.0).max(1.0)));

    TextLayout {
        faces: shaper.faces,
        font_size: style.size,
        line_height,
        lines: out,
        underline_offset,
        underline_thickness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::computed::compute_text;
    use crate::style::StyleMap;

    fn surface(text: &str, align: &str) -> PreviewSurface {
        let mut style = StyleMap::new();
        style.set("font-family", "sans-serif");
        style.set("font-size", "24px");
        style.set("text-align", align);
        PreviewSurface {
            width: 360.0,
            height: 640.0,
            padding: 24.0,
            text: text.to_string(),
            text_style: style,
            surface_style: StyleMap::new(),
        }
    }

    fn system_book() -> Option<FontBook> {
        let book = FontBook::system(&[]).unwrap();
        if book.is_empty() {
            None
        } else {
            Some(book)
        }
    }

    #[test]
    fn content_rect_subtracts_padding() {
        let s = surface("x", "left");
        let r = LayoutBox::for_surface(&s).content_rect();
        assert_eq!(r, Rect::new(24.0, 24.0, 312.0, 592.0));
    }

    #[test]
    fn no_fonts_means_no_lines() {
        let s = surface("hello", "center");
        let layout = layout_text(&s.text, &compute_text(&s.text_style), &FontBook::empty(), &s);
        assert!(layout.lines.is_empty());
        assert_eq!(layout.glyph_count(), 0);
    }

    #[test]
    fn breaking_long_words() {
        let g = Shaped { face: 0, glyph_id: 1, advance: 10.0 };
        let pieces = break_word(vec![g; 7], 25.0);
        let lens: Vec<usize> = pieces.iter().map(|(p, _)| p.len()).collect();
        assert_eq!(lens, vec![2, 2, 2, 1]);
    }

    #[test]
    fn newlines_and_wrapping() {
        let Some(book) = system_book() else { return };
        let s = surface("one\ntwo", "left");
        let layout = layout_text(&s.text, &compute_text(&s.text_style), &book, &s);
        assert_eq!(layout.lines.len(), 2);
        assert!(layout.lines[1].baseline > layout.lines[0].baseline);
        assert!((layout.line_height - 24.0 * LINE_HEIGHT).abs() < 1e-4);

        let long = "word ".repeat(60);
        let s = surface(&long, "left");
        let layout = layout_text(&s.text, &compute_text(&s.text_style), &book, &s);
        assert!(layout.lines.len() > 1);
        for line in &layout.lines {
            assert!(line.width <= 312.0 + 0.01);
        }
    }

    #[test]
    fn alignment_moves_lines() {
        let Some(book) = system_book() else { return };
        let mut xs = Vec::new();
        for align in ["left", "center", "right"] {
            let s = surface("Hi", align);
            let layout = layout_text(&s.text, &compute_text(&s.text_style), &book, &s);
            xs.push(layout.lines[0].x);
        }
        assert!(xs[0] < xs[1] && xs[1] < xs[2]);
        assert_eq!(xs[0], 24.0);
    }

    #[test]
    fn justify_fills_all_but_last_line() {
        let Some(book) = system_book() else { return };
        let text = "lorem ipsum dolor sit amet ".repeat(8);
        let s = surface(&text, "justify");
        let layout = layout_text(&s.text, &compute_text(&s.text_style), &book, &s);
        assert!(layout.lines.len() > 2);
        let (last, rest) = layout.lines.split_last().unwrap();
        for line in rest {
            assert!((line.width - 312.0).abs() < 0.5, "width {}", line.width);
        }
        assert!(last.width <= 312.0 + 0.01);
    }
}
