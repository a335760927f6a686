//! Display list for the preview surface.

use super::computed::{compute_background, compute_text, BackgroundLayer, ImageLayer, TextShadow};
use super::fonts::{FontBook, FontFace};
use super::layout::{layout_text, LayoutBox, Rect, TextLayout};
use crate::preview::PreviewSurface;
use crate::style::{Color, LinearGradient};
use std::fmt;

/// Glyphs sharing one face, positioned at their baseline origins (CSS px).
#[derive(Clone, PartialEq)]
pub struct GlyphRun {
    pub face: FontFace,
    pub size: f32,
    pub glyphs: Vec<(u16, f32, f32)>,
}

impl fmt::Debug for GlyphRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphRun")
            .field("face", &self.face.id)
            .field("size", &self.size)
            .field("glyphs", &self.glyphs.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect { rect: Rect, color: Color },
    LinearGradient { rect: Rect, gradient: LinearGradient },
    Image { rect: Rect, layer: ImageLayer },
    TextShadow { runs: Vec<GlyphRun>, shadow: TextShadow },
    Glyphs { runs: Vec<GlyphRun>, color: Color },
    Decoration { rect: Rect, color: Color },
}

impl PaintCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PaintCommand::SolidRect { .. } => "solid-rect",
            PaintCommand::LinearGradient { .. } => "linear-gradient",
            PaintCommand::Image { .. } => "image",
            PaintCommand::TextShadow { .. } => "text-shadow",
            PaintCommand::Glyphs { .. } => "glyphs",
            PaintCommand::Decoration { .. } => "decoration",
        }
    }
}

/// Group consecutive glyphs of the same face into runs.
fn glyph_runs(layout: &TextLayout) -> Vec<GlyphRun> {
    let mut runs: Vec<GlyphRun> = Vec::new();
    let mut current: Option<usize> = None;
    for g in layout.lines.iter().flat_map(|l| l.glyphs.iter()) {
        if current != Some(g.face) {
            runs.push(GlyphRun {
                face: layout.faces[g.face].clone(),
                size: layout.font_size,
                glyphs: Vec::new(),
            });
            current = Some(g.face);
        }
        if let Some(run) = runs.last_mut() {
            run.glyphs.push((g.glyph_id, g.x, g.y));
        }
    }
    runs
}

/// Build the display list: background color, background layer, then text.
pub fn build_display_list(surface: &PreviewSurface, fonts: &FontBook) -> Vec<PaintCommand> {
    let mut list = Vec::new();
    let rect = LayoutBox::for_surface(surface).rect;

    let background = compute_background(&surface.surface_style);
    if !background.color.is_transparent() {
        list.push(PaintCommand::SolidRect { rect, color: background.color });
    }
    match background.layer {
        Some(BackgroundLayer::Gradient(gradient)) => {
            list.push(PaintCommand::LinearGradient { rect, gradient })
        }
        Some(BackgroundLayer::Image(layer)) => list.push(PaintCommand::Image { rect, layer }),
        None => {}
    }

    let text = compute_text(&surface.text_style);
    let layout = layout_text(&surface.text, &text, fonts, surface);
    let runs = glyph_runs(&layout);
    if runs.is_empty() {
        return list;
    }

    if let Some(shadow) = text.shadow.clone() {
        list.push(PaintCommand::TextShadow { runs: runs.clone(), shadow });
    }
    list.push(PaintCommand::Glyphs { runs, color: text.color });

    if text.underline {
        for line in layout.lines.iter().filter(|l| !l.glyphs.is_empty()) {
            list.push(PaintCommand::Decoration {
                rect: Rect::new(
                    line.x,
                    line.baseline + layout.underline_offset - layout.underline_thickness / 2.0,
                    line.width,
                    layout.underline_thickness,
                ),
                color: text.color,
            });
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::BackgroundMode;
    use crate::preview::{render_text, Controls, TextEffect};

    fn surface(effect: TextEffect, mode: BackgroundMode) -> PreviewSurface {
        let rendered = render_text(&Controls::default(), effect);
        PreviewSurface {
            width: 360.0,
            height: 640.0,
            padding: 24.0,
            text: rendered.content,
            text_style: rendered.style,
            surface_style: mode.declarations(),
        }
    }

    fn names(list: &[PaintCommand]) -> Vec<&'static str> {
        list.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn backgrounds_without_fonts() {
        let fonts = FontBook::empty();
        let list = build_display_list(&surface(TextEffect::Normal, BackgroundMode::default()), &fonts);
        assert_eq!(names(&list), vec!["linear-gradient"]);

        let list = build_display_list(
            &surface(TextEffect::Normal, BackgroundMode::Color("#25d366".into())),
            &fonts,
        );
        assert_eq!(names(&list), vec!["solid-rect"]);
        match &list[0] {
            PaintCommand::SolidRect { rect, color } => {
                assert_eq!(*rect, Rect::new(0.0, 0.0, 360.0, 640.0));
                assert_eq!(*color, Color::rgb(0x25, 0xd3, 0x66));
            }
            other => panic!("unexpected {:?}", other),
        }

        let list = build_display_list(
            &surface(TextEffect::Normal, BackgroundMode::Image("data:image/png;base64,AAAA".into())),
            &fonts,
        );
        assert_eq!(names(&list), vec!["image"]);
    }

    #[test]
    fn text_commands_follow_the_effect() {
        let fonts = FontBook::system(&[]).unwrap();
        if fonts.is_empty() {
            return;
        }
        let mode = || BackgroundMode::Color("#000000".into());
        let list = build_display_list(&surface(TextEffect::Normal, mode()), &fonts);
        assert_eq!(names(&list), vec!["solid-rect", "glyphs"]);

        let list = build_display_list(&surface(TextEffect::Shadow, mode()), &fonts);
        assert_eq!(names(&list), vec!["solid-rect", "text-shadow", "glyphs"]);

        let list = build_display_list(&surface(TextEffect::Underline, mode()), &fonts);
        assert_eq!(names(&list), vec!["solid-rect", "glyphs", "decoration"]);
    }
}
