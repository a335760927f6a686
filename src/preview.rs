//! Live preview renderer
//!
//! `render_text` is a pure function from the current control values and the
//! selected effect to the inline style of the preview text element. `Preview`
//! is the thin adapter that holds the rendered element state and overwrites
//! it on every render.

use crate::style::StyleMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown when the caption field is empty.
pub const FALLBACK_TEXT: &str = "Hello World! 🌟";

/// `text-shadow` used by the shadow effect.
pub const SHADOW_EFFECT: &str = "2px 2px 8px rgba(0,0,0,0.4)";

/// Font families offered by the font selector.
pub const FONT_FAMILIES: &[&str] = &[
    "Arial",
    "Helvetica",
    "Georgia",
    "Times New Roman",
    "Courier New",
    "Verdana",
    "Trebuchet MS",
    "Comic Sans MS",
    "Impact",
];

/// Bounds of the size slider (px).
pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 72;

/// Mutually exclusive text effect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TextEffect {
    #[default]
    Normal,
    Bold,
    Italic,
    Shadow,
    Underline,
}

impl TextEffect {
    pub const ALL: [TextEffect; 5] = [
        TextEffect::Normal,
        TextEffect::Bold,
        TextEffect::Italic,
        TextEffect::Shadow,
        TextEffect::Underline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextEffect::Normal => "normal",
            TextEffect::Bold => "bold",
            TextEffect::Italic => "italic",
            TextEffect::Shadow => "shadow",
            TextEffect::Underline => "underline",
        }
    }
}

impl fmt::Display for TextEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal alignment of the caption.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }

    /// Parse a `text-align` keyword; `start`/`end` map onto left/right.
    pub fn from_css(value: &str) -> Option<TextAlign> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" | "end" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }
}

impl fmt::Display for TextAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live values of the input controls.
///
/// Values come from trusted controls and are mirrored verbatim into styles;
/// nothing here is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    pub text: String,
    pub font_family: String,
    /// Font size in px
    pub font_size: u32,
    pub font_color: String,
    pub align: TextAlign,
    /// Background color picker value
    pub bg_color: String,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "Arial".to_string(),
            font_size: 24,
            font_color: "#ffffff".to_string(),
            align: TextAlign::Center,
            bg_color: "#25d366".to_string(),
        }
    }
}

/// Output of one render pass over the text controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedText {
    pub content: String,
    pub size_label: String,
    pub style: StyleMap,
}

/// Effect declarations: every effect property reset to neutral, then exactly
/// one variant applied on top.
pub fn effect_declarations(effect: TextEffect) -> StyleMap {
    let mut style = StyleMap::new();
    style.set("font-weight", "normal");
    style.set("font-style", "normal");
    style.set("text-decoration", "none");
    style.set("text-shadow", "none");

    match effect {
        TextEffect::Bold => style.set("font-weight", "bold"),
        TextEffect::Italic => style.set("font-style", "italic"),
        TextEffect::Shadow => style.set("text-shadow", SHADOW_EFFECT),
        TextEffect::Underline => style.set("text-decoration", "underline"),
        TextEffect::Normal => {}
    }
    style
}

/// Render the preview text element from control values and the current effect.
pub fn render_text(controls: &Controls, effect: TextEffect) -> RenderedText {
    let content = if controls.text.is_empty() {
        FALLBACK_TEXT.to_string()
    } else {
        controls.text.clone()
    };
    let size = format!("{}px", controls.font_size);

    let mut style = StyleMap::new();
    style.set("font-family", controls.font_family.as_str());
    style.set("font-size", size.as_str());
    style.set("color", controls.font_color.as_str());
    style.set("text-align", controls.align.as_str());
    style.merge(&effect_declarations(effect));

    RenderedText {
        content,
        size_label: size,
        style,
    }
}

/// Effects currently visible in a text style block.
///
/// A well-formed render yields at most one entry; `Normal` is never listed.
pub fn active_effects(style: &StyleMap) -> Vec<TextEffect> {
    let mut out = Vec::new();
    if style.get_or("font-weight", "normal") != "normal" {
        out.push(TextEffect::Bold);
    }
    if style.get_or("font-style", "normal") != "normal" {
        out.push(TextEffect::Italic);
    }
    if style.get_or("text-shadow", "none") != "none" {
        out.push(TextEffect::Shadow);
    }
    if style.get_or("text-decoration", "none") != "none" {
        out.push(TextEffect::Underline);
    }
    out
}

/// The preview text element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewText {
    pub content: String,
    pub style: StyleMap,
}

/// Modeled preview: text element, size label, and the surface element that
/// carries the background declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub text: PreviewText,
    pub size_label: String,
    pub surface: StyleMap,
}

impl Preview {
    /// Overwrite the text element and the size label from a render pass.
    pub fn apply_text(&mut self, rendered: RenderedText) {
        self.text.content = rendered.content;
        self.text.style.merge(&rendered.style);
        self.size_label = rendered.size_label;
    }
}

/// Everything the rasterizer needs to composite the preview.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSurface {
    /// Surface size in CSS px
    pub width: f32,
    pub height: f32,
    /// Inner padding around the text block (CSS px)
    pub padding: f32,
    pub text: String,
    pub text_style: StyleMap,
    pub surface_style: StyleMap,
}
