//! Resolve inline style declarations into typed paint values.
//!
//! Invalid values behave like a browser ignoring a declaration: they fall
//! back to the initial value, with a warning in the log.

use crate::preview::TextAlign;
use crate::style::{parse_px, split_top_level, split_top_level_whitespace, Color, LinearGradient, StyleMap};

/// Initial font size when `font-size` is missing or unparsable.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextShadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedText {
    pub families: Vec<String>,
    pub size: f32,
    pub color: Color,
    pub align: TextAlign,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub shadow: Option<TextShadow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSize {
    Auto,
    Cover,
    Contain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    /// Raw URL from `url(...)`
    pub source: String,
    pub size: BackgroundSize,
    pub repeat: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundLayer {
    Gradient(LinearGradient),
    Image(ImageLayer),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedBackground {
    pub color: Color,
    pub layer: Option<BackgroundLayer>,
}

/// Split a `font-family` list, dropping quotes.
pub fn parse_font_families(value: &str) -> Vec<String> {
    split_top_level(value, ',')
        .into_iter()
        .map(|f| f.trim_matches(|c| c == '"' || c == '\'').trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

/// `<x> <y> [<blur>] <color>` in either order of color and lengths.
pub fn parse_text_shadow(value: &str) -> Option<TextShadow> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("none") {
        return None;
    }
    // only the first shadow of a list is painted
    let first = split_top_level(v, ',').into_iter().next()?;
    let mut lengths = Vec::new();
    let mut color = None;
    for token in split_top_level_whitespace(first) {
        match parse_px(token) {
            Some(px) => lengths.push(px),
            None => color = Some(Color::parse(token)?),
        }
    }
    if lengths.len() < 2 || lengths.len() > 3 {
        return None;
    }
    Some(TextShadow {
        offset_x: lengths[0],
        offset_y: lengths[1],
        blur: lengths.get(2).copied().unwrap_or(0.0).max(0.0),
        color: color.unwrap_or(Color::BLACK),
    })
}

/// Strip `url(...)`, with or without quotes.
pub fn parse_url(value: &str) -> Option<String> {
    let v = value.trim();
    let inner = v.strip_prefix("url(")?.strip_suffix(')')?.trim();
    let inner = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(inner);
    Some(inner.to_string())
}

fn warn_invalid(property: &str, value: &str) {
    let shown: String = value.chars().take(64).collect();
    log::warn!("Ignoring invalid {} value: {}", property, shown);
}

pub fn compute_text(style: &StyleMap) -> ComputedText {
    let families = parse_font_families(style.get_or("font-family", "sans-serif"));

    let size_value = style.get_or("font-size", "16px");
    let size = match parse_px(size_value) {
        Some(px) if px > 0.0 => px,
        _ => {
            warn_invalid("font-size", size_value);
            DEFAULT_FONT_SIZE
        }
    };

    let color_value = style.get_or("color", "#000000");
    let color = Color::parse(color_value).unwrap_or_else(|| {
        warn_invalid("color", color_value);
        Color::BLACK
    });

    let align = TextAlign::from_css(style.get_or("text-align", "left")).unwrap_or(TextAlign::Left);

    let weight = style.get_or("font-weight", "normal").trim().to_ascii_lowercase();
    let bold = match weight.as_str() {
        "bold" | "bolder" => true,
        w => w.parse::<u16>().map(|n| n >= 600).unwrap_or(false),
    };
    let slant = style.get_or("font-style", "normal").trim().to_ascii_lowercase();
    let italic = slant == "italic" || slant.starts_with("oblique");
    let underline = style
        .get_or("text-decoration", "none")
        .split_whitespace()
        .any(|t| t.eq_ignore_ascii_case("underline"));

    let shadow_value = style.get_or("text-shadow", "none");
    let shadow = parse_text_shadow(shadow_value);
    if shadow.is_none() && !shadow_value.trim().eq_ignore_ascii_case("none") {
        warn_invalid("text-shadow", shadow_value);
    }

    ComputedText {
        families,
        size,
        color,
        align,
        bold,
        italic,
        underline,
        shadow,
    }
}

fn parse_layer(value: &str, style: &StyleMap) -> Option<BackgroundLayer> {
    if let Some(gradient) = LinearGradient::parse(value) {
        return Some(BackgroundLayer::Gradient(gradient));
    }
    let source = parse_url(value)?;
    let size = match style.get_or("background-size", "auto").trim() {
        "cover" => BackgroundSize::Cover,
        "contain" => BackgroundSize::Contain,
        _ => BackgroundSize::Auto,
    };
    let repeat = style.get_or("background-repeat", "repeat").trim() != "no-repeat";
    Some(BackgroundLayer::Image(ImageLayer { source, size, repeat }))
}

pub fn compute_background(style: &StyleMap) -> ComputedBackground {
    let mut color = Color::TRANSPARENT;
    let mut layer = None;

    // shorthand first, longhands override it
    let shorthand = style.get_or("background", "none").trim();
    if !shorthand.eq_ignore_ascii_case("none") && !shorthand.is_empty() {
        if let Some(c) = Color::parse(shorthand) {
            color = c;
        } else if let Some(l) = parse_layer(shorthand, style) {
            layer = Some(l);
        } else {
            warn_invalid("background", shorthand);
        }
    }

    let color_value = style.get_or("background-color", "transparent").trim();
    match Color::parse(color_value) {
        Some(c) if !c.is_transparent() => color = c,
        Some(_) => {}
        None => warn_invalid("background-color", color_value),
    }

    let image_value = style.get_or("background-image", "none").trim();
    if !image_value.eq_ignore_ascii_case("none") {
        match parse_layer(image_value, style) {
            Some(l) => layer = Some(l),
            None => warn_invalid("background-image", image_value),
        }
    }

    ComputedBackground { color, layer }
}
