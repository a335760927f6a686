//! CSS color values

use super::{function_args, split_top_level};

/// Color (RGBA, straight alpha)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const NAMED: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("lime", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("pink", (255, 192, 203)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("cyan", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("gold", (255, 215, 0)),
    ("silver", (192, 192, 192)),
];

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Convert HSL (hue in degrees, saturation and lightness in 0..=1).
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                hue_to_channel(p, q, h + 1.0 / 3.0),
                hue_to_channel(p, q, h),
                hue_to_channel(p, q, h - 1.0 / 3.0),
            )
        };
        Self {
            r: unit_to_u8(r),
            g: unit_to_u8(g),
            b: unit_to_u8(b),
            a: unit_to_u8(alpha),
        }
    }

    /// Parse a CSS color: hex, `rgb[a]()`, `hsl[a]()`, `transparent` or a named color.
    pub fn parse(value: &str) -> Option<Color> {
        let v = value.trim();
        if let Some(hex) = v.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = v.to_ascii_lowercase();
        if lower == "transparent" {
            return Some(Color::TRANSPARENT);
        }
        if let Some(args) = function_args(v, "rgba").or_else(|| function_args(v, "rgb")) {
            return parse_rgb_args(args);
        }
        if let Some(args) = function_args(v, "hsla").or_else(|| function_args(v, "hsl")) {
            return parse_hsl_args(args);
        }
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, (r, g, b))| Color::rgb(*r, *g, *b))
    }

    /// `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// Split `a, b, c[, d]` or `a b c [/ d]` into components.
fn components(args: &str) -> Vec<&str> {
    if args.contains(',') {
        split_top_level(args, ',')
    } else {
        args.split(|c: char| c.is_whitespace() || c == '/')
            .filter(|t| !t.is_empty())
            .collect()
    }
}

fn parse_alpha(token: &str) -> Option<f32> {
    let t = token.trim();
    if let Some(pct) = t.strip_suffix('%') {
        return pct.trim().parse::<f32>().ok().map(|p| p / 100.0);
    }
    t.parse::<f32>().ok()
}

fn parse_rgb_args(args: &str) -> Option<Color> {
    let parts = components(args);
    if parts.len() < 3 || parts.len() > 4 {
        return None;
    }
    let channel = |t: &str| -> Option<u8> {
        let t = t.trim();
        if let Some(pct) = t.strip_suffix('%') {
            let p = pct.trim().parse::<f32>().ok()?;
            return Some(unit_to_u8(p / 100.0));
        }
        let n = t.parse::<f32>().ok()?;
        Some(n.round().clamp(0.0, 255.0) as u8)
    };
    let a = match parts.get(3) {
        Some(t) => unit_to_u8(parse_alpha(t)?),
        None => 255,
    };
    Some(Color::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
}

fn parse_hsl_args(args: &str) -> Option<Color> {
    let parts = components(args);
    if parts.len() < 3 || parts.len() > 4 {
        return None;
    }
    let hue = parts[0].trim().trim_end_matches("deg").parse::<f32>().ok()?;
    let pct = |t: &str| -> Option<f32> {
        t.trim().trim_end_matches('%').trim().parse::<f32>().ok().map(|p| p / 100.0)
    };
    let alpha = match parts.get(3) {
        Some(t) => parse_alpha(t)?,
        None => 1.0,
    };
    Some(Color::from_hsl(hue, pct(parts[1])?, pct(parts[2])?, alpha))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("#667eea"), Some(Color::rgb(0x66, 0x7e, 0xea)));
        assert_eq!(Color::parse("#00000080"), Some(Color::rgba(0, 0, 0, 0x80)));
        assert_eq!(Color::parse("#12"), None);
        assert_eq!(Color::parse("#zzzzzz"), None);
    }

    #[test]
    fn parses_functional_forms() {
        assert_eq!(Color::parse("rgb(255, 0, 0)"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("rgba(0,0,0,0.4)"), Some(Color::rgba(0, 0, 0, 102)));
        assert_eq!(Color::parse("rgb(0 128 255 / 50%)"), Some(Color::rgba(0, 128, 255, 128)));
        assert_eq!(Color::parse("hsl(0, 100%, 50%)"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("hsl(120, 100%, 25%)"), Some(Color::rgb(0, 128, 0)));
    }

    #[test]
    fn parses_keywords() {
        assert_eq!(Color::parse("transparent"), Some(Color::TRANSPARENT));
        assert_eq!(Color::parse("White"), Some(Color::WHITE));
        assert_eq!(Color::parse("none"), None);
    }

    #[test]
    fn hsl_used_by_random_gradients() {
        // 80% saturation, 60% lightness at hue 0
        let c = Color::from_hsl(0.0, 0.8, 0.6, 1.0);
        assert_eq!(c, Color::rgb(235, 71, 71));
        assert_eq!(c.to_hex(), "#eb4747");
    }
}
