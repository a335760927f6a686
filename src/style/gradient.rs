//! `linear-gradient()` values: parsing, geometry, and the random/preset generators.

use super::{function_args, split_top_level, split_top_level_whitespace, Color};
use rand::Rng;

/// Default two-color diagonal gradient, restored by "clear image".
pub const DEFAULT_GRADIENT: &str = "linear-gradient(135deg, #667eea, #764ba2)";

/// Preset swatches offered next to the random gradient button.
pub const PRESET_GRADIENTS: &[&str] = &[
    "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
    "linear-gradient(135deg, #f093fb 0%, #f5576c 100%)",
    "linear-gradient(135deg, #4facfe 0%, #00f2fe 100%)",
    "linear-gradient(135deg, #43e97b 0%, #38f9d7 100%)",
    "linear-gradient(135deg, #fa709a 0%, #fee140 100%)",
    "linear-gradient(135deg, #30cfd0 0%, #330867 100%)",
    "linear-gradient(135deg, #a8edea 0%, #fed6e3 100%)",
    "linear-gradient(135deg, #ff9a9e 0%, #fecfef 100%)",
];

/// Angle of random gradients (degrees).
pub const RANDOM_GRADIENT_ANGLE: u32 = 135;
/// Saturation of every random stop (percent).
pub const RANDOM_SATURATION: u32 = 80;
/// Lightness of every random stop (percent).
pub const RANDOM_LIGHTNESS: u32 = 60;

/// Draw three hues spaced 60..180 degrees apart from each other.
///
/// `hue1` is uniform in `[0, 360)`; each following hue adds `60 + [0, 120)`
/// (mod 360) to the previous one, which keeps consecutive stops visually
/// distinct.
pub fn random_hues<R: Rng + ?Sized>(rng: &mut R) -> [u32; 3] {
    let hue1 = rng.gen_range(0..360u32);
    let hue2 = (hue1 + 60 + rng.gen_range(0..120u32)) % 360;
    let hue3 = (hue2 + 60 + rng.gen_range(0..120u32)) % 360;
    [hue1, hue2, hue3]
}

/// CSS for a three-stop 135deg gradient at fixed saturation/lightness.
pub fn hsl_gradient_css(hues: [u32; 3]) -> String {
    let stops = hues
        .iter()
        .map(|h| format!("hsl({}, {}%, {}%)", h, RANDOM_SATURATION, RANDOM_LIGHTNESS))
        .collect::<Vec<_>>()
        .join(", ");
    format!("linear-gradient({}deg, {})", RANDOM_GRADIENT_ANGLE, stops)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientDirection {
    /// CSS angle in degrees (0 = towards the top, clockwise)
    Angle(f32),
    /// `to <side-or-corner>` as a unit vector in screen space (x right, y down)
    ToSide { dx: f32, dy: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorStop {
    pub color: Color,
    /// Position along the gradient line in `0..=1`, if given
    pub position: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub direction: GradientDirection,
    pub stops: Vec<ColorStop>,
}

impl LinearGradient {
    /// Parse `linear-gradient(...)`. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        let args = function_args(value, "linear-gradient")?;
        let mut parts = split_top_level(args, ',');
        if parts.is_empty() {
            return None;
        }

        let direction = match parse_direction(parts[0]) {
            Some(d) => {
                parts.remove(0);
                d
            }
            None => GradientDirection::Angle(180.0),
        };

        let stops = parts
            .into_iter()
            .map(parse_stop)
            .collect::<Option<Vec<_>>>()?;
        if stops.len() < 2 {
            return None;
        }
        Some(Self { direction, stops })
    }

    /// Effective CSS angle in degrees for a box of the given size.
    pub fn angle_for(&self, width: f32, height: f32) -> f32 {
        match self.direction {
            GradientDirection::Angle(a) => a,
            GradientDirection::ToSide { dx, dy } => {
                if dx == 0.0 || dy == 0.0 {
                    // straight side: direction vector maps directly onto an angle
                    dx.atan2(-dy).to_degrees().rem_euclid(360.0)
                } else {
                    // corner: the gradient line is perpendicular to the diagonal
                    // that does not touch the target corner
                    let base = height.atan2(width).to_degrees();
                    match (dx > 0.0, dy > 0.0) {
                        (true, false) => base,
                        (true, true) => 180.0 - base,
                        (false, true) => 180.0 + base,
                        (false, false) => 360.0 - base,
                    }
                }
            }
        }
    }

    /// Start and end points of the gradient line inside a `width x height` box.
    pub fn line(&self, width: f32, height: f32) -> ((f32, f32), (f32, f32)) {
        let angle = self.angle_for(width, height).to_radians();
        let (sin, cos) = angle.sin_cos();
        let length = (width * sin).abs() + (height * cos).abs();
        let (cx, cy) = (width / 2.0, height / 2.0);
        let (dx, dy) = (sin * length / 2.0, -cos * length / 2.0);
        ((cx - dx, cy - dy), (cx + dx, cy + dy))
    }

    /// Stops with every position filled in (missing ones are spread evenly).
    pub fn resolved_stops(&self) -> Vec<(f32, Color)> {
        let n = self.stops.len();
        let mut positions: Vec<Option<f32>> = self.stops.iter().map(|s| s.position).collect();
        if let Some(first) = positions.first_mut() {
            first.get_or_insert(0.0);
        }
        if let Some(last) = positions.last_mut() {
            last.get_or_insert(1.0);
        }
        // positions never go backwards
        let mut max_seen = 0.0f32;
        for p in positions.iter_mut().flatten() {
            if *p < max_seen {
                *p = max_seen;
            }
            max_seen = *p;
        }
        let mut i = 0;
        while i < n {
            if positions[i].is_some() {
                i += 1;
                continue;
            }
            let start = i - 1;
            let mut end = i;
            while positions[end].is_none() {
                end += 1;
            }
            let (a, b) = (positions[start].unwrap_or(0.0), positions[end].unwrap_or(1.0));
            let span = (end - start) as f32;
            for (k, slot) in positions.iter_mut().enumerate().take(end).skip(i) {
                *slot = Some(a + (b - a) * (k - start) as f32 / span);
            }
            i = end;
        }
        self.stops
            .iter()
            .zip(positions)
            .map(|(s, p)| (p.unwrap_or(0.0), s.color))
            .collect()
    }
}

fn parse_direction(token: &str) -> Option<GradientDirection> {
    let t = token.trim().to_ascii_lowercase();
    if let Some(sides) = t.strip_prefix("to ") {
        let (mut dx, mut dy) = (0.0f32, 0.0f32);
        for word in sides.split_whitespace() {
            match word {
                "left" => dx = -1.0,
                "right" => dx = 1.0,
                "top" => dy = -1.0,
                "bottom" => dy = 1.0,
                _ => return None,
            }
        }
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        return Some(GradientDirection::ToSide { dx, dy });
    }
    parse_angle(&t).map(GradientDirection::Angle)
}

fn parse_angle(t: &str) -> Option<f32> {
    if let Some(v) = t.strip_suffix("deg") {
        return v.trim().parse().ok();
    }
    if let Some(v) = t.strip_suffix("grad") {
        return v.trim().parse::<f32>().ok().map(|g| g * 0.9);
    }
    if let Some(v) = t.strip_suffix("rad") {
        return v.trim().parse::<f32>().ok().map(|r| r.to_degrees());
    }
    if let Some(v) = t.strip_suffix("turn") {
        return v.trim().parse::<f32>().ok().map(|r| r * 360.0);
    }
    None
}

fn parse_stop(token: &str) -> Option<ColorStop> {
    let tokens = split_top_level_whitespace(token);
    let (color, position) = match tokens.as_slice() {
        [color] => (*color, None),
        [color, pos] => (*color, Some(*pos)),
        _ => return None,
    };
    let position = match position {
        Some(p) => Some(p.trim().strip_suffix('%')?.trim().parse::<f32>().ok()? / 100.0),
        None => None,
    };
    Some(ColorStop {
        color: Color::parse(color)?,
        position,
    })
}
