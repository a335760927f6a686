//! Inline style declarations and the small CSS value grammar the composer needs.
//!
//! The preview is modeled the way a page script sees it: elements carry an
//! inline style declaration block that handlers overwrite property by property.
//! `StyleMap` is that block. The `color` and `gradient` submodules parse the
//! values the rasterizer has to understand.

pub mod color;
pub mod gradient;

pub use color::Color;
pub use gradient::{ColorStop, GradientDirection, LinearGradient};

use serde::Serialize;
use std::collections::BTreeMap;

/// An inline style declaration block (`property -> value`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleMap {
    props: BTreeMap<String, String>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a property, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.props.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(|s| s.as_str())
    }

    /// Value of `name`, or `default` when the property was never assigned.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Overwrite every property present in `other`.
    pub fn merge(&mut self, other: &StyleMap) {
        for (k, v) in &other.props {
            self.props.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Serialize as a `style` attribute value (`a: b; c: d`).
    pub fn to_css_text(&self) -> String {
        self.props
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Split `input` on `sep`, ignoring separators nested inside parentheses.
pub(crate) fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in input.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Split on top-level whitespace (`hsl(1, 2%, 3%) 50%` -> two tokens).
pub(crate) fn split_top_level_whitespace(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    for (i, ch) in input.char_indices() {
        match ch {
            '(' => {
                depth += 1;
                start.get_or_insert(i);
            }
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    parts.push(&input[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        parts.push(&input[s..]);
    }
    parts
}

/// Parse the argument list of a functional notation: `name(args)` -> `args`.
pub(crate) fn function_args<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    if !lower.starts_with(name) {
        return None;
    }
    let rest = trimmed[name.len()..].trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner)
}

/// Parse a `px` length (a bare `0` is accepted as well).
pub fn parse_px(value: &str) -> Option<f32> {
    let v = value.trim();
    if let Some(num) = v.strip_suffix("px") {
        return num.trim().parse::<f32>().ok();
    }
    match v.parse::<f32>() {
        Ok(n) if n == 0.0 => Some(0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_map_overwrites_and_serializes() {
        let mut s = StyleMap::new();
        s.set("color", "#fff");
        s.set("font-size", "24px");
        s.set("color", "#000");
        assert_eq!(s.get("color"), Some("#000"));
        assert_eq!(s.len(), 2);
        assert_eq!(s.to_css_text(), "color: #000; font-size: 24px");
        assert_eq!(s.get_or("text-align", "start"), "start");
    }

    #[test]
    fn merge_replaces_only_given_properties() {
        let mut base = StyleMap::new();
        base.set("color", "red");
        base.set("font-weight", "bold");
        let mut patch = StyleMap::new();
        patch.set("font-weight", "normal");
        base.merge(&patch);
        assert_eq!(base.get("color"), Some("red"));
        assert_eq!(base.get("font-weight"), Some("normal"));
    }

    #[test]
    fn top_level_split_respects_parentheses() {
        let parts = split_top_level("135deg, hsl(1, 80%, 60%), #fff 50%", ',');
        assert_eq!(parts, vec!["135deg", "hsl(1, 80%, 60%)", "#fff 50%"]);

        let toks = split_top_level_whitespace("rgba(0, 0, 0, 0.4)  2px 2px");
        assert_eq!(toks, vec!["rgba(0, 0, 0, 0.4)", "2px", "2px"]);
    }

    #[test]
    fn px_lengths() {
        assert_eq!(parse_px("8px"), Some(8.0));
        assert_eq!(parse_px(" 2.5px "), Some(2.5));
        assert_eq!(parse_px("0"), Some(0.0));
        assert_eq!(parse_px("3em"), None);
    }
}
