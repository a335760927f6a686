//! Font lookup on top of `fontdb`.
//!
//! Families are matched in CSS order with the generic families mapped onto
//! fontdb's generic slots, which are pointed at installed families when the
//! book is loaded. A named family that is missing degrades to its generic
//! class and then to sans-serif. A face that lacks the requested weight or
//! slant is flagged so the painter can synthesize it.

use crate::{Error, Result};
use fontdb::{Database, Family, Query, Stretch, Style, Weight, ID};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A loaded face plus the synthesis it needs.
#[derive(Clone)]
pub struct FontFace {
    pub id: ID,
    pub data: Arc<Vec<u8>>,
    pub index: u32,
    pub synthetic_bold: bool,
    pub synthetic_italic: bool,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("id", &self.id)
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .field("synthetic_bold", &self.synthetic_bold)
            .field("synthetic_italic", &self.synthetic_italic)
            .finish()
    }
}

impl PartialEq for FontFace {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.synthetic_bold == other.synthetic_bold
            && self.synthetic_italic == other.synthetic_italic
    }
}

impl FontFace {
    pub fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }

}

pub struct FontBook {
    db: Database,
    data: Mutex<HashMap<ID, (Arc<Vec<u8>>, u32)>>,
    fallback: Mutex<HashMap<char, Option<ID>>>,
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontBook").field("faces", &self.db.len()).finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::from_database(Database::new())
    }
}

fn family_for(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "system-ui" => Family::SansSerif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

const SANS_SERIF_PREFERENCE: &[&str] = &[
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "Arimo",
    "DejaVu Sans",
    "Noto Sans",
    "Roboto",
    "Open Sans",
    "Verdana",
    "FreeSans",
];
const SERIF_PREFERENCE: &[&str] = &[
    "Times New Roman",
    "Liberation Serif",
    "Tinos",
    "DejaVu Serif",
    "Noto Serif",
    "Georgia",
    "FreeSerif",
];
const MONOSPACE_PREFERENCE: &[&str] = &[
    "Courier New",
    "Liberation Mono",
    "Cousine",
    "DejaVu Sans Mono",
    "Noto Sans Mono",
    "FreeMono",
];
const CURSIVE_PREFERENCE: &[&str] = &["Comic Sans MS", "Comic Neue"];
const FANTASY_PREFERENCE: &[&str] = &["Impact", "Anton"];

/// Families that only carry symbols, math or emoji.
fn is_symbolic(family: &str) -> bool {
    let lower = family.to_ascii_lowercase();
    ["math", "symbol", "emoji", "dingbat", "wingding", "webding"]
        .iter()
        .any(|w| lower.contains(w))
}

/// Generic family a named family degrades to when it is not installed.
fn generic_class(name: &str) -> Option<Family<'static>> {
    match name.to_ascii_lowercase().as_str() {
        "georgia" | "times new roman" | "times" | "palatino" | "garamond" => Some(Family::Serif),
        "courier new" | "courier" | "consolas" | "monaco" => Some(Family::Monospace),
        _ => None,
    }
}

/// Primary family names of every face, sorted and deduplicated.
fn installed_families(db: &Database) -> Vec<String> {
    let mut names: Vec<String> = db
        .faces()
        .filter_map(|f| f.families.first().map(|(name, _)| name.clone()))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// First installed family from `preference`. With `any_text_face`, falls
/// back to the first installed family that is not symbolic.
fn pick_family(installed: &[String], preference: &[&str], any_text_face: bool) -> Option<String> {
    preference
        .iter()
        .find_map(|want| installed.iter().find(|have| have.eq_ignore_ascii_case(want)))
        .or_else(|| {
            if any_text_face {
                installed.iter().find(|f| !is_symbolic(f))
            } else {
                None
            }
        })
        .cloned()
}

/// Point fontdb's generic slots at families that are actually installed.
fn assign_generic_families(db: &mut Database) {
    let installed = installed_families(db);
    let sans = pick_family(&installed, SANS_SERIF_PREFERENCE, true);
    if let Some(family) = &sans {
        log::debug!("sans-serif -> {}", family);
        db.set_sans_serif_family(family.as_str());
    }
    if let Some(family) = pick_family(&installed, SERIF_PREFERENCE, false).or_else(|| sans.clone()) {
        log::debug!("serif -> {}", family);
        db.set_serif_family(family);
    }
    if let Some(family) = pick_family(&installed, MONOSPACE_PREFERENCE, false).or_else(|| sans.clone()) {
        log::debug!("monospace -> {}", family);
        db.set_monospace_family(family);
    }
    if let Some(family) = pick_family(&installed, CURSIVE_PREFERENCE, false) {
        db.set_cursive_family(family);
    }
    if let Some(family) = pick_family(&installed, FANTASY_PREFERENCE, false) {
        db.set_fantasy_family(family);
    }
}

impl FontBook {
    fn from_database(db: Database) -> Self {
        Self {
            db,
            data: Mutex::new(HashMap::new()),
            fallback: Mutex::new(HashMap::new()),
        }
    }

    /// Empty book: text is skipped at paint time.
    pub fn empty() -> Self {
        Self::default()
    }

    /// System fonts plus every font found under `extra_dirs`.
    pub fn system(extra_dirs: &[PathBuf]) -> Result<Self> {
        let mut db = Database::new();
        db.load_system_fonts();
        for dir in extra_dirs {
            if !dir.is_dir() {
                return Err(Error::FontError(format!(
                    "font directory {} not found",
                    dir.display()
                )));
            }
            db.load_fonts_dir(dir);
        }
        assign_generic_families(&mut db);
        log::debug!("Loaded {} font faces", db.len());
        Ok(Self::from_database(db))
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Primary family name of a resolved face.
    pub fn family_name(&self, face: &FontFace) -> Option<String> {
        self.db
            .face(face.id)
            .and_then(|info| info.families.first().map(|(name, _)| name.clone()))
    }

    fn face_data(&self, id: ID) -> Option<(Arc<Vec<u8>>, u32)> {
        if let Ok(cache) = self.data.lock() {
            if let Some(hit) = cache.get(&id) {
                return Some(hit.clone());
            }
        }
        let loaded = self
            .db
            .with_face_data(id, |data, index| (Arc::new(data.to_vec()), index))?;
        if let Ok(mut cache) = self.data.lock() {
            cache.insert(id, loaded.clone());
        }
        Some(loaded)
    }

    fn load(&self, id: ID, bold: bool, italic: bool) -> Option<FontFace> {
        let info = self.db.face(id)?;
        let (data, index) = self.face_data(id)?;
        Some(FontFace {
            id,
            data,
            index,
            synthetic_bold: bold && info.weight.0 < 600,
            synthetic_italic: italic && info.style == Style::Normal,
        })
    }

    /// Text face closest to the requested weight and slant, for when no
    /// family in the list matches.
    fn closest_face(&self, bold: bool, italic: bool) -> Option<ID> {
        let weight = if bold { Weight::BOLD.0 } else { Weight::NORMAL.0 };
        let style = if italic { Style::Italic } else { Style::Normal };
        self.db
            .faces()
            .filter(|f| f.families.first().map_or(true, |(name, _)| !is_symbolic(name)))
            .min_by_key(|f| {
                (
                    f.style != style,
                    f.weight.0.abs_diff(weight),
                    f.families.first().map(|(name, _)| name.clone()),
                )
            })
            .or_else(|| self.db.faces().next())
            .map(|f| f.id)
    }

    /// Best face for a CSS family list. Missing named families degrade to
    /// their generic class, then to sans-serif, then to the closest text face.
    pub fn resolve(&self, families: &[String], bold: bool, italic: bool) -> Option<FontFace> {
        let mut wanted: Vec<Family<'_>> = Vec::with_capacity(families.len() * 2 + 1);
        for name in families {
            wanted.push(family_for(name));
            if let Some(class) = generic_class(name) {
                wanted.push(class);
            }
        }
        wanted.push(Family::SansSerif);
        let query = Query {
            families: &wanted,
            weight: if bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: if italic { Style::Italic } else { Style::Normal },
        };
        let id = self
            .db
            .query(&query)
            .or_else(|| self.closest_face(bold, italic))?;
        self.load(id, bold, italic)
    }

    /// Some face that has a glyph for `c`, for characters the primary face
    /// cannot draw (emoji, symbols).
    pub fn fallback_for(&self, c: char, bold: bool, italic: bool) -> Option<FontFace> {
        let cached = self.fallback.lock().ok().and_then(|m| m.get(&c).copied());
        let id = match cached {
            Some(hit) => hit,
            None => {
                let found = self.db.faces().map(|f| f.id).find(|&id| {
                    self.db
                        .with_face_data(id, |data, index| {
                            ttf_parser::Face::parse(data, index)
                                .ok()
                                .and_then(|f| f.glyph_index(c))
                                .is_some()
                        })
                        .unwrap_or(false)
                });
                if found.is_none() {
                    log::debug!("No font covers U+{:04X}", c as u32);
                }
                if let Ok(mut m) = self.fallback.lock() {
                    m.insert(c, found);
                }
                found
            }
        };
        self.load(id?, bold, italic)
    }
}
