//! Background manager
//!
//! The preview surface shows exactly one of a flat color, a gradient, or an
//! uploaded image. Every operation rewrites all background slots of the
//! surface style: the chosen representation gets its value, the others get
//! their neutral value. The file picker selection is cleared by every
//! operation except the upload itself, and any image read still in flight is
//! superseded.

use crate::style::gradient::DEFAULT_GRADIENT;
use crate::style::StyleMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Neutral values of the three background representations.
pub const NEUTRAL_BACKGROUND: &str = "none";
pub const NEUTRAL_BACKGROUND_COLOR: &str = "transparent";
pub const NEUTRAL_BACKGROUND_IMAGE: &str = "none";

/// The active background representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BackgroundMode {
    /// Flat color (`background-color`)
    Color(String),
    /// CSS gradient (`background` shorthand)
    Gradient(String),
    /// Image as a data URL (`background-image`)
    Image(String),
}

impl Default for BackgroundMode {
    fn default() -> Self {
        BackgroundMode::Gradient(DEFAULT_GRADIENT.to_string())
    }
}

impl BackgroundMode {
    pub fn kind(&self) -> BackgroundKind {
        match self {
            BackgroundMode::Color(_) => BackgroundKind::Color,
            BackgroundMode::Gradient(_) => BackgroundKind::Gradient,
            BackgroundMode::Image(_) => BackgroundKind::Image,
        }
    }

    /// Full set of background declarations for this mode.
    pub fn declarations(&self) -> StyleMap {
        let mut style = StyleMap::new();
        style.set("background", NEUTRAL_BACKGROUND);
        style.set("background-color", NEUTRAL_BACKGROUND_COLOR);
        style.set("background-image", NEUTRAL_BACKGROUND_IMAGE);
        style.set("background-size", "auto");
        style.set("background-position", "0% 0%");
        style.set("background-repeat", "repeat");

        match self {
            BackgroundMode::Color(color) => style.set("background-color", color.as_str()),
            BackgroundMode::Gradient(css) => style.set("background", css.as_str()),
            BackgroundMode::Image(data_url) => {
                style.set("background-image", format!("url({})", data_url));
                style.set("background-size", "cover");
                style.set("background-position", "center");
                style.set("background-repeat", "no-repeat");
            }
        }
        style
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    Color,
    Gradient,
    Image,
}

/// Background representations that are not at their neutral value.
pub fn active_backgrounds(surface: &StyleMap) -> Vec<BackgroundKind> {
    let mut out = Vec::new();
    if surface.get_or("background-color", NEUTRAL_BACKGROUND_COLOR) != NEUTRAL_BACKGROUND_COLOR {
        out.push(BackgroundKind::Color);
    }
    if surface.get_or("background", NEUTRAL_BACKGROUND) != NEUTRAL_BACKGROUND {
        out.push(BackgroundKind::Gradient);
    }
    if surface.get_or("background-image", NEUTRAL_BACKGROUND_IMAGE) != NEUTRAL_BACKGROUND_IMAGE {
        out.push(BackgroundKind::Image);
    }
    out
}

/// The image file picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileInput {
    selection: Option<PathBuf>,
}

impl FileInput {
    pub fn select(&mut self, path: impl Into<PathBuf>) {
        self.selection = Some(path.into());
    }

    pub fn clear(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<&Path> {
        self.selection.as_deref()
    }
}

/// Identifies one image read; only the newest ticket may apply its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub generation: u64,
    pub path: PathBuf,
}

/// Owns the background mode, the file picker, and the upload generation.
#[derive(Debug, Clone, Default)]
pub struct BackgroundManager {
    mode: BackgroundMode,
    file_input: FileInput,
    generation: u64,
    pending: Option<u64>,
}

impl BackgroundManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &BackgroundMode {
        &self.mode
    }

    pub fn file_input(&self) -> &FileInput {
        &self.file_input
    }

    /// Generation of the image read still in flight, if any.
    pub fn pending_upload(&self) -> Option<u64> {
        self.pending
    }

    /// Write the current mode's declarations into the surface style.
    pub fn paint_into(&self, surface: &mut StyleMap) {
        surface.merge(&self.mode.declarations());
    }

    fn supersede_upload(&mut self) {
        if let Some(generation) = self.pending.take() {
            log::debug!("Superseding image read #{}", generation);
        }
        self.generation += 1;
    }

    fn switch(&mut self, mode: BackgroundMode, surface: &mut StyleMap) {
        self.supersede_upload();
        self.mode = mode;
        self.paint_into(surface);
        self.file_input.clear();
    }

    /// Flat color from the color picker.
    pub fn set_color(&mut self, color: &str, surface: &mut StyleMap) {
        self.switch(BackgroundMode::Color(color.to_string()), surface);
    }

    /// Gradient from the random generator or a preset swatch.
    pub fn set_gradient(&mut self, css: &str, surface: &mut StyleMap) {
        self.switch(BackgroundMode::Gradient(css.to_string()), surface);
    }

    /// Restore the default gradient.
    pub fn clear_image(&mut self, surface: &mut StyleMap) {
        self.switch(BackgroundMode::default(), surface);
    }

    /// Register a picker selection. Returns `None` when nothing was selected.
    ///
    /// A new selection supersedes any earlier read that has not landed yet.
    pub fn begin_upload(&mut self, selection: Option<PathBuf>) -> Option<UploadTicket> {
        let path = selection?;
        self.supersede_upload();
        self.file_input.select(path.clone());
        self.pending = Some(self.generation);
        Some(UploadTicket {
            generation: self.generation,
            path,
        })
    }

    /// Apply a finished read. Stale tickets are ignored and return `false`.
    pub fn complete_upload(
        &mut self,
        ticket: &UploadTicket,
        data_url: String,
        surface: &mut StyleMap,
    ) -> bool {
        if self.pending != Some(ticket.generation) {
            return false;
        }
        self.pending = None;
        self.mode = BackgroundMode::Image(data_url);
        self.paint_into(surface);
        true
    }

    /// Forget a read that failed without touching the background.
    pub fn abandon_upload(&mut self, ticket: &UploadTicket) {
        if self.pending == Some(ticket.generation) {
            self.pending = None;
        }
    }
}
