//! The status composer: control values, the current effect, the preview, the
//! background manager and the export trigger, updated one event at a time.

use crate::background::{active_backgrounds, BackgroundKind, BackgroundManager, BackgroundMode, UploadTicket};
use crate::export::{ButtonState, ExportButton, ExportTicket, RevertToken};
use crate::preview::{render_text, Controls, Preview, PreviewSurface, TextAlign, TextEffect};
use crate::style::gradient::{hsl_gradient_css, random_hues, PRESET_GRADIENTS};
use crate::style::StyleMap;
use crate::{ComposerConfig, Error, Result, Viewport};
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;

/// One effect control and whether it carries the active marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectControl {
    pub effect: TextEffect,
    pub active: bool,
}

/// Serializable view of the composer for inspection and script output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposerState {
    pub text: String,
    pub size_label: String,
    pub effect: TextEffect,
    pub text_style: StyleMap,
    pub surface_style: StyleMap,
    pub background: BackgroundMode,
    pub active_backgrounds: Vec<BackgroundKind>,
    pub file_selection: Option<PathBuf>,
    pub button_label: String,
    pub button_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct StatusComposer {
    controls: Controls,
    effect: TextEffect,
    preview: Preview,
    background: BackgroundManager,
    export: ExportButton,
    viewport: Viewport,
    padding: f32,
}

impl StatusComposer {
    pub fn new(config: &ComposerConfig) -> Self {
        log::info!("WhatsApp Status Maker initialized");
        let mut composer = Self {
            controls: config.controls.clone(),
            effect: TextEffect::default(),
            preview: Preview::default(),
            background: BackgroundManager::new(),
            export: ExportButton::new(config.idle_label.clone()),
            viewport: config.viewport,
            padding: config.padding,
        };
        composer.background.paint_into(&mut composer.preview.surface);
        composer.render();
        composer
    }

    fn render(&mut self) {
        self.preview.apply_text(render_text(&self.controls, self.effect));
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn effect(&self) -> TextEffect {
        self.effect
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn background(&self) -> &BackgroundManager {
        &self.background
    }

    pub fn export_button(&self) -> &ExportButton {
        &self.export
    }

    /// The five effect controls in display order.
    pub fn effect_controls(&self) -> Vec<EffectControl> {
        TextEffect::ALL
            .iter()
            .map(|&effect| EffectControl {
                effect,
                active: effect == self.effect,
            })
            .collect()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.controls.text = text.into();
        self.render();
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.controls.font_family = family.into();
        self.render();
    }

    pub fn set_font_size(&mut self, size: u32) {
        self.controls.font_size = size;
        self.render();
    }

    pub fn set_font_color(&mut self, color: impl Into<String>) {
        self.controls.font_color = color.into();
        self.render();
    }

    pub fn set_alignment(&mut self, align: TextAlign) {
        self.controls.align = align;
        self.render();
    }

    pub fn select_effect(&mut self, effect: TextEffect) {
        self.effect = effect;
        self.render();
    }

    pub fn set_background_color(&mut self, color: impl Into<String>) {
        let color = color.into();
        log::info!("Setting background color: {}", color);
        self.background.set_color(&color, &mut self.preview.surface);
        self.controls.bg_color = color;
    }

    /// Apply a fresh three-hue gradient and return its CSS.
    pub fn apply_random_gradient<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let css = hsl_gradient_css(random_hues(rng));
        log::info!("Generated random gradient: {}", css);
        self.background.set_gradient(&css, &mut self.preview.surface);
        css
    }

    pub fn apply_preset_gradient(&mut self, css: &str) {
        log::info!("Applying gradient preset: {}", css);
        self.background.set_gradient(css, &mut self.preview.surface);
    }

    /// Apply the preset swatch at `index`.
    pub fn apply_preset(&mut self, index: usize) -> Result<&'static str> {
        let css = PRESET_GRADIENTS.get(index).copied().ok_or_else(|| {
            Error::ConfigError(format!(
                "no gradient preset {} (have {})",
                index,
                PRESET_GRADIENTS.len()
            ))
        })?;
        self.apply_preset_gradient(css);
        Ok(css)
    }

    /// Register a file picker change. `None` (nothing picked) is a no-op.
    pub fn begin_image_upload(&mut self, selection: Option<PathBuf>) -> Option<UploadTicket> {
        let ticket = self.background.begin_upload(selection)?;
        let name = ticket
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ticket.path.display().to_string());
        log::info!("Image selected: {}", name);
        Some(ticket)
    }

    /// Apply a finished read. Returns `false` for a superseded read.
    pub fn complete_image_upload(&mut self, ticket: &UploadTicket, data_url: String) -> bool {
        if !self.background.complete_upload(ticket, data_url, &mut self.preview.surface) {
            log::debug!("Ignoring superseded image read #{}", ticket.generation);
            return false;
        }
        log::info!("Applying image as background");
        true
    }

    pub fn abandon_image_upload(&mut self, ticket: &UploadTicket, error: &Error) {
        log::warn!("Failed to read {}: {}", ticket.path.display(), error);
        self.background.abandon_upload(ticket);
    }

    pub fn clear_background_image(&mut self) {
        log::info!("Clearing background image");
        self.background.clear_image(&mut self.preview.surface);
    }

    /// Click on the export trigger. `None` while an export is in flight.
    pub fn begin_export(&mut self) -> Option<ExportTicket> {
        let ticket = self.export.begin()?;
        log::info!("Starting image download process");
        Some(ticket)
    }

    pub fn finish_export(&mut self, ticket: ExportTicket) {
        log::info!("Image downloaded successfully");
        self.export.succeed(ticket);
    }

    pub fn fail_export(&mut self, ticket: ExportTicket, error: &Error) -> Option<RevertToken> {
        log::error!("Error generating image: {}", error);
        self.export.fail(ticket)
    }

    pub fn revert_export_label(&mut self, token: RevertToken) -> bool {
        self.export.revert(token)
    }

    /// What the rasterizer sees.
    pub fn surface(&self) -> PreviewSurface {
        PreviewSurface {
            width: self.viewport.width as f32,
            height: self.viewport.height as f32,
            padding: self.padding,
            text: self.preview.text.content.clone(),
            text_style: self.preview.text.style.clone(),
            surface_style: self.preview.surface.clone(),
        }
    }

    pub fn state(&self) -> ComposerState {
        ComposerState {
            text: self.preview.text.content.clone(),
            size_label: self.preview.size_label.clone(),
            effect: self.effect,
            text_style: self.preview.text.style.clone(),
            surface_style: self.preview.surface.clone(),
            background: self.background.mode().clone(),
            active_backgrounds: active_backgrounds(&self.preview.surface),
            file_selection: self.background.file_input().selection().map(PathBuf::from),
            button_label: self.export.label().to_string(),
            button_enabled: self.export.state() != ButtonState::Busy,
        }
    }
}
