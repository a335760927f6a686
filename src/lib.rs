//! statusmaker
//!
//! Compose a WhatsApp-style status image: a caption with a font, size,
//! color, alignment and one text effect over a flat color, gradient or
//! uploaded image, exported as a timestamped PNG.
//!
//! # Features
//!
//! - **Live preview**: every control change re-renders the preview styles
//! - **Exclusive backgrounds**: color, gradient and image never stack
//! - **Native export**: the preview is rasterized with tiny-skia, no browser
//!
//! # Example
//!
//! ```no_run
//! use statusmaker::{ComposerConfig, Session, TextEffect};
//!
//! # async fn run() -> statusmaker::Result<()> {
//! let session = Session::new(ComposerConfig::default()).await?;
//! session.set_text("Good morning").await?;
//! session.select_effect(TextEffect::Shadow).await?;
//! session.apply_preset(3).await?;
//! if let Some(download) = session.download().await? {
//!     println!("saved {}", download.path.display());
//! }
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod error;
pub use error::{Error, Result};

pub mod background;
pub mod composer;
pub mod export;
pub mod preview;
pub mod rendering;
pub mod session;
pub mod style;
pub mod upload;

pub use background::{BackgroundKind, BackgroundMode};
pub use composer::{ComposerState, StatusComposer};
pub use export::Download;
pub use preview::{Controls, PreviewSurface, TextAlign, TextEffect};
pub use rendering::raster::SkiaRasterizer;
pub use rendering::Screenshot;
pub use session::{ComposerEvent, EventOutcome, Session, UploadOutcome};

/// Preview surface dimensions in CSS px
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 360,
            height: 640,
        }
    }
}

/// Options handed to the rasterizer on every export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    /// Device pixels per CSS pixel
    pub scale: f32,
    /// Allow image sources other than `data:` URLs
    pub cross_origin_images: bool,
    /// Leave uncovered pixels transparent instead of white
    pub transparent_background: bool,
    /// Log every paint command at debug level
    pub logging: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            cross_origin_images: true,
            transparent_background: true,
            logging: false,
        }
    }
}

/// Configuration for a composer session
///
/// The defaults match the stock page: a 360 x 640 preview with 24 px padding,
/// exported at 2x, and the usual initial control values.
///
/// # Examples
///
/// ```
/// let cfg = statusmaker::ComposerConfig::default();
/// assert_eq!(cfg.raster.scale, 2.0);
/// assert_eq!(cfg.controls.font_size, 24);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub viewport: Viewport,
    /// Padding around the caption block (CSS px)
    pub padding: f32,
    pub raster: RasterOptions,
    /// Where exported PNGs are written
    pub download_dir: PathBuf,
    /// Font directories searched in addition to the system fonts
    pub font_dirs: Vec<PathBuf>,
    /// How long the error label stays on the export trigger (ms)
    pub error_label_ms: u64,
    /// Label of the idle export trigger
    pub idle_label: String,
    /// Initial control values
    pub controls: Controls,
    /// Seed for the random gradient generator; entropy when unset
    pub seed: Option<u64>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            padding: 24.0,
            raster: RasterOptions::default(),
            download_dir: PathBuf::from("."),
            font_dirs: Vec::new(),
            error_label_ms: export::ERROR_LABEL_MS,
            idle_label: export::DEFAULT_LABEL.to_string(),
            controls: Controls::default(),
            seed: None,
        }
    }
}

impl ComposerConfig {
    /// Load from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}

/// Turns the preview surface into PNG bytes.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, surface: &PreviewSurface, options: &RasterOptions) -> Result<Screenshot>;
}

/// Create the default rasterizer. Loads system fonts, so call it off the
/// async threads.
pub fn new_rasterizer(config: &ComposerConfig) -> Result<SkiaRasterizer> {
    let fonts = rendering::fonts::FontBook::system(&config.font_dirs)?;
    Ok(SkiaRasterizer::new(std::sync::Arc::new(fonts)))
}
