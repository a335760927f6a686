//! Rendering: composite the preview surface into a PNG.
//!
//! The pipeline mirrors what a DOM-to-canvas library does with a live node:
//! read the inline styles (`computed`), lay the caption out with real font
//! metrics (`fonts`, `layout`), turn everything into a display list
//! (`paint`) and execute it with tiny-skia (`raster`).

pub mod computed;
pub mod fonts;
pub mod layout;
pub mod paint;
pub mod raster;

use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Screenshot {
    pub fn empty(width: u32, height: u32) -> Self {
        Self { width, height, png_data: Vec::new() }
    }

    /// Hex SHA-256 of the PNG bytes
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }

    pub fn is_png(&self) -> bool {
        self.png_data.starts_with(b"\x89PNG\r\n\x1a\n")
    }
}
