//! Export renderer: trigger state, filenames, and writing the download.

use crate::rendering::Screenshot;
use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Label of the idle trigger.
pub const DEFAULT_LABEL: &str = "Download Status";
/// Label while an export is in flight.
pub const BUSY_LABEL: &str = "Creating...";
/// Label after a failed export, until the revert timer fires.
pub const ERROR_LABEL: &str = "Try Again";
/// How long the error label stays up (ms).
pub const ERROR_LABEL_MS: u64 = 2000;

pub const PNG_MIME: &str = "image/png";
pub const FILENAME_PREFIX: &str = "whatsapp-status-";

/// `whatsapp-status-<ISO-8601 with ':' and '.' replaced by '-'>.png`
pub fn export_filename(at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}{}.png", FILENAME_PREFIX, stamp)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonState {
    Idle,
    Busy,
    Error,
}

/// Identifies one export attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExportTicket(u64);

/// Identifies the error label of one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevertToken(u64);

/// The download trigger: label plus enabled flag.
#[derive(Debug, Clone)]
pub struct ExportButton {
    idle_label: String,
    state: ButtonState,
    attempt: u64,
}

impl Default for ExportButton {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL)
    }
}

impl ExportButton {
    pub fn new(idle_label: impl Into<String>) -> Self {
        Self {
            idle_label: idle_label.into(),
            state: ButtonState::Idle,
            attempt: 0,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn label(&self) -> &str {
        match self.state {
            ButtonState::Idle => &self.idle_label,
            ButtonState::Busy => BUSY_LABEL,
            ButtonState::Error => ERROR_LABEL,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state != ButtonState::Busy
    }

    /// Click. Returns `None` while disabled: clicks during an export are inert.
    pub fn begin(&mut self) -> Option<ExportTicket> {
        if !self.is_enabled() {
            return None;
        }
        self.attempt += 1;
        self.state = ButtonState::Busy;
        Some(ExportTicket(self.attempt))
    }

    fn is_current(&self, ticket: ExportTicket) -> bool {
        self.state == ButtonState::Busy && self.attempt == ticket.0
    }

    /// Restore the idle label after a successful export.
    pub fn succeed(&mut self, ticket: ExportTicket) {
        if self.is_current(ticket) {
            self.state = ButtonState::Idle;
        }
    }

    /// Show the error label, re-enabled at once. The returned token reverts it.
    pub fn fail(&mut self, ticket: ExportTicket) -> Option<RevertToken> {
        if !self.is_current(ticket) {
            return None;
        }
        self.state = ButtonState::Error;
        Some(RevertToken(ticket.0))
    }

    /// Put the idle label back, unless another click happened since the failure.
    pub fn revert(&mut self, token: RevertToken) -> bool {
        if self.state == ButtonState::Error && self.attempt == token.0 {
            self.state = ButtonState::Idle;
            return true;
        }
        false
    }
}

/// A file written to the download directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub filename: String,
    pub path: PathBuf,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub size: usize,
    pub sha256: String,
}

/// Write the screenshot under its timestamped name into `dir`.
pub fn save_download(dir: &Path, shot: &Screenshot, at: DateTime<Utc>) -> Result<Download> {
    let filename = export_filename(at);
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&filename);
    std::fs::write(&path, &shot.png_data)?;
    Ok(Download {
        filename,
        path,
        mime: PNG_MIME.to_string(),
        width: shot.width,
        height: shot.height,
        size: shot.png_data.len(),
        sha256: shot.digest(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filename_replaces_colons_and_dots() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(
            export_filename(at),
            "whatsapp-status-2024-01-15T10-30-45-123Z.png"
        );
    }

    #[test]
    fn filename_keeps_zero_millis() {
        let at = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            export_filename(at),
            "whatsapp-status-2023-12-31T23-59-59-000Z.png"
        );
    }

    #[test]
    fn busy_button_ignores_clicks() {
        let mut b = ExportButton::default();
        let t = b.begin().expect("idle button accepts a click");
        assert_eq!(b.label(), BUSY_LABEL);
        assert!(!b.is_enabled());
        assert!(b.begin().is_none());

        b.succeed(t);
        assert_eq!(b.label(), DEFAULT_LABEL);
        assert!(b.is_enabled());
    }

    #[test]
    fn failure_shows_error_then_reverts() {
        let mut b = ExportButton::new("Save");
        let t = b.begin().unwrap();
        let token = b.fail(t).unwrap();
        assert_eq!(b.label(), ERROR_LABEL);
        assert!(b.is_enabled());
        assert!(b.revert(token));
        assert_eq!(b.label(), "Save");
    }

    #[test]
    fn stale_revert_does_not_touch_a_new_export() {
        let mut b = ExportButton::default();
        let first = b.begin().unwrap();
        let token = b.fail(first).unwrap();

        let second = b.begin().unwrap();
        assert!(!b.revert(token));
        assert_eq!(b.state(), ButtonState::Busy);

        // a late result for the first attempt changes nothing either
        b.succeed(first);
        assert_eq!(b.state(), ButtonState::Busy);
        b.succeed(second);
        assert_eq!(b.state(), ButtonState::Idle);
    }

    #[test]
    fn save_writes_png_bytes() {
        let dir = std::env::temp_dir().join(format!("statusmaker-export-{}", std::process::id()));
        let shot = Screenshot {
            width: 2,
            height: 1,
            png_data: b"\x89PNG\r\n\x1a\nfake".to_vec(),
        };
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap();
        let d = save_download(&dir, &shot, at).unwrap();
        assert_eq!(d.mime, PNG_MIME);
        assert_eq!(d.size, shot.png_data.len());
        assert_eq!(std::fs::read(&d.path).unwrap(), shot.png_data);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
