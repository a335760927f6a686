//! Image uploads: file -> data URL, as an abortable background task.

use crate::background::UploadTicket;
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::{AbortHandle, Abortable};
use std::future::Future;
use std::path::Path;

/// MIME type used when the file contents are not a known image format.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Build a `data:` URL for `bytes`, sniffing the MIME type from the contents.
pub fn encode_data_url(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or(UNKNOWN_MIME);
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode a base64 `data:` URL into its MIME type and payload.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::ImageError("not a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::ImageError("data URL has no payload".into()))?;
    let mime = meta.strip_suffix(";base64").ok_or_else(|| {
        Error::ImageError(format!("unsupported data URL encoding: {}", meta))
    })?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::ImageError(format!("invalid base64 payload: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

/// Read a file and return it as a data URL.
pub async fn read_as_data_url(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(encode_data_url(&bytes))
}

/// A file read in flight. Dropping the handle does not cancel it; `abort` does.
#[derive(Debug)]
pub struct UploadTask {
    generation: u64,
    abort: AbortHandle,
}

impl UploadTask {
    /// Spawn the read for `ticket` and hand its result to `on_done`.
    ///
    /// `on_done` never runs if the task is aborted first.
    pub fn spawn<F, Fut>(ticket: UploadTicket, on_done: F) -> Self
    where
        F: FnOnce(UploadTicket, Result<String>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (abort, registration) = AbortHandle::new_pair();
        let generation = ticket.generation;
        let work = async move {
            let result = read_as_data_url(&ticket.path).await;
            on_done(ticket, result).await;
        };
        tokio::spawn(Abortable::new(work, registration));
        Self { generation, abort }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn abort(&self) {
        log::debug!("Aborting image read #{}", self.generation);
        self.abort.abort();
    }
}
