//! Error types for the status composer

use thiserror::Error;

/// Result type alias for composer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while composing or exporting a status image
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to rasterize the preview surface
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// An uploaded or referenced image could not be decoded
    #[error("Image decoding failed: {0}")]
    ImageError(String),

    /// Font database could not be loaded
    #[error("Font loading failed: {0}")]
    FontError(String),

    /// A non-data image source was refused because cross-origin loading is off
    #[error("Cross-origin image refused: {0}")]
    CrossOrigin(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Filesystem error (upload reads, download writes)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session event loop is gone
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let e = Error::RenderError("pixmap too large".into());
        assert_eq!(e.to_string(), "Rendering failed: pixmap too large");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let e: Error = io.into();
        assert!(e.to_string().contains("missing.png"));
    }
}
