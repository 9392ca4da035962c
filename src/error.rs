//! Error types for the page shell

use thiserror::Error;

/// Result type alias for shell operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while routing, loading images or exporting
#[derive(Error, Debug)]
pub enum Error {
    /// Image fetch failed (transport error or non-success status)
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be turned into a data URL or decoded image
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Capturing a DOM subtree failed (tainted canvas, unsupported node, ...)
    #[error("Rasterization failed: {0}")]
    Rasterization(String),

    /// The platform cannot trigger a download nor open a new context
    #[error("Download not supported: {0}")]
    DownloadUnsupported(String),

    /// Failed to render a screen
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filesystem error (headless downloads, config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Decode(err.to_string())
    }
}
