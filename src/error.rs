//! Error types for signature rendering.

use thiserror::Error;

/// Errors that abort a whole render.
///
/// Acquisition failures never show up here: a missing image only removes
/// that visual from the scene (see [`crate::ImageAcquirer::resolve`]).
#[derive(Debug, Error)]
pub enum RenderError {
    /// The QR encoder rejected the value (usually: too long for any version).
    #[error("QR encoding failed: {0}")]
    QrEncode(#[from] qrcode::types::QrError),

    /// The serialized scene could not be parsed by the rasterizer.
    #[error("scene parse failed: {0}")]
    Scene(#[from] resvg::usvg::Error),

    /// The output pixmap could not be allocated.
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    /// PNG encoding of the finished bitmap failed.
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// The HTTP client used for image acquisition could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The element list or configuration was not valid JSON.
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T, E = RenderError> = std::result::Result<T, E>;
