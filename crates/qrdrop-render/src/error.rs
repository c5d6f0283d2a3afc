/// Errors from rendering a code image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The data cannot be represented as a QR code at the requested level,
    /// usually because it exceeds the symbol's capacity.
    #[error("QR encoding failed: {0}")]
    EncodingFailed(String),

    /// The render options cannot produce an image.
    #[error("invalid render options: {0}")]
    InvalidOptions(String),

    /// The PNG encoder failed.
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

impl From<qrcode::types::QrError> for RenderError {
    fn from(err: qrcode::types::QrError) -> Self {
        Self::EncodingFailed(err.to_string())
    }
}

/// Result alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
