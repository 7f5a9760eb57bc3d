//! Error types for charcard-canvas2d.

use thiserror::Error;

/// Result type alias using Canvas2dError.
pub type Canvas2dResult<T> = Result<T, Canvas2dError>;

/// Errors that can occur in Canvas 2D operations.
#[derive(Debug, Error)]
pub enum Canvas2dError {
    /// Invalid canvas dimensions (must be positive and within limits).
    #[error("Invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel read-back from a canvas that has drawn non-CORS-clean content.
    #[error("Canvas is tainted by cross-origin data; pixel read-back is not allowed")]
    SecurityError,

    /// Pixel read-back requested with a zero-sized region.
    #[error("Index or size is negative or greater than the allowed amount: {width}x{height}")]
    IndexSizeError { width: u32, height: u32 },

    /// RGBA buffer length does not match the given dimensions.
    #[error("Pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    BufferSizeMismatch { len: usize, width: u32, height: u32 },

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    PngError(String),
}

impl From<png::EncodingError> for Canvas2dError {
    fn from(err: png::EncodingError) -> Self {
        Canvas2dError::PngError(err.to_string())
    }
}
