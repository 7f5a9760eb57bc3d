//! Error types for the card compositing engine.

use charcard_canvas2d::Canvas2dError;
use thiserror::Error;

/// Errors raised while loading, painting, exporting or uploading a card.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("canvas error: {0}")]
    Canvas(#[from] Canvas2dError),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("unsupported image source: {0}")]
    UnsupportedSource(String),

    #[error("{0} image is not loaded yet")]
    ImageNotReady(&'static str),

    #[error("svg error: {0}")]
    Svg(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{what} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        what: String,
        attempts: usize,
        last_error: String,
    },

    #[error("upload failed: {0}")]
    Upload(String),
}

impl CardError {
    /// Whether another attempt of the same operation may succeed.
    ///
    /// Resource and paint failures are transient. Configuration mistakes,
    /// unsupported sources and terminal outcomes are not.
    pub fn is_transient(&self) -> bool {
        match self {
            CardError::Canvas(err) => matches!(
                err,
                Canvas2dError::SecurityError | Canvas2dError::IndexSizeError { .. }
            ),
            CardError::Image(_)
            | CardError::Http(_)
            | CardError::HttpStatus { .. }
            | CardError::Io(_)
            | CardError::InvalidDataUri(_)
            | CardError::ImageNotReady(_) => true,
            CardError::Json(_)
            | CardError::UnsupportedSource(_)
            | CardError::Svg(_)
            | CardError::InvalidConfig(_)
            | CardError::RetriesExhausted { .. }
            | CardError::Upload(_) => false,
        }
    }
}

/// Result type for card operations.
pub type CardResult<T> = Result<T, CardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CardError::ImageNotReady("portrait").is_transient());
        assert!(CardError::Canvas(Canvas2dError::SecurityError).is_transient());
        assert!(!CardError::Canvas(Canvas2dError::PngError("x".into())).is_transient());
        assert!(!CardError::UnsupportedSource("ftp://x".into()).is_transient());
        assert!(!CardError::Upload("boom".into()).is_transient());
    }

    #[test]
    fn test_retries_exhausted_message() {
        let err = CardError::RetriesExhausted {
            what: "pixel sample".to_string(),
            attempts: 6,
            last_error: "not ready".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pixel sample failed after 6 attempts: not ready"
        );
    }
}
