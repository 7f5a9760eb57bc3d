//! Decoded bitmaps that can be drawn onto a canvas.

use crate::error::{Canvas2dError, Canvas2dResult};
use std::sync::Arc;
use tiny_skia::{IntSize, Pixmap};

/// A decoded, premultiplied image ready to be drawn.
///
/// Cloning is cheap; the pixel buffer is shared.
#[derive(Debug, Clone)]
pub struct ImageBitmap {
    pixmap: Arc<Pixmap>,
    origin_clean: bool,
}

impl ImageBitmap {
    /// Build a bitmap from straight-alpha RGBA8 pixels.
    ///
    /// `origin_clean` marks the pixels as CORS-approved; drawing a bitmap
    /// that is not origin-clean taints the destination canvas.
    pub fn from_rgba8(
        width: u32,
        height: u32,
        mut rgba: Vec<u8>,
        origin_clean: bool,
    ) -> Canvas2dResult<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(Canvas2dError::BufferSizeMismatch {
                len: rgba.len(),
                width,
                height,
            });
        }

        // Premultiply in place using integer math with rounding
        for px in rgba.chunks_exact_mut(4) {
            let a = px[3] as u16;
            if a == 255 {
                continue;
            }
            for channel in &mut px[..3] {
                *channel = ((*channel as u16 * a + 127) / 255) as u8;
            }
        }

        let size = IntSize::from_wh(width, height)
            .ok_or(Canvas2dError::InvalidDimensions { width, height })?;
        let pixmap = Pixmap::from_vec(rgba, size)
            .ok_or(Canvas2dError::InvalidDimensions { width, height })?;
        Ok(Self {
            pixmap: Arc::new(pixmap),
            origin_clean,
        })
    }

    /// Wrap an already premultiplied pixmap, such as one rasterized by resvg.
    pub fn from_pixmap(pixmap: Pixmap, origin_clean: bool) -> Self {
        Self {
            pixmap: Arc::new(pixmap),
            origin_clean,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Whether this bitmap may be read back after drawing.
    pub fn is_origin_clean(&self) -> bool {
        self.origin_clean
    }

    pub(crate) fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}
