//! Canvas 2D rendering context implementation.

mod drawing;
mod image_ops;
mod transform;

use crate::drawing_state::DrawingState;
use crate::error::{Canvas2dError, Canvas2dResult};
use crate::geometry::CanvasColor;
use crate::gradient::CanvasGradient;
use crate::style::{CanvasFilter, CompositeOperation, FillStyle};
use tiny_skia::Pixmap;

/// Maximum canvas dimension (same as Chrome).
const MAX_DIMENSION: u32 = 32767;

/// Canvas 2D rendering context.
pub struct Canvas2dContext {
    /// Width of the canvas in pixels.
    pub(crate) width: u32,
    /// Height of the canvas in pixels.
    pub(crate) height: u32,
    /// Pixel buffer.
    pub(crate) pixmap: Pixmap,
    /// Current drawing state.
    pub(crate) state: DrawingState,
    /// False once non-CORS-clean pixels have been drawn.
    pub(crate) origin_clean: bool,
}

impl Canvas2dContext {
    /// Create a new Canvas2dContext with the specified dimensions in device pixels.
    pub fn new(width: u32, height: u32) -> Canvas2dResult<Self> {
        // Validate dimensions
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Canvas2dError::InvalidDimensions { width, height });
        }

        let pixmap =
            Pixmap::new(width, height).ok_or(Canvas2dError::InvalidDimensions { width, height })?;

        Ok(Self {
            width,
            height,
            pixmap,
            state: DrawingState::default(),
            origin_clean: true,
        })
    }

    /// Get canvas width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get canvas height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether pixels may still be read back from this canvas.
    pub fn is_origin_clean(&self) -> bool {
        self.origin_clean
    }

    /// Reset the rendering context to its default state.
    ///
    /// This clears the canvas to transparent, resets all drawing state
    /// and makes the canvas origin-clean again.
    pub fn reset(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        self.state = DrawingState::default();
        self.origin_clean = true;
    }

    // --- Style setters ---

    /// Set the fill style from a CanvasColor.
    pub fn set_fill_style_color(&mut self, color: CanvasColor) {
        self.state.fill_style = FillStyle::Color(color.into());
    }

    /// Set the fill style to a gradient.
    pub fn set_fill_style_gradient(&mut self, gradient: CanvasGradient) {
        self.state.fill_style = FillStyle::LinearGradient(gradient);
    }

    /// Create a linear gradient.
    pub fn create_linear_gradient(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> CanvasGradient {
        CanvasGradient::new_linear(x0, y0, x1, y1)
    }

    /// Set the global composite operation.
    pub fn set_composite_operation(&mut self, op: CompositeOperation) {
        self.state.global_composite_operation = op;
    }

    /// Set the filter.
    pub fn set_canvas_filter(&mut self, filter: CanvasFilter) {
        self.state.filter = filter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RectParams;

    #[test]
    fn test_new_context_defaults() {
        let ctx = Canvas2dContext::new(200, 150).unwrap();
        assert_eq!(ctx.width(), 200);
        assert_eq!(ctx.height(), 150);
        assert_eq!(
            ctx.state.global_composite_operation,
            CompositeOperation::SourceOver
        );
        assert_eq!(ctx.state.filter, CanvasFilter::None);
        assert!(ctx.is_origin_clean());
        // Canvas should be fully transparent
        assert!(ctx.pixmap.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Canvas2dContext::new(0, 10),
            Err(Canvas2dError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(Canvas2dContext::new(10, MAX_DIMENSION + 1).is_err());
    }

    #[test]
    fn test_reset() {
        let mut ctx = Canvas2dContext::new(20, 20).unwrap();
        ctx.set_fill_style_color(CanvasColor::from_rgba8(0, 255, 0, 255));
        ctx.set_composite_operation(CompositeOperation::Color);
        ctx.set_canvas_filter(CanvasFilter::Contrast(1.5));
        ctx.scale(2.0, 2.0);
        ctx.fill_rect(&RectParams::from_size(20.0, 20.0));
        ctx.origin_clean = false;

        ctx.reset();
        assert!(ctx.pixmap.data().iter().all(|&b| b == 0));
        assert!(ctx.is_origin_clean());
        assert_eq!(
            ctx.state.global_composite_operation,
            CompositeOperation::SourceOver
        );
        assert_eq!(ctx.state.filter, CanvasFilter::None);
        assert!(ctx.state.transform.is_identity());
    }
}
