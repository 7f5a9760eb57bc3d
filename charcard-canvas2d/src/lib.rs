//! Pure Rust Canvas 2D raster context using tiny-skia.
//!
//! This crate implements the subset of the Canvas 2D API that the character
//! card compositor paints with:
//! - rectangle fills with solid colors or linear gradients
//! - scaled image drawing from decoded bitmaps or other canvases
//! - every `globalCompositeOperation` (Porter-Duff and blend modes)
//! - the `filter` property, limited to `none` and `contrast(..)`
//! - `getImageData` with origin-clean (taint) tracking
//! - PNG encoding
//!
//! # Example
//!
//! ```rust,ignore
//! use charcard_canvas2d::{Canvas2dContext, CanvasColor, RectParams};
//!
//! let mut ctx = Canvas2dContext::new(400, 300)?;
//! ctx.set_fill_style_color(CanvasColor::from_rgba8(255, 0, 0, 255));
//! ctx.fill_rect(&RectParams { x: 10.0, y: 10.0, width: 100.0, height: 50.0 });
//! let png_data = ctx.to_png(None)?;
//! ```

mod context;
mod drawing_state;
mod error;
mod filter;
mod geometry;
mod gradient;
mod image;
mod style;

// Re-export public API
pub use context::Canvas2dContext;
pub use error::{Canvas2dError, Canvas2dResult};
pub use geometry::{CanvasColor, ImageData, RectParams};
pub use gradient::{CanvasGradient, GradientStop};
pub use image::ImageBitmap;
pub use style::{CanvasFilter, CompositeOperation};
