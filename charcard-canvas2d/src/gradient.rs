//! Gradient types for Canvas 2D operations.

use crate::geometry::CanvasColor;

/// A color stop in a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Offset position (0.0 to 1.0).
    pub offset: f32,
    /// Color at this stop.
    pub color: CanvasColor,
}

/// Linear canvas gradient from (x0, y0) to (x1, y1) in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasGradient {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// Color stops, kept sorted by offset.
    pub stops: Vec<GradientStop>,
}

impl CanvasGradient {
    /// Create a new linear gradient.
    pub fn new_linear(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            stops: Vec::new(),
        }
    }

    /// Add a color stop to the gradient. Offsets are clamped to 0.0..=1.0.
    pub fn add_color_stop(&mut self, offset: f32, color: CanvasColor) {
        self.stops.push(GradientStop {
            offset: offset.clamp(0.0, 1.0),
            color,
        });
        // Stable sort keeps insertion order for equal offsets
        self.stops.sort_by(|a, b| {
            a.offset
                .partial_cmp(&b.offset)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}
