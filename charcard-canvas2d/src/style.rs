//! Style types and enums for Canvas 2D operations.

use crate::gradient::CanvasGradient;

/// Fill style for Canvas 2D operations.
#[derive(Debug, Clone)]
pub enum FillStyle {
    /// Solid color fill.
    Color(tiny_skia::Color),
    /// Linear gradient fill.
    LinearGradient(CanvasGradient),
}

impl Default for FillStyle {
    fn default() -> Self {
        // Default is opaque black
        FillStyle::Color(tiny_skia::Color::BLACK)
    }
}

/// Value of `globalCompositeOperation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositeOperation {
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    SourceAtop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl From<CompositeOperation> for tiny_skia::BlendMode {
    fn from(op: CompositeOperation) -> Self {
        match op {
            CompositeOperation::SourceOver => tiny_skia::BlendMode::SourceOver,
            CompositeOperation::SourceIn => tiny_skia::BlendMode::SourceIn,
            CompositeOperation::SourceOut => tiny_skia::BlendMode::SourceOut,
            CompositeOperation::SourceAtop => tiny_skia::BlendMode::SourceAtop,
            CompositeOperation::DestinationOver => tiny_skia::BlendMode::DestinationOver,
            CompositeOperation::DestinationIn => tiny_skia::BlendMode::DestinationIn,
            CompositeOperation::DestinationOut => tiny_skia::BlendMode::DestinationOut,
            CompositeOperation::DestinationAtop => tiny_skia::BlendMode::DestinationAtop,
            CompositeOperation::Lighter => tiny_skia::BlendMode::Plus,
            CompositeOperation::Copy => tiny_skia::BlendMode::Source,
            CompositeOperation::Xor => tiny_skia::BlendMode::Xor,
            CompositeOperation::Multiply => tiny_skia::BlendMode::Multiply,
            CompositeOperation::Screen => tiny_skia::BlendMode::Screen,
            CompositeOperation::Overlay => tiny_skia::BlendMode::Overlay,
            CompositeOperation::Darken => tiny_skia::BlendMode::Darken,
            CompositeOperation::Lighten => tiny_skia::BlendMode::Lighten,
            CompositeOperation::ColorDodge => tiny_skia::BlendMode::ColorDodge,
            CompositeOperation::ColorBurn => tiny_skia::BlendMode::ColorBurn,
            CompositeOperation::HardLight => tiny_skia::BlendMode::HardLight,
            CompositeOperation::SoftLight => tiny_skia::BlendMode::SoftLight,
            CompositeOperation::Difference => tiny_skia::BlendMode::Difference,
            CompositeOperation::Exclusion => tiny_skia::BlendMode::Exclusion,
            CompositeOperation::Hue => tiny_skia::BlendMode::Hue,
            CompositeOperation::Saturation => tiny_skia::BlendMode::Saturation,
            CompositeOperation::Color => tiny_skia::BlendMode::Color,
            CompositeOperation::Luminosity => tiny_skia::BlendMode::Luminosity,
        }
    }
}

/// Value of the `filter` property.
///
/// Only the contrast function is supported; `contrast(100%)` is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CanvasFilter {
    #[default]
    None,
    /// Contrast multiplier (1.0 = unchanged).
    Contrast(f32),
}

impl CanvasFilter {
    /// Whether applying this filter would leave pixels unchanged.
    pub fn is_identity(&self) -> bool {
        match self {
            CanvasFilter::None => true,
            CanvasFilter::Contrast(amount) => (*amount - 1.0).abs() < f32::EPSILON,
        }
    }
}
