//! Edge-strip pixel sampling and adaptive gradient synthesis.

use charcard_canvas2d::{Canvas2dContext, Canvas2dResult, CanvasColor, CanvasGradient, ImageData};

use crate::config::SamplerConfig;

/// A single gradient stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: CanvasColor,
}

/// The two gradients derived from the portrait's right edge.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveColors {
    /// Fully opaque stops.
    pub solid: Vec<ColorStop>,
    /// The same colors at a fixed low alpha.
    pub translucent: Vec<ColorStop>,
}

impl AdaptiveColors {
    /// Top-to-bottom gradient over `height` built from the opaque stops.
    pub fn solid_gradient(&self, height: f32) -> CanvasGradient {
        vertical_gradient(&self.solid, height)
    }

    /// Top-to-bottom gradient over `height` built from the translucent stops.
    pub fn translucent_gradient(&self, height: f32) -> CanvasGradient {
        vertical_gradient(&self.translucent, height)
    }
}

fn vertical_gradient(stops: &[ColorStop], height: f32) -> CanvasGradient {
    let mut gradient = CanvasGradient::new_linear(0.0, 0.0, 0.0, height);
    for stop in stops {
        gradient.add_color_stop(stop.offset, stop.color);
    }
    gradient
}

/// Read the 1-pixel column `sample_inset` device pixels from the right edge.
///
/// Fails when the canvas is tainted; callers retry.
pub fn sample_edge_strip(
    canvas: &Canvas2dContext,
    config: &SamplerConfig,
) -> Canvas2dResult<ImageData> {
    let x = canvas.width().saturating_sub(config.sample_inset);
    canvas.get_image_data(x as i32, 0, 1, canvas.height())
}

/// Derive opaque and translucent gradients from a sampled strip.
///
/// `gradient_steps + 1` stops are placed at `i / steps`, each taking the pixel
/// at the proportional row of the strip.
pub fn synthesize(strip: &ImageData, config: &SamplerConfig) -> AdaptiveColors {
    let steps = config.gradient_steps.max(1);
    let last_row = strip.height.saturating_sub(1) as f32;

    let mut solid = Vec::with_capacity(steps + 1);
    let mut translucent = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let offset = i as f32 / steps as f32;
        let row = (offset * last_row).round() as u32;
        let color = strip.pixel(0, row).unwrap_or_default();
        solid.push(ColorStop {
            offset,
            color: color.with_alpha(0xff),
        });
        translucent.push(ColorStop {
            offset,
            color: color.with_alpha(config.translucent_alpha),
        });
    }

    log::debug!(
        "Synthesized adaptive colors: {:?}",
        solid.iter().map(|s| s.color.to_hex()).collect::<Vec<_>>()
    );
    AdaptiveColors { solid, translucent }
}
