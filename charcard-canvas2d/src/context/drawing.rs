//! Fill and paint helper operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::filter::apply_filter;
use crate::geometry::RectParams;
use crate::gradient::CanvasGradient;
use crate::style::FillStyle;
use tiny_skia::{BlendMode, Pixmap, Transform};

impl Canvas2dContext {
    /// Fill a rectangle with the current fill style, composite operation and filter.
    pub fn fill_rect(&mut self, params: &RectParams) {
        log::debug!(target: "canvas", "fillRect {} {} {} {}", params.x, params.y, params.width, params.height);
        let Some(rect) =
            tiny_skia::Rect::from_xywh(params.x, params.y, params.width, params.height)
        else {
            return;
        };
        let transform = self.state.transform;
        let Some(shader) = self.fill_shader() else {
            return;
        };

        self.render_layer(|target, blend_mode| {
            let paint = tiny_skia::Paint {
                shader,
                blend_mode,
                anti_alias: true,
                ..Default::default()
            };
            target.fill_rect(rect, &paint, transform, None);
        });
    }

    // --- Private paint helpers ---

    /// Run `draw` against the canvas, routing it through an offscreen layer
    /// when a non-identity filter is active.
    ///
    /// `draw` receives the pixmap to paint into and the blend mode to paint with.
    pub(crate) fn render_layer(&mut self, draw: impl FnOnce(&mut Pixmap, BlendMode)) {
        let blend_mode: BlendMode = self.state.global_composite_operation.into();
        let filter = self.state.filter;

        if filter.is_identity() {
            draw(&mut self.pixmap, blend_mode);
            return;
        }

        let Some(mut layer) = Pixmap::new(self.width, self.height) else {
            return;
        };
        draw(&mut layer, BlendMode::SourceOver);
        apply_filter(&mut layer, filter);

        let paint = tiny_skia::PixmapPaint {
            opacity: 1.0,
            blend_mode,
            quality: tiny_skia::FilterQuality::Nearest,
        };
        self.pixmap
            .draw_pixmap(0, 0, layer.as_ref(), &paint, Transform::identity(), None);
    }

    fn fill_shader(&self) -> Option<tiny_skia::Shader<'static>> {
        match &self.state.fill_style {
            FillStyle::Color(color) => Some(tiny_skia::Shader::SolidColor(*color)),
            FillStyle::LinearGradient(gradient) => self.create_gradient_shader(gradient),
        }
    }

    fn create_gradient_shader(
        &self,
        gradient: &CanvasGradient,
    ) -> Option<tiny_skia::Shader<'static>> {
        if gradient.stops.is_empty() {
            return None;
        }

        let stops: Vec<tiny_skia::GradientStop> = gradient
            .stops
            .iter()
            .map(|stop| tiny_skia::GradientStop::new(stop.offset, stop.color.into()))
            .collect();

        tiny_skia::LinearGradient::new(
            tiny_skia::Point {
                x: gradient.x0,
                y: gradient.y0,
            },
            tiny_skia::Point {
                x: gradient.x1,
                y: gradient.y1,
            },
            stops,
            tiny_skia::SpreadMode::Pad,
            self.state.transform,
        )
    }
}
